//! Route tree composition.
//!
//! # Responsibilities
//! - Describe routes as a tree of path segments, handlers and middleware
//! - Flatten the tree into route table entries
//! - Expand group handlers through auto-discovery at their node's path
//!
//! # Design Decisions
//! - Paths accumulate root → leaf; middleware chains concatenate the same way
//! - Ancestor middleware always runs before descendant middleware
//! - A standalone handler with an invalid shape fails the whole composition
//! - A node with a handler and children registers itself, then its children

use axum::http::Method;

use crate::handler::{Endpoint, Handler};
use crate::routing::discovery::discover;
use crate::routing::group::{Group, RouteGroup};
use crate::routing::middleware::Middleware;
use crate::routing::path::join_path;
use crate::routing::table::{Origin, RouteEntry, RouteTable};
use crate::routing::RegistrationError;

/// The handler attached to a tree node.
#[derive(Clone, Debug)]
pub enum NodeHandler {
    /// One route at the node's path.
    Single(Endpoint),
    /// All valid methods of a group, under the node's path.
    Group(Group),
}

/// One node of a route tree.
#[derive(Clone, Debug, Default)]
pub struct RouteNode {
    pub path: String,
    /// HTTP method for the node's handler. Falls back to the discovery verb.
    pub method: Option<Method>,
    pub handler: Option<NodeHandler>,
    pub middleware: Vec<Middleware>,
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    /// Create a new node at `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Attach a standalone handler.
    pub fn handler<H, T>(mut self, handler: H) -> Self
    where
        H: Handler<T>,
    {
        self.handler = Some(NodeHandler::Single(Endpoint::new(handler)));
        self
    }

    /// Attach a group whose methods are discovered under this node.
    pub fn group<S: RouteGroup>(mut self, server: S) -> Self {
        self.handler = Some(NodeHandler::Group(Group::new(server)));
        self
    }

    pub fn middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    pub fn child(mut self, child: RouteNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = RouteNode>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Flatten `roots` into `table`.
pub fn compose(
    roots: &[RouteNode],
    default_verb: &Method,
    table: &mut RouteTable,
) -> Result<(), RegistrationError> {
    for root in roots {
        expand(root, "", &[], default_verb, table)?;
    }
    Ok(())
}

fn expand(
    node: &RouteNode,
    prefix: &str,
    inherited: &[Middleware],
    default_verb: &Method,
    table: &mut RouteTable,
) -> Result<(), RegistrationError> {
    let path = join_path(prefix, &node.path)?;
    let mut chain = inherited.to_vec();
    chain.extend(node.middleware.iter().cloned());
    let method = node.method.clone().unwrap_or_else(|| default_verb.clone());

    match &node.handler {
        Some(NodeHandler::Single(endpoint)) => {
            let handler =
                endpoint
                    .clone()
                    .validate()
                    .map_err(|source| RegistrationError::Shape {
                        method: method.clone(),
                        path: path.clone(),
                        source,
                    })?;
            table.insert(RouteEntry {
                method,
                path: path.clone(),
                handler,
                origin: Origin::Manual,
                middleware: chain.clone(),
            })?;
        }
        Some(NodeHandler::Group(group)) => {
            let added = discover(group, &path, &method, &chain, table)?;
            tracing::debug!(prefix = %path, routes = added.len(), "Group expanded");
        }
        None => {}
    }

    for child in &node.children {
        expand(child, &path, &chain, default_verb, table)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::handler::{Fault, RequestContext, ShapeError};
    use crate::routing::group::MethodSet;

    async fn login(_ctx: RequestContext) -> Result<(), Fault> {
        Ok(())
    }

    async fn by_name(_ctx: RequestContext, _name: String) -> Result<(), Fault> {
        Ok(())
    }

    struct Users;

    impl Users {
        async fn list(self: Arc<Self>, _ctx: RequestContext) -> Result<(), Fault> {
            Ok(())
        }
    }

    impl RouteGroup for Users {
        fn routes(routes: &mut MethodSet<Self>) {
            routes.method("List", Users::list);
        }
    }

    fn named(name: &'static str) -> Middleware {
        Middleware::from_fn(name, |request, next: axum::middleware::Next| async move {
            next.run(request).await
        })
    }

    fn chain_names(table: &RouteTable, method: &Method, path: &str) -> Vec<String> {
        table
            .get(method, path)
            .unwrap()
            .middleware
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    #[test]
    fn test_paths_and_middleware_accumulate() {
        let tree = RouteNode::new("/api").middleware(named("A")).child(
            RouteNode::new("/v1").middleware(named("B")).child(
                RouteNode::new("/Login")
                    .method(Method::POST)
                    .middleware(named("C"))
                    .handler(login),
            ),
        );

        let mut table = RouteTable::new();
        compose(&[tree], &Method::POST, &mut table).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(chain_names(&table, &Method::POST, "/api/v1/Login"), ["A", "B", "C"]);
    }

    #[test]
    fn test_node_with_handler_and_children() {
        let tree = RouteNode::new("/api")
            .method(Method::GET)
            .handler(login)
            .child(RouteNode::new("users").method(Method::GET).group(Users));

        let mut table = RouteTable::new();
        compose(&[tree], &Method::POST, &mut table).unwrap();
        assert!(table.contains(&Method::GET, "/api"));
        assert_eq!(table.get(&Method::GET, "/api/users/List").unwrap().origin, Origin::Discovered);
    }

    #[test]
    fn test_default_verb_and_empty_nodes() {
        let tree = RouteNode::new("/")
            .child(RouteNode::new("/empty"))
            .child(RouteNode::new("/ping").handler(login));

        let mut table = RouteTable::new();
        compose(&[tree], &Method::PUT, &mut table).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.contains(&Method::PUT, "/ping"));
    }

    #[test]
    fn test_invalid_handler_is_fatal() {
        let tree = RouteNode::new("/api").child(RouteNode::new("/by").handler(by_name));
        let mut table = RouteTable::new();
        let err = compose(&[tree], &Method::POST, &mut table).unwrap_err();
        assert!(matches!(
            err,
            RegistrationError::Shape {
                source: ShapeError::PayloadNotAggregate { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_path_is_fatal() {
        let tree = RouteNode::new("/api").child(RouteNode::new("bad path").handler(login));
        let mut table = RouteTable::new();
        assert!(matches!(
            compose(&[tree], &Method::POST, &mut table),
            Err(RegistrationError::InvalidPath { .. })
        ));
    }
}
