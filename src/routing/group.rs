//! Handler groups.
//!
//! A group is a shared server value whose async methods become routes.
//! The type lists its candidate methods once; auto-discovery decides
//! which of them are valid handlers.
//!
//! ```rust,ignore
//! impl RouteGroup for Server {
//!     fn routes(routes: &mut MethodSet<Self>) {
//!         routes
//!             .method("GetUser", Server::get_user)
//!             .method("GetAge", Server::get_age);
//!     }
//! }
//! ```

use std::sync::Arc;

use crate::handler::{HandlerKind, MethodHandler, Signature};

/// A type whose methods can be auto-registered as routes.
pub trait RouteGroup: Send + Sync + Sized + 'static {
    /// List candidate methods in registration order.
    fn routes(routes: &mut MethodSet<Self>);
}

/// Collects the candidate methods of a group.
pub struct MethodSet<S> {
    receiver: Arc<S>,
    methods: Vec<GroupMethod>,
}

impl<S: Send + Sync + 'static> MethodSet<S> {
    fn new(receiver: Arc<S>) -> Self {
        Self {
            receiver,
            methods: Vec::new(),
        }
    }

    /// Add a named method. Its shape is checked at discovery time.
    pub fn method<H, T>(&mut self, name: &str, handler: H) -> &mut Self
    where
        H: MethodHandler<S, T>,
    {
        self.methods.push(GroupMethod {
            name: name.to_string(),
            signature: H::signature(),
            kind: handler.bind_receiver(self.receiver.clone()),
        });
        self
    }
}

/// One candidate method, bound to its receiver.
#[derive(Clone, Debug)]
pub struct GroupMethod {
    pub name: String,
    pub signature: Signature,
    pub kind: HandlerKind,
}

/// A type-erased group, ready for discovery.
#[derive(Clone, Debug)]
pub struct Group {
    type_name: &'static str,
    methods: Vec<GroupMethod>,
}

impl Group {
    /// Create a new group from a server value.
    pub fn new<S: RouteGroup>(server: S) -> Self {
        Self::from_arc(Arc::new(server))
    }

    /// Create a new group sharing an existing server value.
    pub fn from_arc<S: RouteGroup>(server: Arc<S>) -> Self {
        let mut set = MethodSet::new(server);
        S::routes(&mut set);
        Self {
            type_name: std::any::type_name::<S>(),
            methods: set.methods,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn methods(&self) -> &[GroupMethod] {
        &self.methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Fault, InputKind, RequestContext};

    struct Server;

    impl Server {
        async fn ping(self: Arc<Self>, _ctx: RequestContext) -> Result<(), Fault> {
            Ok(())
        }
    }

    impl RouteGroup for Server {
        fn routes(routes: &mut MethodSet<Self>) {
            routes.method("Ping", Server::ping).method("PingAgain", Server::ping);
        }
    }

    #[test]
    fn test_group_lists_methods_in_order() {
        let group = Group::new(Server);
        let names: Vec<_> = group.methods().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Ping", "PingAgain"]);
        assert_eq!(
            group.methods()[0].signature.inputs,
            vec![InputKind::Receiver, InputKind::Context]
        );
        assert!(group.type_name().ends_with("Server"));
    }
}
