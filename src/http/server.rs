//! HTTP server setup.
//!
//! # Responsibilities
//! - Collect registrations: manual routes, route trees, handler groups
//! - Build the route table in a fixed order and turn it into an axum Router
//! - Wire up transport layers (tracing, timeout, request ID)
//! - Bind listeners and serve until shutdown
//!
//! # Design Decisions
//! - Manual routes first, then trees, then top-level groups
//! - Registration errors surface before any listener is bound
//! - One immutable Router shared by every listener

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::Method;
use axum::middleware::Next;
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;
use futures_util::future::try_join_all;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::validation::parse_verb;
use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::handler::{Endpoint, Handler};
use crate::http::dispatch::Dispatcher;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::response::{DefaultResponse, ResponseStrategy};
use crate::lifecycle::shutdown::{self, Shutdown};
use crate::lifecycle::signals;
use crate::observability::metrics;
use crate::routing::{
    compose, discover, join_path, Group, Middleware, Origin, RegistrationError, RouteEntry,
    RouteGroup, RouteNode, RouteTable,
};

/// Registers handlers and serves them over HTTP.
///
/// ```rust,ignore
/// let mut runner = ServerRunner::new(RunnerConfig::default()).with_group(Server::default());
/// runner.bind_router(Method::GET, "/GetAge", get_age)?;
/// runner.run(["127.0.0.1:8080"]).await?;
/// ```
pub struct ServerRunner {
    config: RunnerConfig,
    table: RouteTable,
    trees: Vec<RouteNode>,
    groups: Vec<GroupMount>,
    strategy: Arc<dyn ResponseStrategy>,
}

impl ServerRunner {
    /// Create a new runner with no routes.
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            table: RouteTable::new(),
            trees: Vec::new(),
            groups: Vec::new(),
            strategy: Arc::new(DefaultResponse),
        }
    }

    /// Add a group whose methods are discovered at the root.
    pub fn with_group<S: RouteGroup>(mut self, server: S) -> Self {
        self.add_group("/", server);
        self
    }

    /// Add route trees.
    pub fn with_routers(mut self, routers: impl IntoIterator<Item = RouteNode>) -> Self {
        self.add_routers(routers);
        self
    }

    /// Add a group whose methods are discovered under `prefix`.
    pub fn add_group<S: RouteGroup>(&mut self, prefix: &str, server: S) -> &mut Self {
        self.add_group_with_middleware(prefix, server, [])
    }

    /// Like [`add_group`](Self::add_group), running `middleware` in order
    /// in front of every discovered route.
    pub fn add_group_with_middleware<S: RouteGroup>(
        &mut self,
        prefix: &str,
        server: S,
        middleware: impl IntoIterator<Item = Middleware>,
    ) -> &mut Self {
        self.groups.push(GroupMount {
            prefix: prefix.to_string(),
            group: Group::new(server),
            middleware: middleware.into_iter().collect(),
        });
        self
    }

    pub fn add_router(&mut self, router: RouteNode) -> &mut Self {
        self.trees.push(router);
        self
    }

    pub fn add_routers(&mut self, routers: impl IntoIterator<Item = RouteNode>) -> &mut Self {
        self.trees.extend(routers);
        self
    }

    /// Register a standalone handler for `method` at `path`.
    ///
    /// The handler's shape is checked here; a bad shape, an unsupported
    /// method or a duplicate route is an error and leaves the table unchanged.
    pub fn bind_router<H, T>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
    ) -> Result<&mut Self, RegistrationError>
    where
        H: Handler<T>,
    {
        self.bind_router_with_middleware(method, path, handler, [])
    }

    /// Like [`bind_router`](Self::bind_router), running `middleware` in
    /// order in front of the handler.
    pub fn bind_router_with_middleware<H, T>(
        &mut self,
        method: Method,
        path: &str,
        handler: H,
        middleware: impl IntoIterator<Item = Middleware>,
    ) -> Result<&mut Self, RegistrationError>
    where
        H: Handler<T>,
    {
        method_filter(&method)?;
        let path = join_path("/", path)?;
        let handler = Endpoint::new(handler)
            .validate()
            .map_err(|source| RegistrationError::Shape {
                method: method.clone(),
                path: path.clone(),
                source,
            })?;
        self.table.insert(RouteEntry {
            method,
            path,
            handler,
            origin: Origin::Manual,
            middleware: middleware.into_iter().collect(),
        })?;
        Ok(self)
    }

    /// Replace the default response envelope.
    pub fn custom_response<R: ResponseStrategy>(&mut self, strategy: R) -> &mut Self {
        self.strategy = Arc::new(strategy);
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Resolve every registration into the final route table.
    pub fn into_table(mut self) -> Result<RouteTable, RunnerError> {
        self.resolve()
    }

    fn resolve(&mut self) -> Result<RouteTable, RunnerError> {
        let verb = parse_verb(&self.config.discovery.verb)
            .ok_or_else(|| RunnerError::InvalidVerb(self.config.discovery.verb.clone()))?;
        let mut table = std::mem::take(&mut self.table);

        compose(&self.trees, &verb, &mut table)?;
        for mount in &self.groups {
            let added = discover(&mount.group, &mount.prefix, &verb, &mount.middleware, &mut table)?;
            tracing::info!(
                group = mount.group.type_name(),
                prefix = %mount.prefix,
                routes = added.len(),
                "Group discovered"
            );
        }

        metrics::record_routes(Origin::Manual.as_str(), table.count(Origin::Manual));
        metrics::record_routes(Origin::Discovered.as_str(), table.count(Origin::Discovered));
        Ok(table)
    }

    /// Build the axum Router.
    #[allow(deprecated)]
    pub fn build(mut self) -> Result<Router, RunnerError> {
        let table = self.resolve()?;
        let body_limit = self.config.limits.max_body_bytes;

        let mut router = Router::new();
        for entry in table.into_entries() {
            let path = entry.path.clone();
            router = router.route(&path, method_router(entry, self.strategy.clone(), body_limit)?);
        }

        Ok(router.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    self.config.timeouts.request_secs,
                ))),
        ))
    }

    /// Serve on `listeners` until `shutdown` triggers.
    pub async fn serve(self, listeners: Vec<TcpListener>, shutdown: Shutdown) -> Result<(), RunnerError> {
        let app = self.build()?;
        serve_router(app, listeners, shutdown).await
    }

    /// Bind `addrs` (or the configured addresses when empty) and serve
    /// until SIGINT/SIGTERM.
    pub async fn run<I, A>(self, addrs: I) -> Result<(), RunnerError>
    where
        I: IntoIterator<Item = A>,
        A: AsRef<str>,
    {
        let mut addrs: Vec<String> = addrs.into_iter().map(|a| a.as_ref().to_string()).collect();
        if addrs.is_empty() {
            addrs = self.config.listener.bind_addresses.clone();
        }
        let app = self.build()?;

        let mut listeners = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let listener = TcpListener::bind(&addr)
                .await
                .map_err(|source| RunnerError::Bind {
                    addr: addr.clone(),
                    source,
                })?;
            listeners.push(listener);
        }

        let shutdown = Shutdown::new();
        signals::spawn_signal_handler(shutdown.clone());
        serve_router(app, listeners, shutdown).await
    }
}

struct GroupMount {
    prefix: String,
    group: Group,
    middleware: Vec<Middleware>,
}

async fn serve_router(
    app: Router,
    listeners: Vec<TcpListener>,
    shutdown: Shutdown,
) -> Result<(), RunnerError> {
    if listeners.is_empty() {
        return Err(RunnerError::NoBindAddress);
    }

    let servers = listeners.into_iter().map(|listener| {
        let app = app.clone();
        let rx = shutdown.subscribe();
        async move {
            let addr = listener.local_addr()?;
            tracing::info!(address = %addr, "HTTP server starting");
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown::wait(rx))
                .await?;
            tracing::info!(address = %addr, "HTTP server stopped");
            Ok::<(), std::io::Error>(())
        }
    });

    try_join_all(servers).await?;
    Ok(())
}

fn method_filter(method: &Method) -> Result<MethodFilter, RegistrationError> {
    MethodFilter::try_from(method.clone())
        .map_err(|_| RegistrationError::UnsupportedMethod(method.clone()))
}

/// One route: the dispatcher wrapped in its middleware chain, first
/// middleware outermost.
fn method_router(
    entry: RouteEntry,
    strategy: Arc<dyn ResponseStrategy>,
    body_limit: usize,
) -> Result<MethodRouter, RegistrationError> {
    let filter = method_filter(&entry.method)?;
    let dispatcher = Dispatcher::new(entry.handler, entry.path.as_str(), strategy, body_limit);
    let mut route = on(filter, move |request: Request| dispatcher.clone().dispatch(request));

    for middleware in entry.middleware.into_iter().rev() {
        route = route.layer(axum::middleware::from_fn(
            move |request: Request, next: Next| middleware.run(request, next),
        ));
    }
    Ok(route)
}
