//! Auto-discovery of group methods.
//!
//! # Responsibilities
//! - Turn every valid method of a group into a route at `prefix/<Name>`
//! - Skip reserved lifecycle names and paths that are already taken
//! - Drop methods with an invalid shape without failing startup
//!
//! # Design Decisions
//! - Runs after manual registration so manual routes always win
//! - Reserved names compare case-insensitively, ignoring underscores

use axum::http::Method;

use crate::handler::{BoundHandler, RegistrationKind};
use crate::routing::group::Group;
use crate::routing::middleware::Middleware;
use crate::routing::path::join_path;
use crate::routing::table::{Origin, RouteEntry, RouteTable};
use crate::routing::RegistrationError;

/// Method names that belong to the runner itself and never become routes.
pub const RESERVED_METHODS: &[&str] = &[
    "Run",
    "Serve",
    "Build",
    "BindRouter",
    "AddRouter",
    "AddRouters",
    "WithRouters",
    "WithGroup",
    "AddGroup",
    "CustomResponse",
    "Shutdown",
];

/// True if `name` is reserved for the runner.
pub fn is_reserved(name: &str) -> bool {
    let name = fold(name);
    RESERVED_METHODS.iter().any(|r| fold(r) == name)
}

fn fold(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Register every valid method of `group` under `prefix` with `verb`.
///
/// Returns the paths that were added.
pub fn discover(
    group: &Group,
    prefix: &str,
    verb: &Method,
    middleware: &[Middleware],
    table: &mut RouteTable,
) -> Result<Vec<String>, RegistrationError> {
    let mut added = Vec::new();

    for method in group.methods() {
        if is_reserved(&method.name) {
            tracing::debug!(group = group.type_name(), name = %method.name, "Skipping reserved method");
            continue;
        }

        let path = join_path(prefix, &method.name)?;
        if table.contains_path(&path) {
            tracing::debug!(group = group.type_name(), path = %path, "Path already registered, skipping");
            continue;
        }

        let handler = match BoundHandler::new(
            &method.signature,
            RegistrationKind::Method,
            method.kind.clone(),
        ) {
            Ok(handler) => handler,
            Err(e) => {
                tracing::debug!(group = group.type_name(), name = %method.name, error = %e, "Method is not a handler, skipping");
                continue;
            }
        };

        let inserted = table.insert(RouteEntry {
            method: verb.clone(),
            path: path.clone(),
            handler,
            origin: Origin::Discovered,
            middleware: middleware.to_vec(),
        })?;
        if inserted {
            added.push(path);
        }
    }

    Ok(added)
}
