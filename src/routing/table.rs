//! Route registration table.
//!
//! # Responsibilities
//! - Store every registered route with its validated handler
//! - Remember where each route came from (manual or discovered)
//! - Answer "is this path taken?" for auto-discovery
//!
//! # Design Decisions
//! - Identity is method + path; discovery checks the path alone
//! - Registering the same manual identity twice is an error
//! - Paths that differ only in capture names (`/user/{id}`, `/user/{name}`)
//!   conflict
//! - A manual route replaces discovered routes at its path, never the reverse
//! - Built once at startup, then consumed by the HTTP router

use std::collections::{HashMap, HashSet};

use axum::http::Method;

use crate::handler::BoundHandler;
use crate::routing::middleware::Middleware;
use crate::routing::RegistrationError;

/// How a route entered the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Manual,
    Discovered,
}

impl Origin {
    pub fn as_str(self) -> &'static str {
        match self {
            Origin::Manual => "manual",
            Origin::Discovered => "discovered",
        }
    }
}

/// One registered route.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub path: String,
    pub handler: BoundHandler,
    pub origin: Origin,
    /// Interceptors in execution order.
    pub middleware: Vec<Middleware>,
}

/// All routes of a server, keyed by method + path.
#[derive(Debug, Default)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
    paths: HashSet<String>,
    /// Capture-erased pattern → first path registered with it.
    patterns: HashMap<String, String>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry.
    ///
    /// Returns `Ok(false)` when a discovered entry was skipped because its
    /// path is already taken.
    pub fn insert(&mut self, entry: RouteEntry) -> Result<bool, RegistrationError> {
        if entry.origin == Origin::Discovered && self.contains_path(&entry.path) {
            tracing::debug!(method = %entry.method, path = %entry.path, "Path taken, skipping discovered route");
            return Ok(false);
        }

        let pattern = erase_captures(&entry.path);
        if let Some(existing) = self.patterns.get(&pattern) {
            if *existing != entry.path {
                return Err(RegistrationError::Conflict {
                    path: entry.path,
                    existing: existing.clone(),
                });
            }
        }

        match entry.origin {
            Origin::Discovered => {}
            Origin::Manual => {
                if self.contains(&entry.method, &entry.path) && !self.is_discovered(&entry.path) {
                    return Err(RegistrationError::Duplicate {
                        method: entry.method,
                        path: entry.path,
                    });
                }
                let before = self.entries.len();
                self.entries
                    .retain(|e| !(e.origin == Origin::Discovered && e.path == entry.path));
                if self.entries.len() != before {
                    tracing::debug!(path = %entry.path, "Manual route replaces discovered route");
                }
            }
        }

        tracing::info!(
            method = %entry.method,
            path = %entry.path,
            origin = entry.origin.as_str(),
            middleware = entry.middleware.len(),
            "Route registered"
        );
        self.patterns.insert(pattern, entry.path.clone());
        self.paths.insert(entry.path.clone());
        self.entries.push(entry);
        Ok(true)
    }

    /// True if any route is registered at `path`.
    pub fn contains_path(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.method == *method && e.path == path)
    }

    fn is_discovered(&self, path: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.path == path && e.origin == Origin::Discovered)
    }

    pub fn get(&self, method: &Method, path: &str) -> Option<&RouteEntry> {
        self.entries
            .iter()
            .find(|e| e.method == *method && e.path == path)
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    /// Number of entries with the given origin.
    pub fn count(&self, origin: Origin) -> usize {
        self.entries.iter().filter(|e| e.origin == origin).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<RouteEntry> {
        self.entries
    }
}

/// `/user/{id}/{*rest}` → `/user/{}/{*}`.
fn erase_captures(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        if c != '{' {
            out.push(c);
            continue;
        }
        let capture: String = chars.by_ref().take_while(|c| *c != '}').collect();
        out.push_str(if capture.starts_with('*') { "{*}" } else { "{}" });
    }
    out
}
