//! Demo service served by the `server-runner` binary.
//!
//! Routes (discovery verb POST unless configured otherwise):
//!
//! | Method | Path                   | Handler                          |
//! |--------|------------------------|----------------------------------|
//! | POST   | /GetUser               | `DemoServer::get_user` (group)   |
//! | POST   | /NothingToDo           | `DemoServer::nothing_to_do`      |
//! | GET    | /GetAge                | `get_age`                        |
//! | GET    | /NothingToDoWithAuto   | `nothing_to_do_with_auto`        |
//! | GET    | /ErrorWithAuto         | `error_with_auto`                |
//! | GET    | /InternalErrorWithAuto | `internal_error_with_auto`       |
//! | GET    | /                      | `index` (tree root)              |
//! | POST   | /api/LoginOut          | `ApiServer::login_out` (group)   |
//! | POST   | /api/Login             | `login`                          |
//! | GET    | /api/Login/Username    | `username`, behind [`auth`]      |

use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header::AUTHORIZATION, Method, StatusCode};
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::config::RunnerConfig;
use crate::handler::{Fault, InternalError, RequestContext};
use crate::http::ServerRunner;
use crate::routing::{Middleware, MethodSet, RegistrationError, RouteGroup, RouteNode};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GetUserRequest {
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserResponse {
    pub msg: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct GetAgeRequest {
    pub user_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetAgeResponse {
    pub msg: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

crate::aggregate!(
    GetUserRequest,
    GetUserResponse,
    GetAgeRequest,
    GetAgeResponse,
    LoginRequest,
    LoginResponse,
);

/// Root handler group.
#[derive(Debug, Default)]
pub struct DemoServer;

impl DemoServer {
    pub async fn get_user(
        self: Arc<Self>,
        _ctx: RequestContext,
        req: GetUserRequest,
    ) -> Result<Box<GetUserResponse>, Fault> {
        if req.user_name.is_empty() {
            return Err(Fault::msg("user name is nil"));
        }
        Ok(Box::new(GetUserResponse {
            msg: format!("hello,im {}", req.user_name),
        }))
    }

    pub async fn nothing_to_do(self: Arc<Self>, ctx: RequestContext) -> Result<(), Fault> {
        tracing::info!(route = ctx.route(), "NothingToDo");
        Ok(())
    }
}

impl RouteGroup for DemoServer {
    fn routes(routes: &mut MethodSet<Self>) {
        routes
            .method("GetUser", DemoServer::get_user)
            .method("NothingToDo", DemoServer::nothing_to_do);
    }
}

/// Handler group mounted under `/api`.
#[derive(Debug, Default)]
pub struct ApiServer;

impl ApiServer {
    pub async fn login_out(self: Arc<Self>, _ctx: RequestContext) -> Option<Fault> {
        Some(Fault::msg("this is a error"))
    }
}

impl RouteGroup for ApiServer {
    fn routes(routes: &mut MethodSet<Self>) {
        routes.method("LoginOut", ApiServer::login_out);
    }
}

pub async fn get_age(_ctx: RequestContext, req: GetAgeRequest) -> Result<Box<GetAgeResponse>, Fault> {
    match req.user_name.as_deref() {
        None | Some("") => Err(Fault::msg("user name is nil")),
        Some(name) => Ok(Box::new(GetAgeResponse {
            msg: format!("{name} is 20 years old"),
        })),
    }
}

pub async fn nothing_to_do_with_auto(ctx: RequestContext) -> Result<(), Fault> {
    tracing::info!(route = ctx.route(), "NothingToDo");
    Ok(())
}

pub async fn error_with_auto(_ctx: RequestContext) -> Result<(), Fault> {
    Err(Fault::msg("test error"))
}

pub async fn internal_error_with_auto(_ctx: RequestContext) -> Result<(), Fault> {
    Err(InternalError::new("test error").into())
}

pub async fn index(_ctx: RequestContext) -> Result<(), Fault> {
    Ok(())
}

pub async fn login(_ctx: RequestContext, req: LoginRequest) -> Result<Box<LoginResponse>, Fault> {
    tracing::info!(username = %req.username, "Login");
    Ok(Box::new(LoginResponse {
        token: "EBF09F808D8C4049B8F03B4FAAE1D223".to_string(),
    }))
}

pub async fn username(_ctx: RequestContext) -> Result<(), Fault> {
    Ok(())
}

/// Rejects requests without an `Authorization` header with 401 `{}`.
pub fn auth() -> Middleware {
    Middleware::from_fn("auth", |request: Request, next: Next| async move {
        if request.headers().contains_key(AUTHORIZATION) {
            next.run(request).await
        } else {
            (StatusCode::UNAUTHORIZED, Json(serde_json::json!({}))).into_response()
        }
    })
}

/// The demo route tree rooted at `/`.
pub fn router() -> RouteNode {
    RouteNode::new("/").method(Method::GET).handler(index).child(
        RouteNode::new("/api")
            .method(Method::POST)
            .group(ApiServer)
            .child(
                RouteNode::new("/Login")
                    .method(Method::POST)
                    .handler(login)
                    .child(
                        RouteNode::new("/Username")
                            .method(Method::GET)
                            .middleware(auth())
                            .handler(username),
                    ),
            ),
    )
}

/// A runner with every demo route registered.
pub fn runner(config: RunnerConfig) -> Result<ServerRunner, RegistrationError> {
    let mut runner = ServerRunner::new(config).with_group(DemoServer);
    runner
        .bind_router(Method::GET, "GetAge", get_age)?
        .bind_router(Method::GET, "NothingToDoWithAuto", nothing_to_do_with_auto)?
        .bind_router(Method::GET, "ErrorWithAuto", error_with_auto)?
        .bind_router(Method::GET, "InternalErrorWithAuto", internal_error_with_auto)?
        .add_router(router());
    Ok(runner)
}
