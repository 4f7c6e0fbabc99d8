//! HTTP server for the Prometheus metrics endpoint and token login.
//!
//! Runs on a separate tokio task and serves:
//! - `GET /metrics` for Prometheus scraping
//! - `POST /login` with `{"cmd": "login <user> <pass>"}` or
//!   `{"cmd": "register <user> <pass> <confirm>"}`, answering
//!   `{"token": ...}` or `{"error": ...}`

use crate::auth::{HmacTokenAuth, LoginRequest, UserDirectory, authenticate};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

/// Shared state of the login endpoint.
#[derive(Clone)]
pub struct LoginState {
    pub directory: Arc<dyn UserDirectory>,
    pub tokens: Arc<HmacTokenAuth>,
    pub max_name_length: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub cmd: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum LoginReply {
    Token { token: String },
    Error { error: String },
}

/// Handler for GET /metrics - returns Prometheus metrics in text format.
async fn metrics_handler() -> String {
    crate::metrics::gather_metrics()
}

/// Handler for POST /login.
async fn login_handler(
    State(state): State<LoginState>,
    Json(body): Json<LoginBody>,
) -> (StatusCode, Json<LoginReply>) {
    let outcome = match LoginRequest::parse(&body.cmd) {
        Ok(request) => {
            authenticate(
                state.directory.as_ref(),
                &state.tokens,
                &request,
                state.max_name_length,
            )
            .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(token) => (StatusCode::OK, Json(LoginReply::Token { token })),
        Err(e) => {
            tracing::info!(error = %e, "login rejected");
            let status = if e.is_client_error() {
                StatusCode::BAD_REQUEST
            } else if matches!(e, crate::auth::AuthError::Hash(_)) {
                StatusCode::INTERNAL_SERVER_ERROR
            } else {
                StatusCode::UNAUTHORIZED
            };
            (status, Json(LoginReply::Error { error: e.to_string() }))
        }
    }
}

/// Build the HTTP routes.
pub fn router(login: LoginState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/login", post(login_handler))
        .with_state(login)
}

/// Run the HTTP server.
///
/// Binds to `0.0.0.0:port`. This is a long-running task that should be
/// spawned in the background.
pub async fn run_http_server(port: u16, login: LoginState) {
    let app = router(login);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("HTTP server listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind HTTP server on {}: {}", addr, e);
            return;
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("HTTP server error: {}", e);
    }
}
