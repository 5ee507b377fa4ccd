//! Request-Level Errors
//!
//! Four recoverable categories, each with a fixed HTTP mapping. None of them
//! aborts the process; a request either gets a redirect, a 4xx, or an error
//! notice in the body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PanelError {
    /// No session, or an expired one
    #[error("authentication required")]
    AuthenticationRequired,

    /// Valid session, insufficient role
    #[error("authorization denied")]
    AuthorizationDenied,

    /// Malformed or out-of-range request parameter; nothing was mutated
    #[error("{0}")]
    Validation(String),

    /// A collaborator (settings store, radio, sensor) failed
    #[error("upstream failure: {0}")]
    Upstream(String),
}

impl PanelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<anyhow::Error> for PanelError {
    fn from(e: anyhow::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}

impl IntoResponse for PanelError {
    fn into_response(self) -> Response {
        match self {
            // Not-authenticated goes back to the login form
            PanelError::AuthenticationRequired => Redirect::to("/login").into_response(),
            // Authenticated-but-unprivileged goes to the dashboard, so the
            // two denials stay distinguishable
            PanelError::AuthorizationDenied => Redirect::to("/").into_response(),
            PanelError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            PanelError::Upstream(msg) => {
                tracing::error!("Upstream failure: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()).into_response()
            }
        }
    }
}
