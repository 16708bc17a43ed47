//! HTTP request gate.
//!
//! Resolves the caller's identity from proxy headers, applies the policy to
//! the requested path and its children, and records every successful read.

mod error;
mod extract;
mod handlers;

use std::sync::Arc;

use accessledger_core::{AuditPipeline, Config, Notifier, PermissionTable};
use axum::Router;
use axum::routing::get;

pub use error::GateError;
pub use extract::{
    AuthenticatedUser, FAMILY_NAME_HEADER, GIVEN_NAME_HEADER, PICTURE_HEADER, USER_HEADER,
};

/// Shared application state for the handlers.
pub struct AppState<N> {
    /// Service configuration.
    pub config: Arc<Config>,
    /// Permission sets of every known identity.
    pub users: Arc<PermissionTable>,
    /// Audit pipeline receiving successful reads.
    pub audit: AuditPipeline<N>,
}

/// Build the router serving the user and API routes from `config.paths`.
pub fn build_router<N: Notifier>(state: Arc<AppState<N>>) -> Router {
    let api = state.config.paths.api.clone();
    let user = state.config.paths.user.clone();

    Router::new()
        .route(&user, get(handlers::user))
        .route(&api, get(handlers::api_root::<N>))
        .route(&format!("{api}/"), get(handlers::api_root::<N>))
        .route(&format!("{api}/{{*path}}"), get(handlers::api_path::<N>))
        .with_state(state)
}
