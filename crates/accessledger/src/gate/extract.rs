//! Identity extraction from proxy headers.

use std::sync::Arc;

use accessledger_core::{Error, Identity, Notifier, User};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use super::{AppState, GateError};

/// Header carrying the caller's email.
pub const USER_HEADER: &str = "x-user";
/// Header carrying the caller's given name.
pub const GIVEN_NAME_HEADER: &str = "x-given-name";
/// Header carrying the caller's family name.
pub const FAMILY_NAME_HEADER: &str = "x-family-name";
/// Header carrying the caller's picture URL.
pub const PICTURE_HEADER: &str = "x-picture";

/// The caller, enriched with its permission set.
///
/// Rejects with 403 when the email is not in the permission table.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<N: Notifier> FromRequestParts<Arc<AppState<N>>> for AuthenticatedUser {
    type Rejection = GateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState<N>>,
    ) -> Result<Self, Self::Rejection> {
        let identity = Identity {
            given_name: header(parts, GIVEN_NAME_HEADER),
            family_name: header(parts, FAMILY_NAME_HEADER),
            email: header(parts, USER_HEADER),
            picture: header(parts, PICTURE_HEADER),
        };

        match state.users.enrich(identity) {
            Ok(user) => Ok(Self(user)),
            Err(Error::Forbidden(email)) => {
                warn!("{email} is forbidden");
                Err(GateError::Forbidden(email))
            }
            Err(e) => {
                warn!("failed to resolve identity: {e}");
                Err(GateError::Forbidden(String::new()))
            }
        }
    }
}

fn header(parts: &Parts, name: &str) -> String {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
