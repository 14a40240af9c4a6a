//! Request extractors for the reference backend

use super::handlers::ServerState;
use crate::client::USER_HEADER;
use crate::core::error::{RequestError, RevOpsError};
use crate::core::record::CurrentUser;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// The caller, resolved from the `x-user-id` header
///
/// Rejects with 401 when the header is missing, empty, or names a user the
/// store does not know.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub CurrentUser);

impl FromRequestParts<ServerState> for AuthenticatedUser {
    type Rejection = RevOpsError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| RequestError::MissingHeader {
                header: USER_HEADER.to_string(),
            })?;

        let user = state
            .store
            .user(user_id)
            .await?
            .ok_or_else(|| RequestError::Unauthorized {
                message: format!("unknown user '{}'", user_id),
            })?;

        Ok(AuthenticatedUser(user))
    }
}
