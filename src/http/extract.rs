//! Request authentication for the user routes.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::account::Account;
use crate::error::LockgateError;

use super::routes::AppState;

/// Axum extractor for authenticated accounts.
///
/// Verifies the bearer session token and loads the account it names.
/// The request is rejected with 401 if any step fails.
pub struct CurrentAccount(pub Account);

impl FromRequestParts<AppState> for CurrentAccount {
    type Rejection = LockgateError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let claims = state.auth.verify_session(&token)?;

        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| LockgateError::unauthorized("Invalid token subject"))?;

        let account = state
            .auth
            .account_by_id(id)
            .await?
            .ok_or_else(|| LockgateError::unauthorized("Account no longer exists"))?;

        Ok(CurrentAccount(account))
    }
}

/// Extract the token from the Authorization header.
fn bearer_token(parts: &Parts) -> Result<String, LockgateError> {
    let auth_header = parts
        .headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| LockgateError::unauthorized("Missing authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            LockgateError::unauthorized(
                "Invalid authorization header format. Expected: Bearer <token>",
            )
        })?
        .to_string();

    if token.is_empty() {
        return Err(LockgateError::unauthorized("Empty bearer token"));
    }

    Ok(token)
}
