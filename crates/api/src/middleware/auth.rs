//! Bearer token gate for the sync API.
//!
//! Agents and the admin console present `Authorization: Bearer <token>`.
//! Configured tokens are SHA-256 digests; an empty list disables the gate.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::app::AppState;
use crate::error::ApiError;

const FINGERPRINT_LEN: usize = 12;

/// Authenticated caller, stored in request extensions.
///
/// The fingerprint is a digest prefix, safe to log and to key rate limits on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenIdentity {
    pub fingerprint: String,
}

impl TokenIdentity {
    pub fn from_token(token: &str) -> Self {
        let digest = shared::crypto::sha256_hex(token);
        Self {
            fingerprint: digest[..FINGERPRINT_LEN].to_string(),
        }
    }
}

pub async fn require_token(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let allowed = &state.config.security.api_tokens;
    if allowed.is_empty() {
        return next.run(req).await;
    }

    let Some(Authorization(bearer)) = req.headers().typed_get::<Authorization<Bearer>>() else {
        return ApiError::Unauthorized("Missing bearer token".into()).into_response();
    };

    if !shared::crypto::token_matches(bearer.token(), allowed) {
        tracing::warn!("Rejected request with unknown bearer token");
        return ApiError::Unauthorized("Invalid bearer token".into()).into_response();
    }

    let identity = TokenIdentity::from_token(bearer.token());
    tracing::debug!(token = %identity.fingerprint, "Authenticated request");
    req.extensions_mut().insert(identity);
    next.run(req).await
}
