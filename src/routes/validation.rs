use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::SessionContext;
use crate::AppState;

/// Convert Unix timestamp to RFC3339 string, defaulting to now if invalid
pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .unwrap_or_else(Utc::now)
        .to_rfc3339()
}

/// Pull the bearer token out of the Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the request's session, or fail as not signed in
pub async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<SessionContext> {
    let token = bearer_token(headers).ok_or(AppError::NotSignedIn)?;
    state.sessions.resolve(token).await
}

/// Resolve the request's session and require the owner role claim
///
/// Mutation handlers gate on the claim, never on an email comparison.
pub async fn require_owner(state: &AppState, headers: &HeaderMap) -> Result<SessionContext> {
    let context = require_session(state, headers).await?;
    if !context.is_owner() {
        tracing::warn!("Mutation attempt by non-owner: {}", context.email);
        return Err(AppError::Forbidden);
    }
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_timestamp_to_rfc3339() {
        assert_eq!(
            timestamp_to_rfc3339(1733788800),
            "2024-12-10T00:00:00+00:00"
        );
    }
}
