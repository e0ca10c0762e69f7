use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{error::ApiError, AppState};

/// Extractor that validates the `X-Admin-Key` header against `config.admin_api_key`.
pub struct AdminAuth;

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let key = parts
            .headers
            .get("X-Admin-Key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized("Missing X-Admin-Key header"))?;

        if !constant_time_eq(key.as_bytes(), state.config.admin_api_key.as_bytes()) {
            tracing::warn!("rejected admin request with invalid key");
            return Err(ApiError::Unauthorized("Invalid admin key"));
        }

        Ok(AdminAuth)
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::constant_time_eq;

    #[test]
    fn compares_whole_keys() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret-longer"));
        assert!(!constant_time_eq(b"", b"x"));
    }
}
