//! Request plumbing shared by the API routers
//!
//! Device identity rides on the `X-Device-ID` header: an opaque fingerprint
//! token of 32 to 64 visible ASCII characters. The core trusts it as the
//! account key and performs no further validation.

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, StatusCode};

pub const DEVICE_ID_HEADER: &str = "x-device-id";

const DEVICE_ID_MIN_LEN: usize = 32;
const DEVICE_ID_MAX_LEN: usize = 64;

/// Extractor for the caller's device fingerprint token.
#[derive(Debug, Clone)]
pub struct DeviceId(pub String);

impl<S> FromRequestParts<S> for DeviceId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, String);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(DEVICE_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                (
                    StatusCode::BAD_REQUEST,
                    "Missing X-Device-ID header".to_string(),
                )
            })?;

        validate_device_token(raw).map_err(|message| (StatusCode::BAD_REQUEST, message))?;

        Ok(DeviceId(raw.to_string()))
    }
}

/// Check a device token against the header contract.
pub fn validate_device_token(token: &str) -> Result<(), String> {
    if token.len() < DEVICE_ID_MIN_LEN || token.len() > DEVICE_ID_MAX_LEN {
        return Err(format!(
            "Device ID must be {} to {} characters",
            DEVICE_ID_MIN_LEN, DEVICE_ID_MAX_LEN
        ));
    }
    if !token.bytes().all(|b| b.is_ascii_graphic()) {
        return Err("Device ID must be printable ASCII".to_string());
    }
    Ok(())
}

/// Validate the admin API key on governance endpoints.
pub fn require_admin_key(
    configured: &Option<String>,
    provided: &str,
) -> Result<(), (StatusCode, String)> {
    match configured {
        Some(key) if provided == key => Ok(()),
        Some(_) => Err((StatusCode::FORBIDDEN, "Invalid admin API key".to_string())),
        None => Err((
            StatusCode::FORBIDDEN,
            "Admin API key not configured".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_token_length_bounds() {
        assert!(validate_device_token(&"a".repeat(31)).is_err());
        assert!(validate_device_token(&"a".repeat(32)).is_ok());
        assert!(validate_device_token(&"a".repeat(64)).is_ok());
        assert!(validate_device_token(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_device_token_rejects_non_printable() {
        let token = format!("{}\u{7}", "a".repeat(40));
        assert!(validate_device_token(&token).is_err());
    }

    #[test]
    fn test_admin_key_check() {
        let configured = Some("secret".to_string());
        assert!(require_admin_key(&configured, "secret").is_ok());
        assert!(require_admin_key(&configured, "wrong").is_err());
        assert!(require_admin_key(&None, "anything").is_err());
    }
}
