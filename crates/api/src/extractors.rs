//! Request extractors.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use podium_common::{AppError, AppResult, IdGenerator};
use podium_db::entities::show;

/// Name of the voter identity cookie.
pub const DEVICE_COOKIE: &str = "device_id";

/// One year.
const DEVICE_COOKIE_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// The voter's device token, if the request carried one.
#[derive(Debug, Clone)]
pub struct DeviceId(pub Option<String>);

impl DeviceId {
    /// Borrow the token.
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for DeviceId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_request_parts(parts, state).await?;
        Ok(Self(
            jar.get(DEVICE_COOKIE)
                .map(|c| c.value().to_string())
                .filter(|v| !v.is_empty()),
        ))
    }
}

/// Make sure the response carries a device cookie, minting a new token
/// when the request had none.
pub fn ensure_device_cookie(
    jar: CookieJar,
    device: &DeviceId,
    secure: bool,
) -> AppResult<(CookieJar, String)> {
    if let Some(id) = device.as_deref() {
        return Ok((jar, id.to_string()));
    }

    let id = IdGenerator::new().generate_device_id();
    let mut raw = format!(
        "{DEVICE_COOKIE}={id}; Path=/; Max-Age={DEVICE_COOKIE_MAX_AGE_SECS}; HttpOnly; SameSite=Lax"
    );
    if secure {
        raw.push_str("; Secure");
    }
    let cookie = Cookie::parse(raw)
        .map_err(|e| AppError::Internal(format!("Invalid device cookie: {e}")))?;

    tracing::debug!("Issued new device cookie");
    Ok((jar.add(cookie), id))
}

/// The show whose management password the request proved.
#[derive(Debug, Clone)]
pub struct ManagedShow(pub show::Model);

impl<S> FromRequestParts<S> for ManagedShow
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the management middleware
        parts
            .extensions
            .get::<show::Model>()
            .cloned()
            .map(ManagedShow)
            .ok_or((StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_device_cookie_mints_when_missing() {
        let (jar, id) = ensure_device_cookie(CookieJar::new(), &DeviceId(None), true).unwrap();

        let cookie = jar.get(DEVICE_COOKIE).unwrap();
        assert_eq!(cookie.value(), id);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_ensure_device_cookie_keeps_existing() {
        let device = DeviceId(Some("existing".to_string()));
        let (jar, id) = ensure_device_cookie(CookieJar::new(), &device, false).unwrap();

        assert_eq!(id, "existing");
        assert!(jar.get(DEVICE_COOKIE).is_none());
    }
}
