//! Application state and request middleware.

use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Path, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use podium_core::Services;

/// Header carrying the organizer password on management routes.
pub const MANAGE_PASSWORD_HEADER: &str = "x-manage-password";

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Mark the device cookie `Secure`.
    pub secure_cookies: bool,
}

impl AppState {
    /// Create application state.
    #[must_use]
    pub const fn new(services: Services, secure_cookies: bool) -> Self {
        Self {
            services,
            secure_cookies,
        }
    }
}

/// Management access middleware.
///
/// Verifies the show password for the `{slug}` in the path and makes the
/// show available to handlers through [`crate::extractors::ManagedShow`].
pub async fn manage_middleware(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let slug = params.get("slug").map(String::as_str).unwrap_or_default();
    let password = req
        .headers()
        .get(MANAGE_PASSWORD_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    match state.services.access.verify_manage_access(slug, &password).await {
        Ok(show) => {
            req.extensions_mut().insert(show);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}
