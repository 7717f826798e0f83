//! API endpoints.

mod manage;
mod shows;
mod voting;

use axum::{Router, middleware};

use crate::middleware::{AppState, manage_middleware};

/// Create the API router.
///
/// Management routes are nested under `/manage/{slug}` and guarded by the
/// show password.
pub fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(voting::router())
        .nest("/shows", shows::router())
        .nest(
            "/manage/{slug}",
            manage::router().route_layer(middleware::from_fn_with_state(
                state.clone(),
                manage_middleware,
            )),
        )
}
