//! Public show endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use podium_common::AppResult;
use podium_core::{CreateShowInput, ShowView};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{DeviceId, ensure_device_cookie},
    middleware::AppState,
    response::ApiResponse,
};

/// Show listing entry.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowListingResponse {
    pub slug: String,
    pub updated_at: String,
}

/// Created show.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedShowResponse {
    pub id: String,
    pub slug: String,
    pub name: String,
}

/// Show query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowQuery {
    /// Only include the category open for voting.
    #[serde(default)]
    pub active_only: bool,
}

/// Verify request.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(default)]
    pub password: String,
}

/// Verify response.
#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
}

/// List all shows.
async fn list_shows(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ShowListingResponse>>> {
    let shows = state.services.shows.list_shows().await?;

    Ok(ApiResponse::ok(
        shows
            .into_iter()
            .map(|s| ShowListingResponse {
                slug: s.slug,
                updated_at: s.updated_at.to_rfc3339(),
            })
            .collect(),
    ))
}

/// Create a show.
async fn create_show(
    State(state): State<AppState>,
    Json(input): Json<CreateShowInput>,
) -> AppResult<ApiResponse<CreatedShowResponse>> {
    let show = state.services.shows.create_show(input).await?;

    Ok(ApiResponse::ok(CreatedShowResponse {
        id: show.id,
        slug: show.slug,
        name: show.name,
    }))
}

/// Get a show with live standings. Issues a device cookie to new voters.
async fn get_show(
    State(state): State<AppState>,
    device: DeviceId,
    jar: CookieJar,
    Path(slug): Path<String>,
    Query(query): Query<ShowQuery>,
) -> AppResult<(CookieJar, ApiResponse<ShowView>)> {
    let (jar, _) = ensure_device_cookie(jar, &device, state.secure_cookies)?;
    let show = state
        .services
        .shows
        .get_show_by_slug(&slug, query.active_only)
        .await?;

    Ok((jar, ApiResponse::ok(show)))
}

/// Check a show's management password.
async fn verify(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Json(req): Json<VerifyRequest>,
) -> AppResult<ApiResponse<VerifyResponse>> {
    state
        .services
        .access
        .verify_manage_access(&slug, &req.password)
        .await?;

    Ok(ApiResponse::ok(VerifyResponse { success: true }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shows).post(create_show))
        .route("/{slug}", get(get_show))
        .route("/{slug}/verify", post(verify))
}
