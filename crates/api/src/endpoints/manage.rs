//! Organizer endpoints.
//!
//! Every route here sits behind the management middleware, which proves
//! the show password and hands the show to handlers as [`ManagedShow`].
//! Handlers only touch categories and nominations of that show.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, post},
};
use podium_common::{AppError, AppResult};
use podium_core::CreateCategoryInput;
use podium_core::CreateNominationInput;
use podium_db::entities::{category, category::CategoryType, nomination, show};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::ManagedShow,
    middleware::AppState,
    response::{ApiResponse, ok},
};

/// Add category request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "type", default)]
    pub category_type: CategoryType,
    pub ranking_top: Option<i32>,
    #[serde(default)]
    pub source_category_ids: Vec<String>,
}

/// Add nomination request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddNominationRequest {
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,
}

/// Reset response.
#[derive(Serialize)]
pub struct ResetResponse {
    pub deleted: u64,
}

/// Load a category, hiding categories of other shows.
async fn owned_category(
    state: &AppState,
    show: &show::Model,
    category_id: &str,
) -> AppResult<category::Model> {
    let category = state.services.categories.get_category(category_id).await?;
    if category.show_id != show.id {
        return Err(AppError::NotFound(format!(
            "Category not found: {category_id}"
        )));
    }
    Ok(category)
}

/// Get the managed show with every category.
async fn get_show(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
) -> AppResult<ApiResponse<podium_core::ShowView>> {
    let view = state.services.shows.get_show(&show.id).await?;
    Ok(ApiResponse::ok(view))
}

/// Delete the managed show.
async fn delete_show(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
) -> AppResult<impl IntoResponse> {
    state.services.shows.delete_show(&show.id).await?;
    Ok(ok())
}

/// Categories usable as aggregate sources.
async fn source_candidates(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
) -> AppResult<ApiResponse<Vec<category::Model>>> {
    let candidates = state
        .services
        .categories
        .list_source_candidates(&show.id)
        .await?;
    Ok(ApiResponse::ok(candidates))
}

/// Add a category.
async fn add_category(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
    Json(req): Json<AddCategoryRequest>,
) -> AppResult<ApiResponse<category::Model>> {
    let category = state
        .services
        .categories
        .add_category(CreateCategoryInput {
            show_id: show.id,
            name: req.name,
            description: req.description,
            category_type: req.category_type,
            ranking_top: req.ranking_top,
            source_category_ids: req.source_category_ids,
        })
        .await?;
    Ok(ApiResponse::ok(category))
}

/// Delete a category.
async fn delete_category(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
    Path((_, category_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    owned_category(&state, &show, &category_id).await?;
    state.services.categories.delete_category(&category_id).await?;
    Ok(ok())
}

/// Open or close a category for voting.
async fn activate(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
    Path((_, category_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<category::Model>> {
    owned_category(&state, &show, &category_id).await?;
    let category = state
        .services
        .activation
        .activate_category(&category_id)
        .await?;
    Ok(ApiResponse::ok(category))
}

/// Toggle result reveal.
async fn toggle_reveal(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
    Path((_, category_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<category::Model>> {
    owned_category(&state, &show, &category_id).await?;
    let category = state.services.activation.toggle_reveal(&category_id).await?;
    Ok(ApiResponse::ok(category))
}

/// Toggle hidden vote counts.
async fn toggle_hide_vote_counts(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
    Path((_, category_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<category::Model>> {
    owned_category(&state, &show, &category_id).await?;
    let category = state
        .services
        .activation
        .toggle_hide_vote_counts(&category_id)
        .await?;
    Ok(ApiResponse::ok(category))
}

/// Toggle winner-only presentation.
async fn toggle_winner_only(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
    Path((_, category_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<category::Model>> {
    owned_category(&state, &show, &category_id).await?;
    let category = state
        .services
        .activation
        .toggle_winner_only(&category_id)
        .await?;
    Ok(ApiResponse::ok(category))
}

/// Delete every ballot in a category.
async fn reset_category(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
    Path((_, category_id)): Path<(String, String)>,
) -> AppResult<ApiResponse<ResetResponse>> {
    owned_category(&state, &show, &category_id).await?;
    let deleted = state
        .services
        .ballots
        .reset_category_votes(&category_id)
        .await?;
    Ok(ApiResponse::ok(ResetResponse { deleted }))
}

/// Delete every ballot in the show.
async fn reset_all(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
) -> AppResult<ApiResponse<ResetResponse>> {
    let deleted = state.services.ballots.reset_all_votes(&show.id).await?;
    Ok(ApiResponse::ok(ResetResponse { deleted }))
}

/// Add a nomination.
async fn add_nomination(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
    Json(req): Json<AddNominationRequest>,
) -> AppResult<ApiResponse<nomination::Model>> {
    owned_category(&state, &show, &req.category_id).await?;
    let nomination = state
        .services
        .nominations
        .add_nomination(CreateNominationInput {
            category_id: req.category_id,
            name: req.name,
            description: req.description,
        })
        .await?;
    Ok(ApiResponse::ok(nomination))
}

/// Delete a nomination.
async fn delete_nomination(
    State(state): State<AppState>,
    ManagedShow(show): ManagedShow,
    Path((_, nomination_id)): Path<(String, String)>,
) -> AppResult<impl IntoResponse> {
    let (_, category) = state
        .services
        .nominations
        .get_with_category(&nomination_id)
        .await?;
    if category.show_id != show.id {
        return Err(AppError::NotFound(format!(
            "Nomination not found: {nomination_id}"
        )));
    }

    state
        .services
        .nominations
        .delete_nomination(&nomination_id)
        .await?;
    Ok(ok())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_show).delete(delete_show))
        .route("/sources", get(source_candidates))
        .route("/reset", post(reset_all))
        .route("/categories", post(add_category))
        .route("/categories/{id}", delete(delete_category))
        .route("/categories/{id}/activate", post(activate))
        .route("/categories/{id}/reveal", post(toggle_reveal))
        .route(
            "/categories/{id}/hide-vote-counts",
            post(toggle_hide_vote_counts),
        )
        .route("/categories/{id}/winner-only", post(toggle_winner_only))
        .route("/categories/{id}/reset", post(reset_category))
        .route("/nominations", post(add_nomination))
        .route("/nominations/{id}", delete(delete_nomination))
}
