//! Voter and presentation endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use podium_common::AppResult;
use podium_core::{CategoryTally, RankedNomination, RankingEntry};
use podium_db::entities::nomination;
use serde::{Deserialize, Serialize};

use crate::{
    extractors::{DeviceId, ensure_device_cookie},
    middleware::AppState,
    response::ApiResponse,
};

/// Cast ballot request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastBallotRequest {
    pub nomination_id: String,
}

/// Cast ballot response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CastBallotResponse {
    pub category_id: String,
    pub nomination_id: String,
}

/// Submit ranking request.
#[derive(Debug, Deserialize)]
pub struct SubmitRankingRequest {
    pub rankings: Vec<RankingEntry>,
}

/// The requesting device's current choice in a category.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyBallotResponse {
    pub has_voted: bool,
    pub nomination: Option<nomination::Model>,
    pub ranking: Vec<RankedNomination>,
}

/// Live standings of a category.
async fn get_tally(
    State(state): State<AppState>,
    Path(category_id): Path<String>,
) -> AppResult<ApiResponse<CategoryTally>> {
    let tally = state.services.tally.get_tally(&category_id).await?;
    Ok(ApiResponse::ok(tally))
}

/// The device's current ballot. Issues a device cookie to new voters.
async fn my_ballot(
    State(state): State<AppState>,
    device: DeviceId,
    jar: CookieJar,
    Path(category_id): Path<String>,
) -> AppResult<(CookieJar, ApiResponse<MyBallotResponse>)> {
    let ballots = &state.services.ballots;
    let has_voted = ballots.has_voted(device.as_deref(), &category_id).await?;
    let nomination = ballots
        .current_ballot(device.as_deref(), &category_id)
        .await?;
    let ranking = ballots
        .current_ranking(device.as_deref(), &category_id)
        .await?;
    let (jar, _) = ensure_device_cookie(jar, &device, state.secure_cookies)?;

    Ok((
        jar,
        ApiResponse::ok(MyBallotResponse {
            has_voted,
            nomination,
            ranking,
        }),
    ))
}

/// Cast or change a single-choice ballot.
async fn cast_ballot(
    State(state): State<AppState>,
    device: DeviceId,
    Json(req): Json<CastBallotRequest>,
) -> AppResult<ApiResponse<CastBallotResponse>> {
    let ballot = state
        .services
        .ballots
        .cast_ballot(device.as_deref(), &req.nomination_id)
        .await?;

    Ok(ApiResponse::ok(CastBallotResponse {
        category_id: ballot.category_id,
        nomination_id: ballot.nomination_id,
    }))
}

/// Submit or replace a full ranking.
async fn submit_ranking(
    State(state): State<AppState>,
    device: DeviceId,
    Path(category_id): Path<String>,
    Json(req): Json<SubmitRankingRequest>,
) -> AppResult<ApiResponse<Vec<RankedNomination>>> {
    let rankings = &state.services.rankings;
    rankings
        .submit_ranking(device.as_deref(), &category_id, req.rankings)
        .await?;

    let current = state
        .services
        .ballots
        .current_ranking(device.as_deref(), &category_id)
        .await?;
    Ok(ApiResponse::ok(current))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/ballots", post(cast_ballot))
        .route("/categories/{id}", get(get_tally))
        .route("/categories/{id}/ballot", get(my_ballot))
        .route("/categories/{id}/ranking", post(submit_ranking))
}
