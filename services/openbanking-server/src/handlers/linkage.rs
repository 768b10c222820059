//! Linkage Handlers
//!
//! Start an authorization attempt and receive the redirect callback.

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::dto::{BeginLinkageRequest, CallbackQuery, CallbackResponse, LinkageResponse};
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiQuery};
use crate::state::AppState;

/// Record a linkage attempt under the state token the client will redirect with.
///
/// `member_id` is taken from the body as-is. This route must be mounted
/// behind the platform's own member authentication, which has to ensure the
/// caller owns `member_id`; otherwise any caller can reissue another
/// member's pending state.
pub async fn begin_linkage(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<BeginLinkageRequest>,
) -> ApiResult<(StatusCode, Json<LinkageResponse>)> {
    let record = state.service.begin_linkage(&req.state, req.member_id).await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

/// OAuth redirect target
pub async fn callback(
    State(state): State<Arc<AppState>>,
    ApiQuery(query): ApiQuery<CallbackQuery>,
) -> ApiResult<Json<CallbackResponse>> {
    let token = state
        .service
        .complete_linkage(&query.state, &query.code)
        .await?;
    Ok(Json(token.into()))
}
