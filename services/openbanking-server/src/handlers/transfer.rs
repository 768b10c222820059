//! Transfer Handlers
//!
//! Deposits, withdrawals, receive inquiries and remote user info. Every route
//! takes the member's remote access token from `Authorization: Bearer`.

use axum::{extract::State, Json};
use std::sync::Arc;

use openbanking_core::UserInfo;
use openbanking_types::{InquiryReceiveResult, TransactionResult};

use crate::dto::{DepositBody, InquiryReceiveBody, UserInfoQuery, WithdrawBody};
use crate::error::ApiResult;
use crate::extractors::{ApiJson, ApiQuery, BearerToken};
use crate::state::AppState;

pub async fn deposit(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    ApiJson(body): ApiJson<DepositBody>,
) -> ApiResult<Json<TransactionResult>> {
    Ok(Json(state.service.deposit(body.into_request(token)).await?))
}

pub async fn withdraw(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    ApiJson(body): ApiJson<WithdrawBody>,
) -> ApiResult<Json<TransactionResult>> {
    Ok(Json(state.service.withdraw(body.into_request(token)).await?))
}

pub async fn inquiry_receive(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    ApiJson(body): ApiJson<InquiryReceiveBody>,
) -> ApiResult<Json<InquiryReceiveResult>> {
    Ok(Json(state.service.inquiry_receive(body.into_request(token)).await?))
}

/// Remote user document for the bearer token's owner
pub async fn user_me(
    State(state): State<Arc<AppState>>,
    BearerToken(token): BearerToken,
    ApiQuery(query): ApiQuery<UserInfoQuery>,
) -> ApiResult<Json<UserInfo>> {
    Ok(Json(state.service.get_user_info(&token, &query.user_seq_no).await?))
}
