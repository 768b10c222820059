//! Remote banking gateway trait

use async_trait::async_trait;

use crate::error::GatewayResult;
use crate::wire::{
    AuthTokenResponse, DepositPayload, DepositResponse, ReceivePayload, ReceiveResponse,
    TokenExchange, UserMeResponse, WithdrawPayload, WithdrawResponse,
};

/// Outbound calls to the remote open banking API.
///
/// Every method is exactly one remote call. Implementations never retry;
/// a transfer that timed out may still have been executed remotely.
#[async_trait]
pub trait RemoteBankingGateway: Send + Sync {
    /// Exchange an authorization code for an access token
    async fn exchange_token(&self, request: &TokenExchange) -> GatewayResult<AuthTokenResponse>;

    /// Fetch the remote user document for `user_seq_no`
    async fn fetch_user_info(
        &self,
        access_token: &str,
        user_seq_no: &str,
    ) -> GatewayResult<UserMeResponse>;

    async fn deposit(
        &self,
        access_token: &str,
        payload: &DepositPayload,
    ) -> GatewayResult<DepositResponse>;

    async fn withdraw(
        &self,
        access_token: &str,
        payload: &WithdrawPayload,
    ) -> GatewayResult<WithdrawResponse>;

    async fn inquiry_receive(
        &self,
        access_token: &str,
        payload: &ReceivePayload,
    ) -> GatewayResult<ReceiveResponse>;
}
