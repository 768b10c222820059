//! reqwest-backed gateway

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::RemoteBankingGateway;
use crate::wire::{
    AuthTokenResponse, DepositPayload, DepositResponse, ReceivePayload, ReceiveResponse,
    TokenExchange, UserMeResponse, WithdrawPayload, WithdrawResponse,
};

/// Gateway talking to the remote API over HTTPS
#[derive(Clone)]
pub struct HttpGateway {
    config: GatewayConfig,
    client: Client,
}

impl HttpGateway {
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    async fn post_json<P, R>(&self, path: &str, access_token: &str, payload: &P) -> GatewayResult<R>
    where
        P: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.config.url(path);
        debug!(url = %url, "Calling remote API");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(payload)
            .send()
            .await?;

        decode(resp, path).await
    }
}

/// Reject non-success statuses, then decode the JSON body
async fn decode<R: DeserializeOwned>(resp: Response, path: &str) -> GatewayResult<R> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(path, status = status.as_u16(), "Remote API rejected request");
        return Err(GatewayError::remote(status.as_u16(), &body));
    }

    let body = resp.text().await?;
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

#[async_trait]
impl RemoteBankingGateway for HttpGateway {
    async fn exchange_token(&self, request: &TokenExchange) -> GatewayResult<AuthTokenResponse> {
        let url = self.config.url(&self.config.token_path);
        debug!(url = %url, client_id = %request.client_id, "Exchanging authorization code");

        let resp = self.client.post(&url).form(request).send().await?;
        decode(resp, &self.config.token_path).await
    }

    async fn fetch_user_info(
        &self,
        access_token: &str,
        user_seq_no: &str,
    ) -> GatewayResult<UserMeResponse> {
        let url = self.config.url(&self.config.user_me_path);
        debug!(url = %url, user_seq_no, "Fetching remote user info");

        let resp = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .query(&[("user_seq_no", user_seq_no)])
            .send()
            .await?;

        decode(resp, &self.config.user_me_path).await
    }

    async fn deposit(
        &self,
        access_token: &str,
        payload: &DepositPayload,
    ) -> GatewayResult<DepositResponse> {
        self.post_json(&self.config.deposit_path, access_token, payload).await
    }

    async fn withdraw(
        &self,
        access_token: &str,
        payload: &WithdrawPayload,
    ) -> GatewayResult<WithdrawResponse> {
        self.post_json(&self.config.withdraw_path, access_token, payload).await
    }

    async fn inquiry_receive(
        &self,
        access_token: &str,
        payload: &ReceivePayload,
    ) -> GatewayResult<ReceiveResponse> {
        self.post_json(&self.config.inquiry_receive_path, access_token, payload).await
    }
}
