//! In-process gateway for tests
//!
//! Counts every call and records the last payload of each kind.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use openbanking_client::{
    AuthTokenResponse, DepositOutcome, DepositPayload, DepositResponse, GatewayError,
    GatewayResult, ReceivePayload, ReceiveResponse, RemoteBankingGateway, TokenExchange,
    UserAccount, UserMeResponse, WithdrawPayload, WithdrawResponse,
};

/// Gateway returning canned answers
pub struct StubGateway {
    access_token: String,
    user_seq_no: String,
    exchange_delay: Option<Duration>,
    calls: AtomicUsize,
    exchange_calls: AtomicUsize,
    failing_exchanges: AtomicUsize,
    failing_transfers: AtomicBool,
    last_exchange: Mutex<Option<TokenExchange>>,
    last_deposit: Mutex<Option<DepositPayload>>,
    last_withdraw: Mutex<Option<WithdrawPayload>>,
    last_receive: Mutex<Option<ReceivePayload>>,
}

impl Default for StubGateway {
    fn default() -> Self {
        Self::new("t1", "u1")
    }
}

impl StubGateway {
    /// Stub whose token exchange issues `access_token` for `user_seq_no`
    pub fn new(access_token: &str, user_seq_no: &str) -> Self {
        Self {
            access_token: access_token.to_string(),
            user_seq_no: user_seq_no.to_string(),
            exchange_delay: None,
            calls: AtomicUsize::new(0),
            exchange_calls: AtomicUsize::new(0),
            failing_exchanges: AtomicUsize::new(0),
            failing_transfers: AtomicBool::new(false),
            last_exchange: Mutex::new(None),
            last_deposit: Mutex::new(None),
            last_withdraw: Mutex::new(None),
            last_receive: Mutex::new(None),
        }
    }

    /// Hold every token exchange open for `delay`
    pub fn with_exchange_delay(mut self, delay: Duration) -> Self {
        self.exchange_delay = Some(delay);
        self
    }

    /// Fail the next `n` token exchanges with HTTP 400
    pub fn fail_next_exchanges(&self, n: usize) {
        self.failing_exchanges.store(n, Ordering::SeqCst);
    }

    /// Fail deposits, withdrawals and receive inquiries with HTTP 500
    pub fn fail_transfers(&self) {
        self.failing_transfers.store(true, Ordering::SeqCst);
    }

    /// Total remote calls of any kind
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn exchange_calls(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }

    pub fn last_exchange(&self) -> Option<TokenExchange> {
        self.last_exchange.lock().ok().and_then(|g| g.clone())
    }

    pub fn last_deposit(&self) -> Option<DepositPayload> {
        self.last_deposit.lock().ok().and_then(|g| g.clone())
    }

    pub fn last_withdraw(&self) -> Option<WithdrawPayload> {
        self.last_withdraw.lock().ok().and_then(|g| g.clone())
    }

    pub fn last_receive(&self) -> Option<ReceivePayload> {
        self.last_receive.lock().ok().and_then(|g| g.clone())
    }

    fn record<T>(slot: &Mutex<Option<T>>, value: &T)
    where
        T: Clone,
    {
        if let Ok(mut guard) = slot.lock() {
            *guard = Some(value.clone());
        }
    }

    fn transfer_outcome(&self) -> GatewayResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_transfers.load(Ordering::SeqCst) {
            return Err(GatewayError::Remote {
                status: 500,
                body: "stubbed failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteBankingGateway for StubGateway {
    async fn exchange_token(&self, request: &TokenExchange) -> GatewayResult<AuthTokenResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);
        Self::record(&self.last_exchange, request);

        if let Some(delay) = self.exchange_delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing_exchanges
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(GatewayError::Remote {
                status: 400,
                body: "{\"rsp_code\":\"O0001\"}".to_string(),
            });
        }

        Ok(AuthTokenResponse {
            access_token: self.access_token.clone(),
            token_type: "Bearer".to_string(),
            expires_in: Some(7_775_999),
            refresh_token: Some(format!("refresh-{}", self.access_token)),
            scope: Some("login inquiry transfer".to_string()),
            user_seq_no: self.user_seq_no.clone(),
        })
    }

    async fn fetch_user_info(
        &self,
        _access_token: &str,
        user_seq_no: &str,
    ) -> GatewayResult<UserMeResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(UserMeResponse {
            api_tran_id: "api-user-me".to_string(),
            rsp_code: "A0000".to_string(),
            user_seq_no: user_seq_no.to_string(),
            user_name: "Holder".to_string(),
            res_cnt: "1".to_string(),
            res_list: vec![UserAccount {
                fintech_use_num: "110-1".to_string(),
                bank_name: "Test Bank".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    async fn deposit(
        &self,
        _access_token: &str,
        payload: &DepositPayload,
    ) -> GatewayResult<DepositResponse> {
        Self::record(&self.last_deposit, payload);
        self.transfer_outcome()?;

        Ok(DepositResponse {
            api_tran_id: "api-deposit".to_string(),
            rsp_code: "A0000".to_string(),
            res_cnt: payload.req_cnt.clone(),
            res_list: payload
                .req_list
                .iter()
                .map(|item| DepositOutcome {
                    tran_no: item.tran_no.clone(),
                    bank_tran_id: item.bank_tran_id.clone(),
                    bank_rsp_code: "000".to_string(),
                    tran_amt: item.tran_amt.clone(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        })
    }

    async fn withdraw(
        &self,
        _access_token: &str,
        payload: &WithdrawPayload,
    ) -> GatewayResult<WithdrawResponse> {
        Self::record(&self.last_withdraw, payload);
        self.transfer_outcome()?;

        Ok(WithdrawResponse {
            api_tran_id: "api-withdraw".to_string(),
            rsp_code: "A0000".to_string(),
            bank_tran_id: payload.bank_tran_id.clone(),
            tran_amt: payload.tran_amt.clone(),
            ..Default::default()
        })
    }

    async fn inquiry_receive(
        &self,
        _access_token: &str,
        payload: &ReceivePayload,
    ) -> GatewayResult<ReceiveResponse> {
        Self::record(&self.last_receive, payload);
        self.transfer_outcome()?;

        Ok(ReceiveResponse {
            api_tran_id: "api-receive".to_string(),
            rsp_code: "A0000".to_string(),
            bank_tran_id: payload.bank_tran_id.clone(),
            bank_code_std: payload.bank_code_std.clone(),
            account_holder_name: "Holder".to_string(),
            tran_amt: payload.tran_amt.clone(),
            ..Default::default()
        })
    }
}
