//! Transaction facade - domain requests in, domain results out
//!
//! Each operation is one gateway call. Nothing is retried here: a transfer
//! whose outcome is unknown must be reconciled, not replayed.

use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{error, info};

use openbanking_client::{
    DepositItem, DepositPayload, ReceivePayload, RemoteBankingGateway, UserMeResponse,
    WithdrawPayload,
};
use openbanking_types::{
    AccessToken, DepositRequest, InquiryReceiveRequest, InquiryReceiveResult, ReceiveSummary,
    TransactionResult, WithdrawRequest,
};

use crate::error::{FailureStage, OpenBankingError, OpenBankingResult};

/// Remote user document, passed through unchanged
pub type UserInfo = UserMeResponse;

const CONTRACT_ACCOUNT_TYPE: &str = "N";
const TRANSFER_PURPOSE: &str = "TR";
const RECEIVE_PURPOSE: &str = "RC";
const DEFAULT_PRINT_CONTENT: &str = "open banking";
const TRAN_DTIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Translates transfers and inquiries to the remote wire contract
pub struct TransactionFacade {
    gateway: Arc<dyn RemoteBankingGateway>,
    settlement_account: String,
    institution_code: String,
}

impl TransactionFacade {
    pub fn new(
        gateway: Arc<dyn RemoteBankingGateway>,
        settlement_account: impl Into<String>,
        institution_code: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            settlement_account: settlement_account.into(),
            institution_code: institution_code.into(),
        }
    }

    /// Bank transaction id: institution code, `U`, nine random digits
    fn next_bank_tran_id(&self) -> String {
        let serial: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
        format!("{}U{:09}", self.institution_code, serial)
    }

    pub async fn deposit(&self, request: DepositRequest) -> OpenBankingResult<TransactionResult> {
        require_token(&request.access_token)?;
        require_account(&request.to_account_number)?;
        require_amount(request.amount)?;

        let bank_tran_id = self.next_bank_tran_id();
        let print_content = print_content(&request.print_content);
        let payload = DepositPayload {
            cntr_account_type: CONTRACT_ACCOUNT_TYPE.to_string(),
            cntr_account_num: self.settlement_account.clone(),
            wd_pass_phrase: "NONE".to_string(),
            wd_print_content: print_content.clone(),
            name_check_option: "off".to_string(),
            tran_dtime: tran_dtime(),
            req_cnt: "1".to_string(),
            req_list: vec![DepositItem {
                tran_no: "1".to_string(),
                bank_tran_id: bank_tran_id.clone(),
                fintech_use_num: request.to_account_number.clone(),
                print_content,
                tran_amt: request.amount.to_string(),
                req_client_name: request.member_id.to_string(),
                req_client_num: request.member_id.to_string(),
                transfer_purpose: TRANSFER_PURPOSE.to_string(),
            }],
        };

        let response = self
            .gateway
            .deposit(request.access_token.as_str(), &payload)
            .await
            .map_err(|e| {
                error!(member_id = %request.member_id, bank_tran_id = %bank_tran_id, error = %e, "Deposit failed");
                OpenBankingError::remote(FailureStage::Deposit, e)
            })?;

        let echoed = response
            .res_list
            .first()
            .map(|item| item.bank_tran_id.clone())
            .filter(|id| !id.is_empty())
            .unwrap_or(bank_tran_id);

        info!(
            member_id = %request.member_id,
            api_tran_id = %response.api_tran_id,
            rsp_code = %response.rsp_code,
            amount = request.amount,
            "Deposit relayed"
        );

        Ok(TransactionResult {
            member_id: request.member_id,
            account_number: request.to_account_number,
            api_tran_id: response.api_tran_id,
            bank_tran_id: echoed,
            rsp_code: response.rsp_code,
            rsp_message: response.rsp_message,
            amount: request.amount,
            completed_at: Utc::now(),
        })
    }

    pub async fn withdraw(&self, request: WithdrawRequest) -> OpenBankingResult<TransactionResult> {
        require_token(&request.access_token)?;
        require_account(&request.from_account_number)?;
        require_amount(request.amount)?;

        let bank_tran_id = self.next_bank_tran_id();
        let print_content = print_content(&request.print_content);
        let payload = WithdrawPayload {
            bank_tran_id: bank_tran_id.clone(),
            cntr_account_type: CONTRACT_ACCOUNT_TYPE.to_string(),
            cntr_account_num: self.settlement_account.clone(),
            dps_print_content: print_content.clone(),
            fintech_use_num: request.from_account_number.clone(),
            wd_print_content: print_content,
            tran_amt: request.amount.to_string(),
            tran_dtime: tran_dtime(),
            req_client_name: request.member_id.to_string(),
            req_client_fintech_use_num: request.from_account_number.clone(),
            req_client_num: request.member_id.to_string(),
            transfer_purpose: TRANSFER_PURPOSE.to_string(),
        };

        let response = self
            .gateway
            .withdraw(request.access_token.as_str(), &payload)
            .await
            .map_err(|e| {
                error!(member_id = %request.member_id, bank_tran_id = %bank_tran_id, error = %e, "Withdraw failed");
                OpenBankingError::remote(FailureStage::Withdraw, e)
            })?;

        info!(
            member_id = %request.member_id,
            api_tran_id = %response.api_tran_id,
            rsp_code = %response.rsp_code,
            amount = request.amount,
            "Withdraw relayed"
        );

        Ok(TransactionResult {
            member_id: request.member_id,
            account_number: request.from_account_number,
            api_tran_id: response.api_tran_id,
            bank_tran_id: non_empty(response.bank_tran_id).unwrap_or(bank_tran_id),
            rsp_code: response.rsp_code,
            rsp_message: response.rsp_message,
            amount: request.amount,
            completed_at: Utc::now(),
        })
    }

    /// Look up the holder of a receiving account, from the settlement account
    pub async fn inquiry_receive(
        &self,
        request: InquiryReceiveRequest,
    ) -> OpenBankingResult<InquiryReceiveResult> {
        require_token(&request.access_token)?;
        require_account(&request.account_number)?;
        if request.bank_code.trim().is_empty() {
            return Err(OpenBankingError::invalid("bank_code must not be empty"));
        }
        require_amount(request.amount)?;

        let bank_tran_id = self.next_bank_tran_id();
        let payload = ReceivePayload {
            bank_tran_id: bank_tran_id.clone(),
            cntr_account_type: CONTRACT_ACCOUNT_TYPE.to_string(),
            cntr_account_num: self.settlement_account.clone(),
            bank_code_std: request.bank_code.clone(),
            account_num: request.account_number.clone(),
            print_content: print_content(&request.print_content),
            tran_amt: request.amount.to_string(),
            req_client_name: request.member_id.to_string(),
            req_client_num: request.member_id.to_string(),
            transfer_purpose: RECEIVE_PURPOSE.to_string(),
            tran_dtime: tran_dtime(),
        };

        let response = self
            .gateway
            .inquiry_receive(request.access_token.as_str(), &payload)
            .await
            .map_err(|e| {
                error!(member_id = %request.member_id, bank_tran_id = %bank_tran_id, error = %e, "Receive inquiry failed");
                OpenBankingError::remote(FailureStage::InquiryReceive, e)
            })?;

        info!(
            member_id = %request.member_id,
            api_tran_id = %response.api_tran_id,
            rsp_code = %response.rsp_code,
            "Receive inquiry relayed"
        );

        let receive = ReceiveSummary {
            api_tran_id: response.api_tran_id,
            bank_tran_id: non_empty(response.bank_tran_id).unwrap_or(bank_tran_id),
            rsp_code: response.rsp_code,
            rsp_message: response.rsp_message,
            bank_name: non_empty(response.bank_name),
            account_holder_name: non_empty(response.account_holder_name),
        };

        Ok(InquiryReceiveResult {
            member_id: request.member_id,
            receive,
            request,
            completed_at: Utc::now(),
        })
    }

    pub async fn get_user_info(
        &self,
        access_token: &AccessToken,
        user_seq_no: &str,
    ) -> OpenBankingResult<UserInfo> {
        require_token(access_token)?;
        if user_seq_no.trim().is_empty() {
            return Err(OpenBankingError::invalid("user_seq_no must not be empty"));
        }

        self.gateway
            .fetch_user_info(access_token.as_str(), user_seq_no)
            .await
            .map_err(|e| OpenBankingError::remote(FailureStage::UserInfo, e))
    }
}

fn require_token(token: &AccessToken) -> OpenBankingResult<()> {
    if token.is_empty() {
        return Err(OpenBankingError::invalid("access_token must not be empty"));
    }
    Ok(())
}

fn require_account(account: &str) -> OpenBankingResult<()> {
    if account.trim().is_empty() {
        return Err(OpenBankingError::invalid("account number must not be empty"));
    }
    Ok(())
}

fn require_amount(amount: u64) -> OpenBankingResult<()> {
    if amount == 0 {
        return Err(OpenBankingError::invalid("amount must be greater than zero"));
    }
    Ok(())
}

fn print_content(content: &Option<String>) -> String {
    content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_PRINT_CONTENT)
        .to_string()
}

fn non_empty(value: String) -> Option<String> {
    Some(value).filter(|v| !v.is_empty())
}

fn tran_dtime() -> String {
    Utc::now().format(TRAN_DTIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubGateway;
    use openbanking_types::MemberId;

    fn facade(gateway: Arc<StubGateway>) -> TransactionFacade {
        TransactionFacade::new(gateway, "999-1", "M202300001")
    }

    fn deposit_request(amount: u64) -> DepositRequest {
        DepositRequest {
            member_id: MemberId::new(),
            access_token: AccessToken::new("t1"),
            to_account_number: "110-1".into(),
            amount,
            print_content: None,
        }
    }

    #[test]
    fn test_bank_tran_id_shape() {
        let facade = facade(Arc::new(StubGateway::default()));
        let id = facade.next_bank_tran_id();
        assert_eq!(id.len(), "M202300001".len() + 10);
        assert!(id.starts_with("M202300001U"));
        assert!(id[11..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_tran_dtime_is_fourteen_digits() {
        let value = tran_dtime();
        assert_eq!(value.len(), 14);
        assert!(value.chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_deposit_translates_request() {
        let gateway = Arc::new(StubGateway::default());
        let facade = facade(gateway.clone());
        let request = deposit_request(10_000);
        let member_id = request.member_id;

        let result = facade.deposit(request).await.unwrap();
        assert_eq!(result.member_id, member_id);
        assert_eq!(result.account_number, "110-1");
        assert_eq!(result.amount, 10_000);
        assert_eq!(result.api_tran_id, "api-deposit");

        let payload = gateway.last_deposit().unwrap();
        assert_eq!(payload.cntr_account_num, "999-1");
        assert_eq!(payload.req_list[0].fintech_use_num, "110-1");
        assert_eq!(payload.req_list[0].tran_amt, "10000");
        assert_eq!(result.bank_tran_id, payload.req_list[0].bank_tran_id);
    }

    #[tokio::test]
    async fn test_zero_amount_never_calls_remote() {
        let gateway = Arc::new(StubGateway::default());
        let facade = facade(gateway.clone());

        let err = facade.deposit(deposit_request(0)).await.unwrap_err();
        assert!(matches!(err, OpenBankingError::InvalidRequest(_)));
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_token_rejected() {
        let gateway = Arc::new(StubGateway::default());
        let facade = facade(gateway.clone());
        let mut request = deposit_request(100);
        request.access_token = AccessToken::new(" ");

        let err = facade.deposit(request).await.unwrap_err();
        assert_eq!(err.stage(), FailureStage::Request);
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_withdraw_failure_is_attributed() {
        let gateway = Arc::new(StubGateway::default());
        gateway.fail_transfers();
        let facade = facade(gateway.clone());

        let err = facade
            .withdraw(WithdrawRequest {
                member_id: MemberId::new(),
                access_token: AccessToken::new("t1"),
                from_account_number: "220-2".into(),
                amount: 5_000,
                print_content: Some("rent".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.stage(), FailureStage::Withdraw);
        assert_eq!(gateway.calls(), 1);
    }

    #[tokio::test]
    async fn test_inquiry_injects_settlement_account() {
        let gateway = Arc::new(StubGateway::default());
        let facade = facade(gateway.clone());
        let request = InquiryReceiveRequest {
            member_id: MemberId::new(),
            access_token: AccessToken::new("t1"),
            bank_code: "097".into(),
            account_number: "330-3".into(),
            amount: 1_000,
            print_content: None,
        };

        let result = facade.inquiry_receive(request.clone()).await.unwrap();
        assert_eq!(result.request, request);
        assert_eq!(result.receive.account_holder_name.as_deref(), Some("Holder"));
        assert_eq!(result.receive.bank_name, None);

        let payload = gateway.last_receive().unwrap();
        assert_eq!(payload.cntr_account_num, "999-1");
        assert_eq!(payload.bank_code_std, "097");
        assert_eq!(payload.print_content, DEFAULT_PRINT_CONTENT);
    }

    #[tokio::test]
    async fn test_user_info_passthrough() {
        let gateway = Arc::new(StubGateway::default());
        let facade = facade(gateway.clone());

        let info = facade
            .get_user_info(&AccessToken::new("t1"), "u1")
            .await
            .unwrap();
        assert_eq!(info.user_seq_no, "u1");
        assert_eq!(info.res_list.len(), 1);
    }
}
