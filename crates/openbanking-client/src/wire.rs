//! Remote wire contract
//!
//! Field names follow the remote API exactly. Response fields the core does
//! not rely on default to empty so a sparse answer still decodes.

use serde::{Deserialize, Serialize};

// ============================================================================
// OAuth
// ============================================================================

/// Form body of `POST /oauth/2.0/token`
#[derive(Clone, Serialize)]
pub struct TokenExchange {
    pub code: String,
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub grant_type: String,
}

impl std::fmt::Debug for TokenExchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchange")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("grant_type", &self.grant_type)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    pub user_seq_no: String,
}

impl std::fmt::Debug for AuthTokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokenResponse")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .field("user_seq_no", &self.user_seq_no)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// User info
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserMeResponse {
    pub api_tran_id: String,
    pub api_tran_dtm: String,
    pub rsp_code: String,
    pub rsp_message: String,
    pub user_seq_no: String,
    pub user_name: String,
    pub res_cnt: String,
    pub res_list: Vec<UserAccount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserAccount {
    pub fintech_use_num: String,
    pub account_alias: String,
    pub bank_code_std: String,
    pub bank_name: String,
    pub account_num_masked: String,
    pub account_holder_name: String,
}

// ============================================================================
// Deposit
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositPayload {
    pub cntr_account_type: String,
    pub cntr_account_num: String,
    pub wd_pass_phrase: String,
    pub wd_print_content: String,
    pub name_check_option: String,
    pub tran_dtime: String,
    pub req_cnt: String,
    pub req_list: Vec<DepositItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositItem {
    pub tran_no: String,
    pub bank_tran_id: String,
    pub fintech_use_num: String,
    pub print_content: String,
    pub tran_amt: String,
    pub req_client_name: String,
    pub req_client_num: String,
    pub transfer_purpose: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositResponse {
    pub api_tran_id: String,
    pub api_tran_dtm: String,
    pub rsp_code: String,
    pub rsp_message: String,
    pub res_cnt: String,
    pub res_list: Vec<DepositOutcome>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositOutcome {
    pub tran_no: String,
    pub bank_tran_id: String,
    pub bank_rsp_code: String,
    pub bank_rsp_message: String,
    pub account_holder_name: String,
    pub tran_amt: String,
}

// ============================================================================
// Withdraw
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawPayload {
    pub bank_tran_id: String,
    pub cntr_account_type: String,
    pub cntr_account_num: String,
    pub dps_print_content: String,
    pub fintech_use_num: String,
    pub wd_print_content: String,
    pub tran_amt: String,
    pub tran_dtime: String,
    pub req_client_name: String,
    pub req_client_fintech_use_num: String,
    pub req_client_num: String,
    pub transfer_purpose: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WithdrawResponse {
    pub api_tran_id: String,
    pub api_tran_dtm: String,
    pub rsp_code: String,
    pub rsp_message: String,
    pub bank_tran_id: String,
    pub bank_name: String,
    pub account_holder_name: String,
    pub tran_amt: String,
}

// ============================================================================
// Receive inquiry
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivePayload {
    pub bank_tran_id: String,
    pub cntr_account_type: String,
    pub cntr_account_num: String,
    pub bank_code_std: String,
    pub account_num: String,
    pub print_content: String,
    pub tran_amt: String,
    pub req_client_name: String,
    pub req_client_num: String,
    pub transfer_purpose: String,
    pub tran_dtime: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiveResponse {
    pub api_tran_id: String,
    pub api_tran_dtm: String,
    pub rsp_code: String,
    pub rsp_message: String,
    pub bank_tran_id: String,
    pub bank_code_std: String,
    pub bank_name: String,
    pub account_holder_name: String,
    pub tran_amt: String,
}
