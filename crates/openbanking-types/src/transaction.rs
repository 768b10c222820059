//! Domain-shaped transfer requests and results
//!
//! These never touch the remote wire format directly; the core translates
//! them into gateway payloads. Amounts are whole KRW. Access tokens are
//! accepted on input and never serialized back out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{AccessToken, MemberId};

// ============================================================================
// Requests
// ============================================================================

/// Credit a member's linked account (money flows out of the platform)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRequest {
    pub member_id: MemberId,
    #[serde(skip_serializing)]
    pub access_token: AccessToken,
    /// Destination account (fintech use number at the remote bank)
    pub to_account_number: String,
    pub amount: u64,
    /// Text printed on the recipient's statement
    #[serde(default)]
    pub print_content: Option<String>,
}

/// Debit a member's linked account (money flows into the platform)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawRequest {
    pub member_id: MemberId,
    #[serde(skip_serializing)]
    pub access_token: AccessToken,
    /// Account being debited (fintech use number at the remote bank)
    pub from_account_number: String,
    pub amount: u64,
    #[serde(default)]
    pub print_content: Option<String>,
}

/// Verify the holder of a receiving account before a transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryReceiveRequest {
    pub member_id: MemberId,
    #[serde(skip_serializing)]
    pub access_token: AccessToken,
    /// Standard bank code of the receiving bank
    pub bank_code: String,
    pub account_number: String,
    pub amount: u64,
    #[serde(default)]
    pub print_content: Option<String>,
}

// ============================================================================
// Results
// ============================================================================

/// Outcome of a deposit or withdrawal as seen by the local domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub member_id: MemberId,
    /// Destination account for deposits, debited account for withdrawals
    pub account_number: String,
    /// Remote transaction id
    pub api_tran_id: String,
    /// Transaction id issued by this platform and echoed by the remote bank
    pub bank_tran_id: String,
    /// Remote response code, passed through uninterpreted
    pub rsp_code: String,
    pub rsp_message: String,
    pub amount: u64,
    pub completed_at: DateTime<Utc>,
}

/// Remote view of the receiving account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveSummary {
    pub api_tran_id: String,
    pub bank_tran_id: String,
    pub rsp_code: String,
    pub rsp_message: String,
    pub bank_name: Option<String>,
    pub account_holder_name: Option<String>,
}

/// Receive inquiry joined with the request that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InquiryReceiveResult {
    pub member_id: MemberId,
    pub receive: ReceiveSummary,
    pub request: InquiryReceiveRequest,
    pub completed_at: DateTime<Utc>,
}
