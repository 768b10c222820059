//! Request and response bodies that are not domain types

use serde::{Deserialize, Serialize};

use openbanking_core::AuthToken;
use openbanking_types::{
    AccessToken, DepositRequest, InquiryReceiveRequest, LinkageRecord, LinkageStatus, MemberId,
    WithdrawRequest,
};

/// `POST /linkages`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeginLinkageRequest {
    pub member_id: MemberId,
    pub state: String,
}

/// Linkage as seen by clients; never carries the access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkageResponse {
    pub member_id: MemberId,
    pub state: String,
    pub status: LinkageStatus,
}

impl From<LinkageRecord> for LinkageResponse {
    fn from(record: LinkageRecord) -> Self {
        Self {
            member_id: record.member_id,
            status: record.status(),
            state: record.state,
        }
    }
}

/// Redirect callback query
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub state: String,
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackResponse {
    pub member_id: MemberId,
    pub status: LinkageStatus,
    pub user_seq_no: String,
    /// False when this callback repeated an already completed linkage
    pub newly_issued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl From<AuthToken> for CallbackResponse {
    fn from(token: AuthToken) -> Self {
        Self {
            member_id: token.member_id,
            status: LinkageStatus::TokenBound,
            user_seq_no: token.user_seq_no,
            newly_issued: token.newly_issued,
            expires_in: token.expires_in,
            scope: token.scope,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoQuery {
    pub user_seq_no: String,
}

// =============================================================================
// Transfer bodies
// =============================================================================
//
// The remote access token travels in `Authorization: Bearer`, never in a body.

/// `POST /deposit`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositBody {
    pub member_id: MemberId,
    pub to_account_number: String,
    pub amount: u64,
    #[serde(default)]
    pub print_content: Option<String>,
}

impl DepositBody {
    pub fn into_request(self, access_token: AccessToken) -> DepositRequest {
        DepositRequest {
            member_id: self.member_id,
            access_token,
            to_account_number: self.to_account_number,
            amount: self.amount,
            print_content: self.print_content,
        }
    }
}

/// `POST /withdraw`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WithdrawBody {
    pub member_id: MemberId,
    pub from_account_number: String,
    pub amount: u64,
    #[serde(default)]
    pub print_content: Option<String>,
}

impl WithdrawBody {
    pub fn into_request(self, access_token: AccessToken) -> WithdrawRequest {
        WithdrawRequest {
            member_id: self.member_id,
            access_token,
            from_account_number: self.from_account_number,
            amount: self.amount,
            print_content: self.print_content,
        }
    }
}

/// `POST /inquiry-receive`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InquiryReceiveBody {
    pub member_id: MemberId,
    pub bank_code: String,
    pub account_number: String,
    pub amount: u64,
    #[serde(default)]
    pub print_content: Option<String>,
}

impl InquiryReceiveBody {
    pub fn into_request(self, access_token: AccessToken) -> InquiryReceiveRequest {
        InquiryReceiveRequest {
            member_id: self.member_id,
            access_token,
            bank_code: self.bank_code,
            account_number: self.account_number,
            amount: self.amount,
            print_content: self.print_content,
        }
    }
}
