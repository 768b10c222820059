//! Gateway configuration

use serde::{Deserialize, Serialize};

/// Where and how to reach the remote open banking API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    pub token_path: String,
    pub user_me_path: String,
    pub deposit_path: String,
    pub withdraw_path: String,
    pub inquiry_receive_path: String,
    /// Whole-request timeout applied by the HTTP client, if any
    pub request_timeout_secs: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: std::env::var("OPENBANKING_API_URL")
                .unwrap_or_else(|_| "https://testapi.openbanking.or.kr".to_string()),
            token_path: "/oauth/2.0/token".to_string(),
            user_me_path: "/v2.0/user/me".to_string(),
            deposit_path: "/v2.0/transfer/deposit/fin_num".to_string(),
            withdraw_path: "/v2.0/transfer/withdraw/fin_num".to_string(),
            inquiry_receive_path: "/v2.0/inquiry/receive".to_string(),
            request_timeout_secs: Some(30),
        }
    }
}

impl GatewayConfig {
    /// Config pointing every endpoint at `base_url` with default paths
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}
