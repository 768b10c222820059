//! Open banking configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use openbanking_client::TokenExchange;

use crate::error::{OpenBankingError, OpenBankingResult};

/// Which service implementation a deployment runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceProfile {
    /// Talk to the remote open banking API
    #[default]
    External,
    /// Every operation fails with `FeatureDisabled`
    Disabled,
}

impl ServiceProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::External => "external",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for ServiceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceProfile {
    type Err = OpenBankingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "external" => Ok(Self::External),
            "disabled" => Ok(Self::Disabled),
            other => Err(OpenBankingError::Config(format!("unknown service profile: {}", other))),
        }
    }
}

/// OAuth client registration, fixed per deployment
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub grant_type: String,
}

impl Default for ClientCredentials {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(), // Must be set for the external profile
            redirect_uri: String::new(),
            grant_type: "authorization_code".to_string(),
        }
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("redirect_uri", &self.redirect_uri)
            .field("grant_type", &self.grant_type)
            .finish()
    }
}

impl ClientCredentials {
    /// Token request for an authorization code
    pub fn token_exchange(&self, code: &str) -> TokenExchange {
        TokenExchange {
            code: code.to_string(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            redirect_uri: self.redirect_uri.clone(),
            grant_type: self.grant_type.clone(),
        }
    }
}

/// Longest accepted exchange lease (one day)
pub const MAX_EXCHANGE_LEASE_SECS: u64 = 86_400;

/// Core open banking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenBankingConfig {
    pub profile: ServiceProfile,
    pub client: ClientCredentials,
    /// Contract account injected into every transfer and receive inquiry
    pub settlement_account: String,
    /// Institution code prefixing generated bank transaction ids
    pub institution_code: String,
    /// How long a claimed token exchange blocks other callbacks
    pub exchange_lease_secs: u64,
}

impl Default for OpenBankingConfig {
    fn default() -> Self {
        Self {
            profile: ServiceProfile::External,
            client: ClientCredentials::default(),
            settlement_account: String::new(),
            institution_code: String::new(),
            exchange_lease_secs: 60,
        }
    }
}

impl OpenBankingConfig {
    pub fn exchange_lease(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.exchange_lease_secs.min(MAX_EXCHANGE_LEASE_SECS) as i64)
    }

    /// Reject configurations the external profile cannot run with.
    ///
    /// The disabled profile never calls out, so only the profile is checked.
    pub fn validate(&self) -> OpenBankingResult<()> {
        if self.profile == ServiceProfile::Disabled {
            return Ok(());
        }

        let required = [
            ("client.client_id", &self.client.client_id),
            ("client.client_secret", &self.client.client_secret),
            ("client.redirect_uri", &self.client.redirect_uri),
            ("client.grant_type", &self.client.grant_type),
            ("settlement_account", &self.settlement_account),
            ("institution_code", &self.institution_code),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(OpenBankingError::Config(format!("{} must be set", name)));
            }
        }

        if !self.institution_code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(OpenBankingError::Config(
                "institution_code must be alphanumeric".to_string(),
            ));
        }

        if self.exchange_lease_secs == 0 || self.exchange_lease_secs > MAX_EXCHANGE_LEASE_SECS {
            return Err(OpenBankingError::Config(format!(
                "exchange_lease_secs must be between 1 and {}",
                MAX_EXCHANGE_LEASE_SECS
            )));
        }

        Ok(())
    }
}
