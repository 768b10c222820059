//! Open Banking Core
//!
//! Binds local payment members to remote open banking identities and relays
//! transfers on their behalf.
//!
//! - [`AuthorizationLinker`] runs the OAuth `state`/`code` handshake. Records
//!   move `Pending → CodeBound → TokenBound`, and each state gets at most one
//!   token exchange.
//! - [`TransactionFacade`] turns deposit, withdraw and receive-inquiry
//!   requests into remote calls and wraps the answers.
//! - [`build_service`] picks the implementation for the configured
//!   [`ServiceProfile`].

pub mod config;
pub mod error;
pub mod facade;
pub mod linker;
pub mod service;

#[cfg(any(test, feature = "mock"))]
pub mod testing;

pub use config::{ClientCredentials, OpenBankingConfig, ServiceProfile, MAX_EXCHANGE_LEASE_SECS};
pub use error::{FailureStage, OpenBankingError, OpenBankingResult};
pub use facade::{TransactionFacade, UserInfo};
pub use linker::{AuthToken, AuthorizationLinker};
pub use service::{
    build_service, DisabledOpenBankingService, ExternalOpenBankingService, OpenBankingService,
};
