//! Open Banking Types - shared vocabulary for the linkage handshake and transfers
//!
//! This crate has zero dependencies on other openbanking crates. It defines:
//!
//! - Identity types (`MemberId`) and the redacted `AccessToken`
//! - The persisted `LinkageRecord` and its derived `LinkageStatus`
//! - Domain-shaped deposit / withdrawal / receive-inquiry requests and results
//!
//! # Linkage Flow
//!
//! ```text
//! begin_linkage(state)        callback(state, code)         token exchange
//!   Pending ───────────────────▶ CodeBound ───────────────────▶ TokenBound
//!      ▲  state reissued            │ exchange failed: stays CodeBound
//!      └────────────────────────────┘
//! ```

pub mod identity;
pub mod linkage;
pub mod transaction;

pub use identity::*;
pub use linkage::*;
pub use transaction::*;
