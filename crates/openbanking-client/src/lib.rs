//! Open Banking Remote Gateway
//!
//! One outbound call per operation against the remote open banking API:
//!
//! - `POST /oauth/2.0/token` (form) - authorization code exchange
//! - `GET /v2.0/user/me` - user info, bearer authenticated
//! - deposit, withdraw and receive inquiry - JSON, bearer authenticated
//!
//! Business result codes (`rsp_code`) on a 2xx answer are returned as data.
//! Only HTTP, transport and decode failures become [`GatewayError`].

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod wire;

pub use config::GatewayConfig;
pub use error::{GatewayError, GatewayResult};
pub use gateway::RemoteBankingGateway;
pub use http::HttpGateway;
pub use wire::*;
