//! Request handlers

pub mod health;
pub mod linkage;
pub mod transfer;
