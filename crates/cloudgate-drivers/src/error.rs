//! Driver error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Unknown backend profile: {0} (available: paci, vcloud, mock)")]
    UnknownProfile(String),

    #[error("Gateway error: {0}")]
    Gateway(#[from] cloudgate_core::GatewayError),
}

pub type Result<T> = std::result::Result<T, DriverError>;
