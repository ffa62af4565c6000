//! Errors raised by remote action calls.

use thiserror::Error;

/// Result type alias for remote action calls.
pub type RpcResult<T> = Result<T, RpcError>;

/// Transport or protocol failure talking to a device.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("connection to {host} failed: {reason}")]
    Connect { host: String, reason: String },

    #[error("http error: {0}")]
    Http(String),

    #[error("unexpected http status {0}")]
    Status(u16),

    #[error("soap fault {code}: {description}")]
    Fault { code: u32, description: String },

    #[error("service not offered by device: {0}")]
    UnknownService(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("request timed out")]
    Timeout,
}
