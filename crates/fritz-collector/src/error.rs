//! Per-device fetch errors.

use std::time::Duration;

use thiserror::Error;

use fritz_tr064::RpcError;

use crate::fetcher::FieldKey;

/// Why a device contributed no samples to a scrape.
#[derive(Debug, Error)]
pub enum DeviceFetchError {
    #[error("{key} call failed: {source}")]
    Rpc {
        key: FieldKey,
        #[source]
        source: RpcError,
    },

    #[error("{key} response lacks field {field}")]
    MissingField { key: FieldKey, field: &'static str },

    #[error("{key} field {field} has unexpected value {value}")]
    InvalidField {
        key: FieldKey,
        field: &'static str,
        value: String,
    },

    #[error("no {0} response in field set")]
    Incomplete(FieldKey),

    #[error("device did not answer within {0:?}")]
    Timeout(Duration),

    #[error("fetch task failed: {0}")]
    Join(String),
}
