//! fritz-core — device descriptors and configuration loading.
//!
//! Devices come from two places: a JSON file listing
//! `{host, username, password}` objects, and an optional single device
//! described by the `FRITZ_USER` / `FRITZ_PASS` / `FRITZ_HOST` environment
//! variables. File entries come first, the environment entry last.

pub mod config;
pub mod error;
pub mod types;

pub use config::{load, load_from_env};
pub use error::{ConfigError, ConfigResult};
pub use types::DeviceDescriptor;
