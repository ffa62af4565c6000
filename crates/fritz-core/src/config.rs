//! Device configuration loader.
//!
//! ```json
//! [
//!   {"host": "192.168.178.1", "username": "monitor", "password": "secret"}
//! ]
//! ```

use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{DEFAULT_HOST, DeviceDescriptor};

pub const ENV_USER: &str = "FRITZ_USER";
pub const ENV_PASS: &str = "FRITZ_PASS";
pub const ENV_HOST: &str = "FRITZ_HOST";

/// Load all configured devices: file entries in file order, then the
/// environment-derived device (if any).
///
/// A missing file is not an error. `env` looks up an environment variable;
/// pass `|k| std::env::var(k).ok()` in production.
pub fn load<F>(config_path: &Path, env: F) -> ConfigResult<Vec<DeviceDescriptor>>
where
    F: Fn(&str) -> Option<String>,
{
    let mut devices = load_file(config_path)?;
    if let Some(device) = load_from_env(env) {
        devices.push(device);
    }
    debug!(count = devices.len(), "device configuration loaded");
    Ok(devices)
}

/// Build the environment-configured device. Requires both user and
/// password; the host falls back to `fritz.box`.
pub fn load_from_env<F>(env: F) -> Option<DeviceDescriptor>
where
    F: Fn(&str) -> Option<String>,
{
    let username = env(ENV_USER)?;
    let password = env(ENV_PASS)?;
    let host = env(ENV_HOST).unwrap_or_else(|| DEFAULT_HOST.to_string());
    Some(DeviceDescriptor {
        host,
        username,
        password,
    })
}

fn load_file(path: &Path) -> ConfigResult<Vec<DeviceDescriptor>> {
    if !path.exists() {
        debug!(path = %path.display(), "no device configuration file");
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parse_err = |source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let document: serde_json::Value = serde_json::from_str(&content).map_err(parse_err)?;
    if !document.is_array() {
        return Err(ConfigError::NotAList(path.to_path_buf()));
    }
    serde_json::from_value(document).map_err(parse_err)
}
