use std::fmt;

use serde::{Deserialize, Serialize};

/// Host used for the environment-configured device when `FRITZ_HOST` is unset.
pub const DEFAULT_HOST: &str = "fritz.box";

/// Connection details for one router. Immutable once loaded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub host: String,
    pub username: String,
    pub password: String,
}

impl DeviceDescriptor {
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

// Passwords never reach the logs.
impl fmt::Debug for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceDescriptor")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
