//! Device registry — one long-lived session per configured device.

use std::sync::Arc;

use tracing::{info, warn};

use fritz_core::DeviceDescriptor;
use fritz_tr064::{ActionCaller, Connector};

/// An established session bound to one device.
#[derive(Clone, Debug)]
pub struct DeviceSession {
    descriptor: DeviceDescriptor,
    caller: Arc<dyn ActionCaller>,
}

impl DeviceSession {
    pub fn new(descriptor: DeviceDescriptor, caller: Arc<dyn ActionCaller>) -> Self {
        Self { descriptor, caller }
    }

    pub fn host(&self) -> &str {
        &self.descriptor.host
    }

    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    pub fn caller(&self) -> &dyn ActionCaller {
        self.caller.as_ref()
    }
}

/// The sessions a scrape fans out to, in configuration order.
///
/// Sessions are never re-established; a device that was unreachable at
/// startup stays absent until the process restarts.
#[derive(Clone, Debug, Default)]
pub struct DeviceRegistry {
    sessions: Vec<DeviceSession>,
}

impl DeviceRegistry {
    pub fn new(sessions: Vec<DeviceSession>) -> Self {
        Self { sessions }
    }

    /// Connect to every device. A device that fails to connect is logged
    /// and left out; the others are still connected.
    pub async fn connect(devices: &[DeviceDescriptor], connector: &dyn Connector) -> Self {
        let mut sessions = Vec::with_capacity(devices.len());

        for device in devices {
            match connector.connect(device).await {
                Ok(caller) => {
                    info!(host = %device.host, "device connected");
                    sessions.push(DeviceSession::new(device.clone(), caller));
                }
                Err(e) => {
                    warn!(host = %device.host, error = %e, "device connection failed, skipping");
                }
            }
        }

        Self { sessions }
    }

    pub fn sessions(&self) -> &[DeviceSession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fritz_tr064::fake::{FakeCaller, FakeConnector};

    #[tokio::test]
    async fn connect_isolates_failing_devices() {
        let connector = FakeConnector::new()
            .with_device("box-a", Arc::new(FakeCaller::new()))
            .with_device("box-c", Arc::new(FakeCaller::new()));
        let devices = vec![
            DeviceDescriptor::new("box-a", "u", "p"),
            DeviceDescriptor::new("box-b", "u", "p"),
            DeviceDescriptor::new("box-c", "u", "p"),
        ];

        let registry = DeviceRegistry::connect(&devices, &connector).await;

        let hosts: Vec<_> = registry.sessions().iter().map(|s| s.host()).collect();
        assert_eq!(hosts, vec!["box-a", "box-c"]);
    }

    #[tokio::test]
    async fn connect_with_no_devices() {
        let registry = DeviceRegistry::connect(&[], &FakeConnector::new()).await;
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }
}
