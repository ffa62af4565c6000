//! Scripted devices for tests and local runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use fritz_core::DeviceDescriptor;

use crate::caller::{ActionCaller, ActionFuture, ConnectFuture, Connector};
use crate::error::RpcError;
use crate::value::{FieldMap, FieldValue};

#[derive(Debug, Clone)]
enum Reply {
    Fields(FieldMap),
    Fail(String),
}

/// A device whose action responses are scripted up front.
///
/// Unscripted actions answer with SOAP fault 401 ("Invalid Action"), the
/// way a real device rejects an action it does not offer.
#[derive(Debug, Default)]
pub struct FakeCaller {
    replies: HashMap<(String, String), Reply>,
    delay: Option<Duration>,
    calls: Mutex<Vec<String>>,
}

impl FakeCaller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful response.
    pub fn respond<V>(mut self, service: &str, action: &str, fields: Vec<(&str, V)>) -> Self
    where
        V: Into<FieldValue>,
    {
        let map = fields
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.into()))
            .collect();
        self.replies
            .insert((service.to_string(), action.to_string()), Reply::Fields(map));
        self
    }

    /// Script a transport failure.
    pub fn fail(mut self, service: &str, action: &str, reason: &str) -> Self {
        self.replies.insert(
            (service.to_string(), action.to_string()),
            Reply::Fail(reason.to_string()),
        );
        self
    }

    /// Delay every response, e.g. to exercise timeouts.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Actions invoked so far, as `service/action`.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ActionCaller for FakeCaller {
    fn call_action<'a>(
        &'a self,
        service: &'a str,
        action: &'a str,
        _arguments: &'a [(&'a str, &'a str)],
    ) -> ActionFuture<'a> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(format!("{service}/{action}"));

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            match self.replies.get(&(service.to_string(), action.to_string())) {
                Some(Reply::Fields(map)) => Ok(map.clone()),
                Some(Reply::Fail(reason)) => Err(RpcError::Http(reason.clone())),
                None => Err(RpcError::Fault {
                    code: 401,
                    description: "Invalid Action".to_string(),
                }),
            }
        })
    }
}

/// Hands out [`FakeCaller`]s by host; unknown hosts fail to connect.
#[derive(Default)]
pub struct FakeConnector {
    devices: HashMap<String, Arc<FakeCaller>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(mut self, host: &str, caller: Arc<FakeCaller>) -> Self {
        self.devices.insert(host.to_string(), caller);
        self
    }
}

impl Connector for FakeConnector {
    fn connect<'a>(&'a self, device: &'a DeviceDescriptor) -> ConnectFuture<'a> {
        Box::pin(async move {
            match self.devices.get(&device.host) {
                Some(caller) => {
                    let session: Arc<dyn ActionCaller> = caller.clone();
                    Ok(session)
                }
                None => Err(RpcError::Connect {
                    host: device.host.clone(),
                    reason: "host unreachable".to_string(),
                }),
            }
        })
    }
}
