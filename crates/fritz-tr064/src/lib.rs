//! fritz-tr064 — remote action access to FRITZ!Box routers.
//!
//! The collector only ever sees the [`ActionCaller`] trait: "call a named
//! action on a service, get back a map of named fields". Two
//! implementations live here:
//!
//! - [`soap::SoapConnector`] / [`soap::SoapSession`]: a thin SOAP-over-HTTP
//!   adapter for the TR-064 endpoint (port 49000).
//! - [`fake::FakeConnector`] / [`fake::FakeCaller`]: scripted responses for
//!   tests and local runs.
//!
//! # Architecture
//!
//! ```text
//! Connector::connect(DeviceDescriptor) → Arc<dyn ActionCaller>
//! ActionCaller::call_action(service, action, args) → FieldMap
//! ```

pub mod caller;
pub mod error;
pub mod fake;
pub mod soap;
pub mod value;

pub use caller::{ActionCaller, ActionFuture, ConnectFuture, Connector};
pub use error::{RpcError, RpcResult};
pub use value::{FieldMap, FieldValue};
