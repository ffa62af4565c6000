//! The remote action seam.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use fritz_core::DeviceDescriptor;

use crate::error::RpcResult;
use crate::value::FieldMap;

/// Boxed future returned by [`ActionCaller::call_action`].
pub type ActionFuture<'a> = Pin<Box<dyn Future<Output = RpcResult<FieldMap>> + Send + 'a>>;

/// Boxed future returned by [`Connector::connect`].
pub type ConnectFuture<'a> =
    Pin<Box<dyn Future<Output = RpcResult<Arc<dyn ActionCaller>>> + Send + 'a>>;

/// An established session with one device.
///
/// `service` uses the short forms common in TR-064 tooling
/// (`DeviceInfo:1`, `WANCommonIFC1`, `WANCommonInterfaceConfig`).
pub trait ActionCaller: Send + Sync + fmt::Debug {
    /// Invoke `action` on `service` with `(name, value)` arguments.
    fn call_action<'a>(
        &'a self,
        service: &'a str,
        action: &'a str,
        arguments: &'a [(&'a str, &'a str)],
    ) -> ActionFuture<'a>;
}

/// Establishes sessions; injected so the collector can run against fakes.
pub trait Connector: Send + Sync {
    fn connect<'a>(&'a self, device: &'a DeviceDescriptor) -> ConnectFuture<'a>;
}
