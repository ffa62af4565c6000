//! Field fetcher — the fixed sequence of remote actions per device.

use std::collections::BTreeMap;
use std::fmt;

use tracing::trace;

use fritz_tr064::{ActionCaller, FieldMap};

use crate::error::DeviceFetchError;

/// One query in the per-device fetch sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKey {
    DeviceInfo,
    UpdateInfo,
    LanStatus,
    LanStatistics,
    DslInfo,
    OnlineMonitor,
    PppStatus,
    WanByteCounters,
    WanPacketCounters,
    DslErrorCounters,
}

/// A single remote action with its fixed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionCall {
    pub service: &'static str,
    pub action: &'static str,
    pub arguments: &'static [(&'static str, &'static str)],
}

const fn call(service: &'static str, action: &'static str) -> ActionCall {
    ActionCall {
        service,
        action,
        arguments: &[],
    }
}

const DEVICE_INFO: &[ActionCall] = &[call("DeviceInfo:1", "GetInfo")];
const UPDATE_INFO: &[ActionCall] = &[call("UserInterface:1", "GetInfo")];
const LAN_STATUS: &[ActionCall] = &[call("LANEthernetInterfaceConfig:1", "GetInfo")];
const LAN_STATISTICS: &[ActionCall] = &[call("LANEthernetInterfaceConfig:1", "GetStatistics")];
const DSL_INFO: &[ActionCall] = &[call("WANDSLInterfaceConfig:1", "GetInfo")];
const ONLINE_MONITOR: &[ActionCall] = &[ActionCall {
    service: "WANCommonInterfaceConfig",
    action: "X_AVM-DE_GetOnlineMonitor",
    arguments: &[("NewSyncGroupIndex", "0")],
}];
const PPP_STATUS: &[ActionCall] = &[call("WANPPPConnection:1", "GetStatusInfo")];
const WAN_BYTES: &[ActionCall] = &[call("WANCommonIFC1", "GetAddonInfos")];
const WAN_PACKETS: &[ActionCall] = &[
    call("WANCommonInterfaceConfig:1", "GetTotalPacketsReceived"),
    call("WANCommonInterfaceConfig:1", "GetTotalPacketsSent"),
];
const DSL_ERRORS: &[ActionCall] = &[call("WANDSLInterfaceConfig1", "X_AVM-DE_GetDSLInfo")];

impl FieldKey {
    /// Every key, in fetch order.
    pub const ALL: [FieldKey; 10] = [
        FieldKey::DeviceInfo,
        FieldKey::UpdateInfo,
        FieldKey::LanStatus,
        FieldKey::LanStatistics,
        FieldKey::DslInfo,
        FieldKey::OnlineMonitor,
        FieldKey::PppStatus,
        FieldKey::WanByteCounters,
        FieldKey::WanPacketCounters,
        FieldKey::DslErrorCounters,
    ];

    /// The remote actions answering this key. Only the WAN packet
    /// counters need two calls; their fields are merged.
    pub fn calls(self) -> &'static [ActionCall] {
        match self {
            FieldKey::DeviceInfo => DEVICE_INFO,
            FieldKey::UpdateInfo => UPDATE_INFO,
            FieldKey::LanStatus => LAN_STATUS,
            FieldKey::LanStatistics => LAN_STATISTICS,
            FieldKey::DslInfo => DSL_INFO,
            FieldKey::OnlineMonitor => ONLINE_MONITOR,
            FieldKey::PppStatus => PPP_STATUS,
            FieldKey::WanByteCounters => WAN_BYTES,
            FieldKey::WanPacketCounters => WAN_PACKETS,
            FieldKey::DslErrorCounters => DSL_ERRORS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::DeviceInfo => "device-info",
            FieldKey::UpdateInfo => "update-info",
            FieldKey::LanStatus => "lan-status",
            FieldKey::LanStatistics => "lan-statistics",
            FieldKey::DslInfo => "dsl-info",
            FieldKey::OnlineMonitor => "online-monitor",
            FieldKey::PppStatus => "ppp-status",
            FieldKey::WanByteCounters => "wan-byte-counters",
            FieldKey::WanPacketCounters => "wan-packet-counters",
            FieldKey::DslErrorCounters => "dsl-error-counters",
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw response fields of one device, keyed by query.
pub type FieldSet = BTreeMap<FieldKey, FieldMap>;

/// Run the full action sequence against one session.
///
/// Stops at the first failing call: a device yields all of its fields
/// or an error, never a partial set.
pub async fn fetch(session: &dyn ActionCaller) -> Result<FieldSet, DeviceFetchError> {
    let mut fields = FieldSet::new();

    for key in FieldKey::ALL {
        let mut merged = FieldMap::new();
        for call in key.calls() {
            trace!(service = call.service, action = call.action, "calling action");
            let response = session
                .call_action(call.service, call.action, call.arguments)
                .await
                .map_err(|source| DeviceFetchError::Rpc { key, source })?;
            merged.extend(response);
        }
        fields.insert(key, merged);
    }

    Ok(fields)
}
