//! Typed per-action response schemas.
//!
//! Raw field maps are validated here, once, and normalised into plain
//! values: flags and statuses become booleans, tenths of a decibel become
//! decibels, comma-separated rate histories collapse to their newest
//! element.

use fritz_tr064::{FieldMap, FieldValue};

use crate::error::DeviceFetchError;
use crate::fetcher::{FieldKey, FieldSet};

/// Substituted when the device reports no pending software version.
pub const NO_VERSION: &str = "n/a";

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub model_name: String,
    pub software_version: String,
    pub serial: String,
    pub uptime: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInfo {
    pub available: bool,
    pub new_version: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanStatus {
    pub enabled: bool,
    pub up: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LanStatistics {
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub packets_received: u64,
    pub packets_sent: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DslInfo {
    pub enabled: bool,
    pub up: bool,
    pub upstream_curr_rate: u64,
    pub downstream_curr_rate: u64,
    pub upstream_max_rate: u64,
    pub downstream_max_rate: u64,
    pub upstream_noise_margin_db: f64,
    pub downstream_noise_margin_db: f64,
    pub upstream_attenuation_db: f64,
    pub downstream_attenuation_db: f64,
}

/// Online-monitor bitrates in bps.
#[derive(Debug, Clone, PartialEq)]
pub struct OnlineMonitor {
    pub upstream_max: u64,
    pub downstream_max: u64,
    pub upstream_current: u64,
    pub downstream_current: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PppStatus {
    pub connected: bool,
    pub uptime: u64,
    pub last_error: String,
}

/// A received/sent counter pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Traffic {
    pub received: u64,
    pub sent: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DslErrors {
    pub crc_errors: u64,
    pub fec_errors: u64,
    pub upstream_power: i64,
    pub downstream_power: i64,
}

/// Everything one device reported in one query pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReadings {
    pub info: DeviceInfo,
    pub update: UpdateInfo,
    pub lan: LanStatus,
    pub lan_stats: LanStatistics,
    pub dsl: DslInfo,
    pub online: OnlineMonitor,
    pub ppp: PppStatus,
    pub wan_bytes: Traffic,
    pub wan_packets: Traffic,
    pub dsl_errors: DslErrors,
}

impl DeviceReadings {
    /// Validate a fetched field set against the per-action schemas.
    pub fn from_field_set(set: &FieldSet) -> Result<Self, DeviceFetchError> {
        let info = Fields::of(set, FieldKey::DeviceInfo)?;
        let update = Fields::of(set, FieldKey::UpdateInfo)?;
        let lan = Fields::of(set, FieldKey::LanStatus)?;
        let lan_stats = Fields::of(set, FieldKey::LanStatistics)?;
        let dsl = Fields::of(set, FieldKey::DslInfo)?;
        let online = Fields::of(set, FieldKey::OnlineMonitor)?;
        let ppp = Fields::of(set, FieldKey::PppStatus)?;
        let wan_bytes = Fields::of(set, FieldKey::WanByteCounters)?;
        let wan_packets = Fields::of(set, FieldKey::WanPacketCounters)?;
        let dsl_errors = Fields::of(set, FieldKey::DslErrorCounters)?;

        Ok(Self {
            info: DeviceInfo {
                model_name: info.text("NewModelName")?,
                software_version: info.text("NewSoftwareVersion")?,
                serial: info.text("NewSerialNumber")?,
                uptime: info.unsigned("NewUpTime")?,
            },
            update: UpdateInfo {
                available: update.flag("NewUpgradeAvailable")?,
                new_version: update
                    .optional_text("NewX_AVM-DE_Version")
                    .unwrap_or_else(|| NO_VERSION.to_string()),
            },
            lan: LanStatus {
                enabled: lan.flag("NewEnable")?,
                up: lan.status("NewStatus", "Up")?,
            },
            lan_stats: LanStatistics {
                bytes_received: lan_stats.unsigned("NewBytesReceived")?,
                bytes_sent: lan_stats.unsigned("NewBytesSent")?,
                packets_received: lan_stats.unsigned("NewPacketsReceived")?,
                packets_sent: lan_stats.unsigned("NewPacketsSent")?,
            },
            dsl: DslInfo {
                enabled: dsl.flag("NewEnable")?,
                up: dsl.status("NewStatus", "Up")?,
                upstream_curr_rate: dsl.unsigned("NewUpstreamCurrRate")?,
                downstream_curr_rate: dsl.unsigned("NewDownstreamCurrRate")?,
                upstream_max_rate: dsl.unsigned("NewUpstreamMaxRate")?,
                downstream_max_rate: dsl.unsigned("NewDownstreamMaxRate")?,
                upstream_noise_margin_db: dsl.tenths("NewUpstreamNoiseMargin")?,
                downstream_noise_margin_db: dsl.tenths("NewDownstreamNoiseMargin")?,
                upstream_attenuation_db: dsl.tenths("NewUpstreamAttenuation")?,
                downstream_attenuation_db: dsl.tenths("NewDownstreamAttenuation")?,
            },
            online: OnlineMonitor {
                upstream_max: online.unsigned("Newmax_us")?,
                downstream_max: online.unsigned("Newmax_ds")?,
                upstream_current: online.leading_rate("Newus_current_bps")?,
                downstream_current: online.leading_rate("Newds_current_bps")?,
            },
            ppp: PppStatus {
                connected: ppp.status("NewConnectionStatus", "Connected")?,
                uptime: ppp.unsigned("NewUptime")?,
                last_error: ppp.text_or_empty("NewLastConnectionError")?,
            },
            wan_bytes: Traffic {
                received: wan_bytes.unsigned("NewX_AVM_DE_TotalBytesReceived64")?,
                sent: wan_bytes.unsigned("NewX_AVM_DE_TotalBytesSent64")?,
            },
            wan_packets: Traffic {
                received: wan_packets.unsigned("NewTotalPacketsReceived")?,
                sent: wan_packets.unsigned("NewTotalPacketsSent")?,
            },
            dsl_errors: DslErrors {
                crc_errors: dsl_errors.unsigned("NewCRCErrors")?,
                fec_errors: dsl_errors.unsigned("NewFECErrors")?,
                upstream_power: dsl_errors.signed("NewUpstreamPower")?,
                downstream_power: dsl_errors.signed("NewDownstreamPower")?,
            },
        })
    }
}

/// Typed view over one key's field map.
struct Fields<'a> {
    key: FieldKey,
    map: &'a FieldMap,
}

impl<'a> Fields<'a> {
    fn of(set: &'a FieldSet, key: FieldKey) -> Result<Self, DeviceFetchError> {
        let map = set.get(&key).ok_or(DeviceFetchError::Incomplete(key))?;
        Ok(Self { key, map })
    }

    fn get(&self, field: &'static str) -> Result<&'a FieldValue, DeviceFetchError> {
        self.map.get(field).ok_or(DeviceFetchError::MissingField {
            key: self.key,
            field,
        })
    }

    fn invalid(&self, field: &'static str, value: &FieldValue) -> DeviceFetchError {
        DeviceFetchError::InvalidField {
            key: self.key,
            field,
            value: value.to_string(),
        }
    }

    fn text(&self, field: &'static str) -> Result<String, DeviceFetchError> {
        match self.get(field)? {
            FieldValue::Text(s) => Ok(s.clone()),
            FieldValue::Integer(n) => Ok(n.to_string()),
            FieldValue::Null => Err(DeviceFetchError::MissingField {
                key: self.key,
                field,
            }),
            other => Err(self.invalid(field, other)),
        }
    }

    /// Like [`Fields::text`], but an empty element reads as `""`.
    fn text_or_empty(&self, field: &'static str) -> Result<String, DeviceFetchError> {
        match self.get(field)? {
            FieldValue::Null => Ok(String::new()),
            _ => self.text(field),
        }
    }

    /// Absent and null both read as `None`.
    fn optional_text(&self, field: &'static str) -> Option<String> {
        match self.map.get(field)? {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Integer(n) => Some(n.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Null => None,
        }
    }

    fn unsigned(&self, field: &'static str) -> Result<u64, DeviceFetchError> {
        let value = self.get(field)?;
        match value {
            FieldValue::Integer(n) => u64::try_from(*n).map_err(|_| self.invalid(field, value)),
            FieldValue::Text(s) => s.trim().parse().map_err(|_| self.invalid(field, value)),
            _ => Err(self.invalid(field, value)),
        }
    }

    fn signed(&self, field: &'static str) -> Result<i64, DeviceFetchError> {
        let value = self.get(field)?;
        match value {
            FieldValue::Integer(n) => Ok(*n),
            FieldValue::Text(s) => s.trim().parse().map_err(|_| self.invalid(field, value)),
            _ => Err(self.invalid(field, value)),
        }
    }

    /// `"1"` is true; any other value is false.
    fn flag(&self, field: &'static str) -> Result<bool, DeviceFetchError> {
        Ok(match self.get(field)? {
            FieldValue::Text(s) => s == "1",
            FieldValue::Integer(n) => *n == 1,
            FieldValue::Bool(b) => *b,
            FieldValue::Null => false,
        })
    }

    /// Exact match against the one "healthy" literal.
    fn status(&self, field: &'static str, expected: &str) -> Result<bool, DeviceFetchError> {
        Ok(self.get(field)?.as_text() == Some(expected))
    }

    /// A value reported in tenths of a decibel, in decibels.
    fn tenths(&self, field: &'static str) -> Result<f64, DeviceFetchError> {
        Ok(self.signed(field)? as f64 / 10.0)
    }

    /// First element of a comma-separated rate history (newest sample).
    fn leading_rate(&self, field: &'static str) -> Result<u64, DeviceFetchError> {
        let value = self.get(field)?;
        match value {
            FieldValue::Integer(n) => u64::try_from(*n).map_err(|_| self.invalid(field, value)),
            FieldValue::Text(s) => s
                .split(',')
                .next()
                .unwrap_or_default()
                .trim()
                .parse()
                .map_err(|_| self.invalid(field, value)),
            _ => Err(self.invalid(field, value)),
        }
    }
}
