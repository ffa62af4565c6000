//! Metric assembler — the fixed family catalog.
//!
//! Names, help texts, kinds and label keys are part of the exporter's
//! public surface: existing dashboards query them verbatim, typos
//! (`fritzbox_ppp_conection_state`) included.

use tracing::error;

use fritz_metrics::{FamilyError, MetricFamily, ScrapeSnapshot};

use crate::orchestrator::DeviceOutcome;
use crate::readings::DeviceReadings;

/// Number of families in every snapshot.
pub const FAMILY_COUNT: usize = 22;

const UP: &str = "up";
const DOWN: &str = "down";
const CURR: &str = "curr";
const MAX: &str = "max";

struct Catalog {
    uptime: MetricFamily,
    update: MetricFamily,
    lan_enabled: MetricFamily,
    lan_status: MetricFamily,
    lan_bytes_rx: MetricFamily,
    lan_bytes_tx: MetricFamily,
    lan_packets_rx: MetricFamily,
    lan_packets_tx: MetricFamily,
    dsl_enabled: MetricFamily,
    dsl_status: MetricFamily,
    dsl_datarate: MetricFamily,
    online_monitor: MetricFamily,
    noise_margin: MetricFamily,
    attenuation: MetricFamily,
    ppp_uptime: MetricFamily,
    ppp_connected: MetricFamily,
    wan_bytes: MetricFamily,
    wan_packets: MetricFamily,
    fec_errors: MetricFamily,
    crc_errors: MetricFamily,
    upstream_power: MetricFamily,
    downstream_power: MetricFamily,
}

impl Catalog {
    fn new() -> Self {
        let serial = &["Serial"];
        let by_direction = &["Serial", "Direction"];
        let by_direction_and_type = &["Serial", "Direction", "Type"];

        Self {
            uptime: MetricFamily::counter(
                "fritzbox_uptime",
                "FritzBox uptime, system info in labels",
                &["ModelName", "SoftwareVersion", "Serial"],
            ),
            update: MetricFamily::gauge(
                "fritzbox_update_available",
                "FritzBox update available",
                &["Serial", "NewSoftwareVersion"],
            ),
            lan_enabled: MetricFamily::gauge("fritzbox_lan_status_enabled", "LAN Interface enabled", serial),
            lan_status: MetricFamily::gauge("fritzbox_lan_status", "LAN Interface status", serial),
            lan_bytes_rx: MetricFamily::counter("fritzbox_lan_received_bytes", "LAN bytes received", serial),
            lan_bytes_tx: MetricFamily::counter("fritzbox_lan_transmitted_bytes", "LAN bytes transmitted", serial),
            lan_packets_rx: MetricFamily::counter(
                "fritzbox_lan_received_packets_total",
                "LAN packets received",
                serial,
            ),
            lan_packets_tx: MetricFamily::counter(
                "fritzbox_lan_transmitted_packets_total",
                "LAN packets transmitted",
                serial,
            ),
            dsl_enabled: MetricFamily::gauge("fritzbox_dsl_status_enabled", "DSL enabled", serial),
            dsl_status: MetricFamily::gauge("fritzbox_dsl_status", "DSL status", serial),
            dsl_datarate: MetricFamily::gauge(
                "fritzbox_dsl_datarate_kbps",
                "DSL datarate in kbps",
                by_direction_and_type,
            ),
            online_monitor: MetricFamily::gauge(
                "fritzbox_internet_online_monitor",
                "Online-Monitor stats in bps",
                by_direction_and_type,
            ),
            noise_margin: MetricFamily::gauge("fritzbox_dsl_noise_margin_dB", "Noise Margin in dB", by_direction),
            attenuation: MetricFamily::gauge("fritzbox_dsl_attenuation_dB", "Line attenuation in dB", by_direction),
            ppp_uptime: MetricFamily::gauge("fritzbox_ppp_connection_uptime", "PPP connection uptime", serial),
            ppp_connected: MetricFamily::gauge(
                "fritzbox_ppp_conection_state",
                "PPP connection state",
                &["Serial", "last_error"],
            ),
            wan_bytes: MetricFamily::counter("fritzbox_wan_data_bytes", "WAN data in bytes", by_direction),
            wan_packets: MetricFamily::counter("fritzbox_wan_data_packets", "WAN data in packets", by_direction),
            fec_errors: MetricFamily::gauge("fritzbox_dsl_errors_fec", "FEC errors", serial),
            crc_errors: MetricFamily::gauge("fritzbox_dsl_errors_crc", "CRC Errors", serial),
            upstream_power: MetricFamily::gauge("fritzbox_dsl_power_upstream", "Upstream Power", serial),
            downstream_power: MetricFamily::gauge("fritzbox_dsl_power_downstream", "Downstream Power", serial),
        }
    }

    /// Families in exposition order; must match `into_snapshot`.
    fn families_mut(&mut self) -> [&mut MetricFamily; FAMILY_COUNT] {
        [
            &mut self.uptime,
            &mut self.update,
            &mut self.lan_enabled,
            &mut self.lan_status,
            &mut self.lan_bytes_rx,
            &mut self.lan_bytes_tx,
            &mut self.lan_packets_rx,
            &mut self.lan_packets_tx,
            &mut self.dsl_enabled,
            &mut self.dsl_status,
            &mut self.dsl_datarate,
            &mut self.online_monitor,
            &mut self.noise_margin,
            &mut self.attenuation,
            &mut self.ppp_uptime,
            &mut self.ppp_connected,
            &mut self.wan_bytes,
            &mut self.wan_packets,
            &mut self.fec_errors,
            &mut self.crc_errors,
            &mut self.upstream_power,
            &mut self.downstream_power,
        ]
    }

    fn add_device(&mut self, r: &DeviceReadings) -> Result<(), FamilyError> {
        let serial = r.info.serial.as_str();

        self.uptime.add_sample(
            &[r.info.model_name.as_str(), r.info.software_version.as_str(), serial],
            r.info.uptime,
        )?;
        self.update
            .add_sample(&[serial, r.update.new_version.as_str()], u8::from(r.update.available))?;

        self.lan_enabled.add_sample(&[serial], u8::from(r.lan.enabled))?;
        self.lan_status.add_sample(&[serial], u8::from(r.lan.up))?;
        self.lan_bytes_rx.add_sample(&[serial], r.lan_stats.bytes_received)?;
        self.lan_bytes_tx.add_sample(&[serial], r.lan_stats.bytes_sent)?;
        self.lan_packets_rx.add_sample(&[serial], r.lan_stats.packets_received)?;
        self.lan_packets_tx.add_sample(&[serial], r.lan_stats.packets_sent)?;

        self.dsl_enabled.add_sample(&[serial], u8::from(r.dsl.enabled))?;
        self.dsl_status.add_sample(&[serial], u8::from(r.dsl.up))?;
        self.dsl_datarate.add_sample(&[serial, UP, CURR], r.dsl.upstream_curr_rate)?;
        self.dsl_datarate.add_sample(&[serial, DOWN, CURR], r.dsl.downstream_curr_rate)?;
        self.dsl_datarate.add_sample(&[serial, UP, MAX], r.dsl.upstream_max_rate)?;
        self.dsl_datarate.add_sample(&[serial, DOWN, MAX], r.dsl.downstream_max_rate)?;

        self.online_monitor.add_sample(&[serial, UP, MAX], r.online.upstream_max)?;
        self.online_monitor.add_sample(&[serial, DOWN, MAX], r.online.downstream_max)?;
        self.online_monitor.add_sample(&[serial, UP, CURR], r.online.upstream_current)?;
        self.online_monitor.add_sample(&[serial, DOWN, CURR], r.online.downstream_current)?;

        self.noise_margin.add_sample(&[serial, UP], r.dsl.upstream_noise_margin_db)?;
        self.noise_margin.add_sample(&[serial, DOWN], r.dsl.downstream_noise_margin_db)?;
        self.attenuation.add_sample(&[serial, UP], r.dsl.upstream_attenuation_db)?;
        self.attenuation.add_sample(&[serial, DOWN], r.dsl.downstream_attenuation_db)?;

        self.ppp_uptime.add_sample(&[serial], r.ppp.uptime)?;
        self.ppp_connected
            .add_sample(&[serial, r.ppp.last_error.as_str()], u8::from(r.ppp.connected))?;

        // Upstream is what the device sent.
        self.wan_bytes.add_sample(&[serial, UP], r.wan_bytes.sent)?;
        self.wan_bytes.add_sample(&[serial, DOWN], r.wan_bytes.received)?;
        self.wan_packets.add_sample(&[serial, UP], r.wan_packets.sent)?;
        self.wan_packets.add_sample(&[serial, DOWN], r.wan_packets.received)?;

        self.fec_errors.add_sample(&[serial], r.dsl_errors.fec_errors)?;
        self.crc_errors.add_sample(&[serial], r.dsl_errors.crc_errors)?;
        self.upstream_power.add_sample(&[serial], r.dsl_errors.upstream_power)?;
        self.downstream_power.add_sample(&[serial], r.dsl_errors.downstream_power)?;

        Ok(())
    }

    /// Append another catalog's samples family by family.
    fn absorb(&mut self, mut other: Catalog) {
        for (mine, theirs) in self.families_mut().into_iter().zip(other.families_mut()) {
            mine.samples.append(&mut theirs.samples);
        }
    }

    fn into_snapshot(self) -> ScrapeSnapshot {
        ScrapeSnapshot::new(vec![
            self.uptime,
            self.update,
            self.lan_enabled,
            self.lan_status,
            self.lan_bytes_rx,
            self.lan_bytes_tx,
            self.lan_packets_rx,
            self.lan_packets_tx,
            self.dsl_enabled,
            self.dsl_status,
            self.dsl_datarate,
            self.online_monitor,
            self.noise_margin,
            self.attenuation,
            self.ppp_uptime,
            self.ppp_connected,
            self.wan_bytes,
            self.wan_packets,
            self.fec_errors,
            self.crc_errors,
            self.upstream_power,
            self.downstream_power,
        ])
    }
}

/// The catalog with no samples, as a scrape without devices yields it.
pub fn empty_catalog() -> ScrapeSnapshot {
    Catalog::new().into_snapshot()
}

/// Fold per-device outcomes into one snapshot.
///
/// Failed devices contribute nothing. Each successful device is staged in
/// its own catalog first, so it lands either completely or not at all.
pub fn assemble(outcomes: &[DeviceOutcome]) -> ScrapeSnapshot {
    let mut catalog = Catalog::new();

    for outcome in outcomes {
        let Ok(readings) = &outcome.result else {
            continue;
        };
        let mut staged = Catalog::new();
        match staged.add_device(readings) {
            Ok(()) => catalog.absorb(staged),
            Err(e) => {
                error!(host = %outcome.descriptor.host, error = %e, "dropping device samples");
            }
        }
    }

    catalog.into_snapshot()
}
