//! Scrape orchestrator — fans out to every device once per scrape.
//!
//! Devices are fetched concurrently on the tokio runtime, each bounded by
//! its own timeout. Nothing is cached between scrapes: every call to
//! [`ScrapeOrchestrator::collect`] queries every device live.

use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use fritz_core::DeviceDescriptor;
use fritz_metrics::ScrapeSnapshot;

use crate::assembler::assemble;
use crate::error::DeviceFetchError;
use crate::fetcher::fetch;
use crate::readings::DeviceReadings;
use crate::registry::{DeviceRegistry, DeviceSession};

/// Per-device budget for the whole action sequence.
pub const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(10);

/// What one device produced in one scrape.
#[derive(Debug)]
pub struct DeviceOutcome {
    pub descriptor: DeviceDescriptor,
    pub result: Result<DeviceReadings, DeviceFetchError>,
}

/// Builds a fresh [`ScrapeSnapshot`] from every registered device.
#[derive(Debug)]
pub struct ScrapeOrchestrator {
    registry: DeviceRegistry,
    device_timeout: Duration,
}

impl ScrapeOrchestrator {
    pub fn new(registry: DeviceRegistry, device_timeout: Duration) -> Self {
        Self {
            registry,
            device_timeout,
        }
    }

    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Run one scrape cycle. Never fails: unreachable or misbehaving
    /// devices simply contribute no samples.
    pub async fn collect(&self) -> ScrapeSnapshot {
        let outcomes = self.fetch_all().await;
        assemble(&outcomes)
    }

    /// Fetch every device and return the outcomes in registry order.
    pub async fn fetch_all(&self) -> Vec<DeviceOutcome> {
        if self.registry.is_empty() {
            info!("skipping collection, no devices configured");
            return Vec::new();
        }

        let started = Instant::now();
        let sessions = self.registry.sessions();
        let mut tasks = JoinSet::new();

        for (index, session) in sessions.iter().cloned().enumerate() {
            let timeout = self.device_timeout;
            tasks.spawn(async move {
                let result = fetch_device(&session, timeout).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<DeviceReadings, DeviceFetchError>>> =
            (0..sessions.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => warn!(error = %e, "device fetch task failed"),
            }
        }

        let outcomes: Vec<DeviceOutcome> = sessions
            .iter()
            .zip(results)
            .map(|(session, result)| DeviceOutcome {
                descriptor: session.descriptor().clone(),
                result: result
                    .unwrap_or_else(|| Err(DeviceFetchError::Join("task did not complete".to_string()))),
            })
            .collect();

        for outcome in &outcomes {
            if let Err(e) = &outcome.result {
                warn!(host = %outcome.descriptor.host, error = %e, "error fetching metrics for device");
            }
        }

        let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        debug!(
            devices = outcomes.len(),
            failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scrape cycle complete"
        );
        outcomes
    }
}

/// One device's full query pass, bounded by `timeout`.
async fn fetch_device(
    session: &DeviceSession,
    timeout: Duration,
) -> Result<DeviceReadings, DeviceFetchError> {
    let pass = async {
        let fields = fetch(session.caller()).await?;
        DeviceReadings::from_field_set(&fields)
    };

    match tokio::time::timeout(timeout, pass).await {
        Ok(result) => result,
        Err(_) => Err(DeviceFetchError::Timeout(timeout)),
    }
}
