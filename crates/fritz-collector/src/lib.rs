//! fritz-collector — per-scrape collection from FRITZ!Box devices.
//!
//! # Architecture
//!
//! ```text
//! ScrapeOrchestrator::collect()
//!   ├── DeviceRegistry (one session per configured device)
//!   ├── per device, concurrently, under a timeout:
//!   │     fetch() → FieldSet → DeviceReadings::from_field_set()
//!   │     └── DeviceOutcome (readings or DeviceFetchError)
//!   └── assemble(&[DeviceOutcome]) → ScrapeSnapshot (fixed 22-family catalog)
//! ```
//!
//! A device either contributes every sample from one consistent query
//! pass or nothing at all; a failing device never fails the scrape.

pub mod assembler;
pub mod error;
pub mod fetcher;
pub mod orchestrator;
pub mod readings;
pub mod registry;

pub use assembler::{FAMILY_COUNT, assemble, empty_catalog};
pub use error::DeviceFetchError;
pub use fetcher::{ActionCall, FieldKey, FieldSet, fetch};
pub use orchestrator::{DEFAULT_DEVICE_TIMEOUT, DeviceOutcome, ScrapeOrchestrator};
pub use readings::DeviceReadings;
pub use registry::{DeviceRegistry, DeviceSession};
