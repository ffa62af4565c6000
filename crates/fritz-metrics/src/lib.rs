//! fritz-metrics — scrape snapshots and Prometheus text exposition.
//!
//! # Architecture
//!
//! ```text
//! ScrapeSnapshot
//!   └── MetricFamily (name, help, kind, label keys)
//!         └── MetricSample (label values, value)
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```
//!
//! A snapshot is built fresh for every scrape and dropped once rendered.

pub mod model;
pub mod prometheus;

pub use model::{FamilyError, MetricFamily, MetricKind, MetricSample, MetricValue, ScrapeSnapshot};
pub use prometheus::{CONTENT_TYPE, render_prometheus};
