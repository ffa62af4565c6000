//! Snapshot data model.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
}

impl MetricKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }
}

/// A sample value. Integers are kept exact; scaled readings are floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Integer(i64),
    Float(f64),
}

impl MetricValue {
    pub fn as_f64(self) -> f64 {
        match self {
            MetricValue::Integer(n) => n as f64,
            MetricValue::Float(f) => f,
        }
    }
}

impl fmt::Display for MetricValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MetricValue::Integer(n) => write!(f, "{n}"),
            MetricValue::Float(v) if v.is_nan() => f.write_str("NaN"),
            MetricValue::Float(v) if v.is_infinite() => {
                f.write_str(if v > 0.0 { "+Inf" } else { "-Inf" })
            }
            MetricValue::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for MetricValue {
    fn from(n: i64) -> Self {
        MetricValue::Integer(n)
    }
}

/// Values beyond `i64::MAX` are carried as floats.
impl From<u64> for MetricValue {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(n) => MetricValue::Integer(n),
            Err(_) => MetricValue::Float(n as f64),
        }
    }
}

impl From<u8> for MetricValue {
    fn from(n: u8) -> Self {
        MetricValue::Integer(n.into())
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FamilyError {
    #[error("{family}: expected {expected} label values, got {got}")]
    LabelMismatch {
        family: String,
        expected: usize,
        got: usize,
    },
}

/// One exposed sample. `labels` are `(key, value)` pairs in the family's
/// label-key order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub name: String,
    pub labels: Vec<(String, String)>,
    pub value: MetricValue,
    pub kind: MetricKind,
}

impl MetricSample {
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A named group of samples sharing kind and label keys.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_keys: Vec<String>,
    pub samples: Vec<MetricSample>,
}

impl MetricFamily {
    pub fn new(name: &str, help: &str, kind: MetricKind, label_keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            help: help.to_string(),
            kind,
            label_keys: label_keys.iter().map(|k| k.to_string()).collect(),
            samples: Vec::new(),
        }
    }

    pub fn counter(name: &str, help: &str, label_keys: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Counter, label_keys)
    }

    pub fn gauge(name: &str, help: &str, label_keys: &[&str]) -> Self {
        Self::new(name, help, MetricKind::Gauge, label_keys)
    }

    /// Add a sample; `label_values` are positional, matching `label_keys`.
    pub fn add_sample(
        &mut self,
        label_values: &[&str],
        value: impl Into<MetricValue>,
    ) -> Result<(), FamilyError> {
        if label_values.len() != self.label_keys.len() {
            return Err(FamilyError::LabelMismatch {
                family: self.name.clone(),
                expected: self.label_keys.len(),
                got: label_values.len(),
            });
        }
        let labels = self
            .label_keys
            .iter()
            .zip(label_values)
            .map(|(k, v)| (k.clone(), v.to_string()))
            .collect();
        self.samples.push(MetricSample {
            name: self.name.clone(),
            labels,
            value: value.into(),
            kind: self.kind,
        });
        Ok(())
    }
}

/// All families produced by one scrape, in a stable order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeSnapshot {
    pub families: Vec<MetricFamily>,
}

impl ScrapeSnapshot {
    pub fn new(families: Vec<MetricFamily>) -> Self {
        Self { families }
    }

    pub fn family(&self, name: &str) -> Option<&MetricFamily> {
        self.families.iter().find(|f| f.name == name)
    }

    pub fn family_names(&self) -> Vec<&str> {
        self.families.iter().map(|f| f.name.as_str()).collect()
    }

    pub fn sample_count(&self) -> usize {
        self.families.iter().map(|f| f.samples.len()).sum()
    }

    /// Family names with each sample's label set, values left out.
    pub fn shape(&self) -> Vec<(String, Vec<Vec<(String, String)>>)> {
        self.families
            .iter()
            .map(|f| {
                let labels = f.samples.iter().map(|s| s.labels.clone()).collect();
                (f.name.clone(), labels)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sample_zips_labels() {
        let mut family = MetricFamily::gauge("fritzbox_dsl_noise_margin_dB", "Noise Margin in dB", &["Serial", "Direction"]);
        family.add_sample(&["A1", "up"], 10.5).unwrap();

        let sample = &family.samples[0];
        assert_eq!(sample.label("Serial"), Some("A1"));
        assert_eq!(sample.label("Direction"), Some("up"));
        assert_eq!(sample.kind, MetricKind::Gauge);
        assert_eq!(sample.value, MetricValue::Float(10.5));
    }

    #[test]
    fn add_sample_rejects_wrong_label_count() {
        let mut family = MetricFamily::counter("fritzbox_uptime", "uptime", &["Serial"]);
        let err = family.add_sample(&["A1", "extra"], 1i64).unwrap_err();
        assert_eq!(
            err,
            FamilyError::LabelMismatch {
                family: "fritzbox_uptime".to_string(),
                expected: 1,
                got: 2,
            }
        );
        assert!(family.samples.is_empty());
    }

    #[test]
    fn value_display() {
        assert_eq!(MetricValue::Integer(12345).to_string(), "12345");
        assert_eq!(MetricValue::Float(10.5).to_string(), "10.5");
        assert_eq!(MetricValue::Float(f64::INFINITY).to_string(), "+Inf");
        assert_eq!(MetricValue::Float(f64::NAN).to_string(), "NaN");
    }

    #[test]
    fn huge_unsigned_becomes_float() {
        assert_eq!(MetricValue::from(i64::MAX as u64), MetricValue::Integer(i64::MAX));

        let past = i64::MAX as u64 + 4096;
        let value = MetricValue::from(past);
        assert!(matches!(value, MetricValue::Float(_)));
        assert_eq!(value.as_f64(), past as f64);
        assert!(MetricValue::from(u64::MAX).as_f64() > value.as_f64());
    }

    #[test]
    fn snapshot_lookup() {
        let snapshot = ScrapeSnapshot::new(vec![
            MetricFamily::gauge("a", "a", &[]),
            MetricFamily::gauge("b", "b", &[]),
        ]);
        assert_eq!(snapshot.family_names(), vec!["a", "b"]);
        assert!(snapshot.family("b").is_some());
        assert_eq!(snapshot.sample_count(), 0);
    }
}
