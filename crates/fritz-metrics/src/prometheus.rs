//! Prometheus text exposition format.
//!
//! Renders a scrape snapshot into the Prometheus text exposition format
//! for scraping by a Prometheus server or compatible agent.

use crate::model::{MetricKind, ScrapeSnapshot};

/// Content type of the rendered exposition.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Render a snapshot into Prometheus text format.
///
/// Every family gets its HELP and TYPE lines, even with no samples.
/// Counter families are exposed without a trailing `_total` and their
/// samples carry the `_total` suffix, matching the series names existing
/// dashboards query.
pub fn render_prometheus(snapshot: &ScrapeSnapshot) -> String {
    let mut out = String::new();

    for family in &snapshot.families {
        let (exposed, sample_name) = match family.kind {
            MetricKind::Counter => {
                let base = family.name.strip_suffix("_total").unwrap_or(&family.name);
                (base.to_string(), format!("{base}_total"))
            }
            MetricKind::Gauge => (family.name.clone(), family.name.clone()),
        };

        out.push_str(&format!("# HELP {exposed} {}\n", escape_help(&family.help)));
        out.push_str(&format!("# TYPE {exposed} {}\n", family.kind.as_str()));

        for sample in &family.samples {
            out.push_str(&sample_name);
            if !sample.labels.is_empty() {
                let labels: Vec<String> = sample
                    .labels
                    .iter()
                    .map(|(k, v)| format!("{k}=\"{}\"", escape_label_value(v)))
                    .collect();
                out.push('{');
                out.push_str(&labels.join(","));
                out.push('}');
            }
            out.push_str(&format!(" {}\n", sample.value));
        }
    }

    out
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
