//! Prometheus text-exposition rendering for collected samples.
//!
//! Families follow the describe() order; a family with no samples this
//! scrape is omitted entirely.

use std::collections::HashMap;
use std::sync::Arc;

use crate::metrics::catalog::MetricDescriptor;
use crate::metrics::sample::Sample;

pub const TEXT_FORMAT: &str = "text/plain; version=0.0.4";

fn escape_help(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

fn render_sample(out: &mut String, sample: &Sample) {
    if sample.labels.is_empty() {
        out.push_str(&format!("{} {}\n", sample.desc.name, sample.value));
        return;
    }

    let labels: Vec<String> = sample
        .desc
        .labels
        .iter()
        .zip(&sample.labels)
        .map(|(name, value)| format!("{}=\"{}\"", name, escape_label_value(value)))
        .collect();
    out.push_str(&format!(
        "{}{{{}}} {}\n",
        sample.desc.name,
        labels.join(","),
        sample.value
    ));
}

/// Renders one scrape's samples against the full descriptor set.
pub fn render(descriptors: &[Arc<MetricDescriptor>], samples: &[Sample]) -> String {
    let mut families: HashMap<&str, Vec<&Sample>> = HashMap::new();
    for sample in samples {
        families
            .entry(sample.desc.name.as_str())
            .or_default()
            .push(sample);
    }

    let mut out = String::new();
    for desc in descriptors {
        let Some(family) = families.get(desc.name.as_str()) else {
            continue;
        };
        out.push_str(&format!("# HELP {} {}\n", desc.name, escape_help(desc.help)));
        out.push_str(&format!(
            "# TYPE {} {}\n",
            desc.name,
            family[0].kind.as_str()
        ));
        for sample in family {
            render_sample(&mut out, sample);
        }
    }
    out
}
