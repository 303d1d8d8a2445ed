pub mod catalog;
pub mod collector;
pub mod encoder;
pub mod sample;

pub use catalog::{MetricCatalog, MetricDescriptor};
pub use collector::{LightningCollector, SCRAPE_TIMEOUT};
pub use sample::{
    ProbeKind, ProbeOutcome, ProbeReport, Sample, SessionReport, SkipCause, ValueKind,
};
