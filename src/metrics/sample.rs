use std::fmt;
use std::sync::Arc;

use tonic::Status;
use tracing::{debug, warn};

use crate::metrics::catalog::MetricDescriptor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Gauge,
    Counter,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Gauge => "gauge",
            ValueKind::Counter => "counter",
        }
    }
}

/// One observed value for a descriptor, with its ordered label values.
#[derive(Debug, Clone)]
pub struct Sample {
    pub desc: Arc<MetricDescriptor>,
    pub kind: ValueKind,
    pub value: f64,
    pub labels: Vec<String>,
}

impl Sample {
    pub fn gauge(desc: Arc<MetricDescriptor>, value: f64, labels: Vec<String>) -> Self {
        Self::new(desc, ValueKind::Gauge, value, labels)
    }

    pub fn counter(desc: Arc<MetricDescriptor>, value: f64, labels: Vec<String>) -> Self {
        Self::new(desc, ValueKind::Counter, value, labels)
    }

    fn new(desc: Arc<MetricDescriptor>, kind: ValueKind, value: f64, labels: Vec<String>) -> Self {
        debug_assert_eq!(
            labels.len(),
            desc.labels.len(),
            "label values for {} must match the descriptor",
            desc.name
        );
        Self {
            desc,
            kind,
            value,
            labels,
        }
    }
}

/// Why a probe produced no samples this session.
#[derive(Debug)]
pub enum SkipCause {
    Rpc(Status),
    DeadlineExceeded,
}

impl fmt::Display for SkipCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipCause::Rpc(status) => write!(f, "rpc error: {}", status),
            SkipCause::DeadlineExceeded => write!(f, "session deadline exceeded"),
        }
    }
}

#[derive(Debug)]
pub enum ProbeOutcome {
    Collected { samples: usize },
    Skipped { cause: SkipCause },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    NodeStatus,
    WalletBalance,
    PendingChannels,
    ChannelBalance,
    ForwardingHistory,
    NetworkInfo,
    ChannelList,
    PeerList,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::NodeStatus => "node_status",
            ProbeKind::WalletBalance => "wallet_balance",
            ProbeKind::PendingChannels => "pending_channels",
            ProbeKind::ChannelBalance => "channel_balance",
            ProbeKind::ForwardingHistory => "forwarding_history",
            ProbeKind::NetworkInfo => "network_info",
            ProbeKind::ChannelList => "channel_list",
            ProbeKind::PeerList => "peer_list",
        }
    }
}

#[derive(Debug)]
pub struct ProbeReport {
    pub probe: ProbeKind,
    pub outcome: ProbeOutcome,
}

/// Aggregated outcome of one scrape session. Logging is a side effect of
/// rendering this report at session end rather than ad hoc per call.
#[derive(Debug, Default)]
pub struct SessionReport {
    /// Whether the session got past connection establishment.
    pub connected: bool,
    /// Whether the scrape was cancelled from outside before completing.
    pub cancelled: bool,
    pub probes: Vec<ProbeReport>,
}

impl SessionReport {
    pub fn record(&mut self, probe: ProbeKind, outcome: ProbeOutcome) {
        self.probes.push(ProbeReport { probe, outcome });
    }

    pub fn samples_total(&self) -> usize {
        self.probes
            .iter()
            .map(|p| match p.outcome {
                ProbeOutcome::Collected { samples } => samples,
                ProbeOutcome::Skipped { .. } => 0,
            })
            .sum()
    }

    pub fn log(&self) {
        for probe in &self.probes {
            match &probe.outcome {
                ProbeOutcome::Collected { samples } => {
                    debug!("Probe {} collected {} samples", probe.probe.as_str(), samples);
                }
                ProbeOutcome::Skipped { cause } => {
                    warn!("Probe {} skipped: {}", probe.probe.as_str(), cause);
                }
            }
        }
        if self.cancelled {
            debug!("Scrape cancelled before the probe sequence completed");
        }
    }
}
