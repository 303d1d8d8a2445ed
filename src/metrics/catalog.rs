use std::sync::Arc;

/// Static metadata for one exported metric: full name (namespace applied),
/// help text, and the ordered label names every sample must match.
#[derive(Debug)]
pub struct MetricDescriptor {
    pub name: String,
    pub help: &'static str,
    pub labels: &'static [&'static str],
}

fn desc(
    namespace: &str,
    name: &str,
    help: &'static str,
    labels: &'static [&'static str],
) -> Arc<MetricDescriptor> {
    Arc::new(MetricDescriptor {
        name: format!("{}_{}", namespace, name),
        help,
        labels,
    })
}

const CHANNEL_LABELS: &[&str] = &[
    "active",
    "remote_pubkey",
    "chan_point",
    "chan_id",
    "capacity",
    "commit_fee",
    "private",
    "initiator",
];

/// The full set of metric descriptors, built once at collector construction
/// and shared read-only by every scrape. The names and label sets are the
/// exporter's wire contract and never change at runtime.
pub struct MetricCatalog {
    pub up: Arc<MetricDescriptor>,

    pub instance_info: Arc<MetricDescriptor>,
    pub peers: Arc<MetricDescriptor>,
    pub channels: Arc<MetricDescriptor>,
    pub block_height: Arc<MetricDescriptor>,
    pub synced_to_chain: Arc<MetricDescriptor>,

    pub wallet_balance: Arc<MetricDescriptor>,

    pub limbo_balance: Arc<MetricDescriptor>,
    pub channels_pending: Arc<MetricDescriptor>,
    pub channels_waiting_close: Arc<MetricDescriptor>,

    pub channels_balance: Arc<MetricDescriptor>,

    pub forwarding_history_info: Arc<MetricDescriptor>,

    pub network_capacity: Arc<MetricDescriptor>,
    pub network_channels: Arc<MetricDescriptor>,
    pub network_nodes: Arc<MetricDescriptor>,

    pub channel_balance: Arc<MetricDescriptor>,
    pub channel_balance_ratio: Arc<MetricDescriptor>,

    pub peer_info: Arc<MetricDescriptor>,
    pub peer_recv_bytes: Arc<MetricDescriptor>,
    pub peer_sent_bytes: Arc<MetricDescriptor>,
}

impl MetricCatalog {
    pub fn new(namespace: &str) -> Self {
        Self {
            up: desc(
                namespace,
                "lnd_up",
                "Whether the last scrape reached the node.",
                &[],
            ),
            instance_info: desc(
                namespace,
                "instance_info",
                "Static information about the node instance.",
                &["alias", "pubkey", "version"],
            ),
            peers: desc(
                namespace,
                "peers",
                "Number of currently connected peers.",
                &[],
            ),
            channels: desc(namespace, "channels", "Number of channels.", &["status"]),
            block_height: desc(
                namespace,
                "block_height",
                "The node's current view of the height of the best block.",
                &[],
            ),
            synced_to_chain: desc(
                namespace,
                "synced_to_chain",
                "Whether the wallet's view is synced to the main chain.",
                &[],
            ),
            wallet_balance: desc(
                namespace,
                "wallet_balance_sats",
                "The wallet balance.",
                &["status"],
            ),
            limbo_balance: desc(
                namespace,
                "channel_limbo_balance_sats",
                "The balance in satoshis encumbered in pending channels.",
                &[],
            ),
            channels_pending: desc(
                namespace,
                "channel_pending",
                "The total pending channels.",
                &["status", "forced"],
            ),
            channels_waiting_close: desc(
                namespace,
                "channel_waiting_close",
                "Channels waiting for closing tx to confirm.",
                &[],
            ),
            channels_balance: desc(
                namespace,
                "channels_balance_sats",
                "Sum of all channel funds available.",
                &[],
            ),
            forwarding_history_info: desc(
                namespace,
                "forwarding_history_info",
                "One entry per forwarding event.",
                &[
                    "peer_alias_in",
                    "peer_alias_out",
                    "amount_in",
                    "amount_out",
                    "fee",
                    "channel_id_in",
                    "channel_id_out",
                    "timestamp_ns",
                ],
            ),
            network_capacity: desc(
                namespace,
                "network_capacity_sats_total",
                "Total capacity of the visible graph.",
                &[],
            ),
            network_channels: desc(
                namespace,
                "network_channels_total",
                "Total channels in the visible graph.",
                &[],
            ),
            network_nodes: desc(
                namespace,
                "network_nodes_total",
                "Total nodes in the visible graph.",
                &[],
            ),
            channel_balance: desc(
                namespace,
                "channel_balance_sats",
                "The channel local balance.",
                CHANNEL_LABELS,
            ),
            channel_balance_ratio: desc(
                namespace,
                "channel_balance_percentage",
                "The channel local balance over usable capacity.",
                CHANNEL_LABELS,
            ),
            peer_info: desc(
                namespace,
                "peer_info",
                "One entry per connected peer.",
                &["addr", "remote_pubkey", "direction"],
            ),
            peer_recv_bytes: desc(
                namespace,
                "peer_info_received_bytes_total",
                "Bytes received from the peer.",
                &["addr"],
            ),
            peer_sent_bytes: desc(
                namespace,
                "peer_info_sent_bytes_total",
                "Bytes sent to the peer.",
                &["addr"],
            ),
        }
    }

    /// The full ordered descriptor set, independent of any scrape having run.
    pub fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        vec![
            self.up.clone(),
            self.instance_info.clone(),
            self.peers.clone(),
            self.channels.clone(),
            self.block_height.clone(),
            self.synced_to_chain.clone(),
            self.wallet_balance.clone(),
            self.limbo_balance.clone(),
            self.channels_pending.clone(),
            self.channels_waiting_close.clone(),
            self.channels_balance.clone(),
            self.forwarding_history_info.clone(),
            self.network_capacity.clone(),
            self.network_channels.clone(),
            self.network_nodes.clone(),
            self.channel_balance.clone(),
            self.channel_balance_ratio.clone(),
            self.peer_info.clone(),
            self.peer_recv_bytes.clone(),
            self.peer_sent_bytes.clone(),
        ]
    }
}
