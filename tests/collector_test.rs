use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tonic::Status;

use lnd_exporter::lnrpc::wire::{
    Channel, ChannelBalanceResponse, ForwardingEvent, ForwardingHistoryResponse, GetInfoResponse,
    ListChannelsResponse, ListPeersResponse, NetworkInfo, Peer, PendingChannelsResponse,
    WalletBalanceResponse,
};
use lnd_exporter::lnrpc::{LightningRpc, NodeConnector};
use lnd_exporter::metrics::{LightningCollector, ProbeKind, ProbeOutcome, Sample};
use lnd_exporter::ExporterError;

/// `None` for a call means that RPC fails with UNAVAILABLE.
#[derive(Clone, Default)]
struct MockResponses {
    info: Option<GetInfoResponse>,
    wallet: Option<WalletBalanceResponse>,
    pending: Option<PendingChannelsResponse>,
    channel_balance: Option<ChannelBalanceResponse>,
    forwarding: Option<ForwardingHistoryResponse>,
    network: Option<NetworkInfo>,
    channels: Option<ListChannelsResponse>,
    peers: Option<ListPeersResponse>,
}

impl MockResponses {
    fn all_ok() -> Self {
        Self {
            info: Some(default_info()),
            wallet: Some(WalletBalanceResponse {
                total_balance: 1500,
                confirmed_balance: 1000,
                unconfirmed_balance: 500,
            }),
            pending: Some(PendingChannelsResponse::default()),
            channel_balance: Some(ChannelBalanceResponse {
                balance: 250_000,
                pending_open_balance: 0,
            }),
            forwarding: Some(ForwardingHistoryResponse::default()),
            network: Some(NetworkInfo {
                num_nodes: 12_000,
                num_channels: 48_000,
                total_network_capacity: 4_000_000_000,
            }),
            channels: Some(ListChannelsResponse::default()),
            peers: Some(ListPeersResponse::default()),
        }
    }
}

fn default_info() -> GetInfoResponse {
    GetInfoResponse {
        identity_pubkey: "02abcdef".to_string(),
        alias: "mock-node".to_string(),
        num_pending_channels: 1,
        num_active_channels: 2,
        num_peers: 5,
        block_height: 800_000,
        synced_to_chain: true,
        version: "0.17.0-beta".to_string(),
        num_inactive_channels: 0,
    }
}

#[derive(Clone, Copy, Default)]
struct MockDelays {
    info: Option<Duration>,
    wallet: Option<Duration>,
}

struct MockRpc {
    responses: MockResponses,
    delays: MockDelays,
}

fn take<T: Clone>(slot: &Option<T>) -> Result<T, Status> {
    slot.clone()
        .ok_or_else(|| Status::unavailable("mock failure"))
}

#[async_trait]
impl LightningRpc for MockRpc {
    async fn get_info(&mut self) -> Result<GetInfoResponse, Status> {
        if let Some(delay) = self.delays.info {
            tokio::time::sleep(delay).await;
        }
        take(&self.responses.info)
    }

    async fn wallet_balance(&mut self) -> Result<WalletBalanceResponse, Status> {
        if let Some(delay) = self.delays.wallet {
            tokio::time::sleep(delay).await;
        }
        take(&self.responses.wallet)
    }

    async fn pending_channels(&mut self) -> Result<PendingChannelsResponse, Status> {
        take(&self.responses.pending)
    }

    async fn channel_balance(&mut self) -> Result<ChannelBalanceResponse, Status> {
        take(&self.responses.channel_balance)
    }

    async fn forwarding_history(&mut self) -> Result<ForwardingHistoryResponse, Status> {
        take(&self.responses.forwarding)
    }

    async fn get_network_info(&mut self) -> Result<NetworkInfo, Status> {
        take(&self.responses.network)
    }

    async fn list_channels(&mut self) -> Result<ListChannelsResponse, Status> {
        take(&self.responses.channels)
    }

    async fn list_peers(&mut self) -> Result<ListPeersResponse, Status> {
        take(&self.responses.peers)
    }
}

struct MockConnector {
    responses: MockResponses,
    delays: MockDelays,
    fail_connect: bool,
}

impl MockConnector {
    fn ok() -> Self {
        Self {
            responses: MockResponses::all_ok(),
            delays: MockDelays::default(),
            fail_connect: false,
        }
    }

    fn failing() -> Self {
        Self {
            responses: MockResponses::default(),
            delays: MockDelays::default(),
            fail_connect: true,
        }
    }
}

#[async_trait]
impl NodeConnector for MockConnector {
    type Client = MockRpc;

    async fn connect(&self) -> lnd_exporter::Result<MockRpc> {
        if self.fail_connect {
            return Err(ExporterError::Dial {
                addr: "mock:10009".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(MockRpc {
            responses: self.responses.clone(),
            delays: self.delays,
        })
    }
}

fn collector(connector: MockConnector) -> LightningCollector<MockConnector> {
    LightningCollector::new("lnd", connector, true)
}

async fn collect_all(collector: &LightningCollector<MockConnector>) -> Vec<Sample> {
    collector.collect().collect().await
}

fn values_for<'a>(samples: &'a [Sample], name: &str) -> Vec<&'a Sample> {
    samples
        .iter()
        .filter(|s| s.desc.name == format!("lnd_{}", name))
        .collect()
}

#[tokio::test]
async fn test_liveness_emitted_exactly_once_and_last() {
    let collector = collector(MockConnector::ok());
    let samples = collect_all(&collector).await;

    let up = values_for(&samples, "lnd_up");
    assert_eq!(up.len(), 1);
    assert_eq!(up[0].value, 1.0);
    assert_eq!(samples.last().unwrap().desc.name, "lnd_lnd_up");
}

#[tokio::test]
async fn test_describe_is_independent_of_collect() {
    let collector = collector(MockConnector::failing());
    let descs = collector.describe();
    assert_eq!(descs.len(), 20);

    // A failed scrape changes nothing about the descriptor set.
    let _ = collect_all(&collector).await;
    assert_eq!(collector.describe().len(), 20);
}

#[tokio::test]
async fn test_connection_failure_yields_single_down_sample() {
    let collector = collector(MockConnector::failing());
    let samples = collect_all(&collector).await;

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].desc.name, "lnd_lnd_up");
    assert_eq!(samples[0].value, 0.0);
}

#[tokio::test]
async fn test_node_status_failure_is_terminal() {
    let mut connector = MockConnector::ok();
    connector.responses.info = None;
    let collector = collector(connector);
    let samples = collect_all(&collector).await;

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].desc.name, "lnd_lnd_up");
    assert_eq!(samples[0].value, 0.0);
}

#[tokio::test]
async fn test_failed_probe_is_skipped_without_aborting_the_scrape() {
    let mut connector = MockConnector::ok();
    connector.responses.wallet = None;
    let collector = collector(connector);
    let samples = collect_all(&collector).await;

    assert!(values_for(&samples, "wallet_balance_sats").is_empty());
    // Probes before and after the failed one still delivered.
    assert_eq!(values_for(&samples, "peers")[0].value, 5.0);
    assert_eq!(
        values_for(&samples, "network_nodes_total")[0].value,
        12_000.0
    );
    let up = values_for(&samples, "lnd_up");
    assert_eq!(up.len(), 1);
    assert_eq!(up[0].value, 1.0);
}

#[tokio::test]
async fn test_node_status_scenario() {
    let collector = collector(MockConnector::ok());
    let samples = collect_all(&collector).await;

    assert_eq!(values_for(&samples, "peers")[0].value, 5.0);
    let channels = values_for(&samples, "channels");
    assert_eq!(channels.len(), 3);
    for sample in channels {
        let expected = match sample.labels[0].as_str() {
            "active" => 2.0,
            "pending" => 1.0,
            "inactive" => 0.0,
            other => panic!("unexpected status label {}", other),
        };
        assert_eq!(sample.value, expected);
    }
    assert_eq!(values_for(&samples, "block_height")[0].value, 800_000.0);
    assert_eq!(values_for(&samples, "synced_to_chain")[0].value, 1.0);

    let info = values_for(&samples, "instance_info");
    assert_eq!(
        info[0].labels,
        vec!["mock-node", "02abcdef", "0.17.0-beta"]
    );
}

#[tokio::test]
async fn test_zero_pending_channels_still_emit_count_samples() {
    let collector = collector(MockConnector::ok());
    let samples = collect_all(&collector).await;

    let pending = values_for(&samples, "channel_pending");
    assert_eq!(pending.len(), 3);
    assert!(pending.iter().all(|s| s.value == 0.0));
    assert_eq!(values_for(&samples, "channel_waiting_close")[0].value, 0.0);
    assert_eq!(
        values_for(&samples, "channel_limbo_balance_sats")[0].value,
        0.0
    );
}

#[tokio::test]
async fn test_balance_ratio_guard() {
    let mut connector = MockConnector::ok();
    connector.responses.channels = Some(ListChannelsResponse {
        channels: vec![
            Channel {
                active: true,
                remote_pubkey: "02aa".to_string(),
                channel_point: "txid:0".to_string(),
                chan_id: 1,
                capacity: 100,
                local_balance: 45,
                remote_balance: 45,
                commit_fee: 10,
                private: false,
                initiator: true,
            },
            Channel {
                active: true,
                remote_pubkey: "02bb".to_string(),
                channel_point: "txid:1".to_string(),
                chan_id: 2,
                capacity: 10,
                local_balance: 45,
                remote_balance: 0,
                commit_fee: 10,
                private: false,
                initiator: false,
            },
        ],
    });
    let collector = collector(connector);
    let samples = collect_all(&collector).await;

    let ratios = values_for(&samples, "channel_balance_percentage");
    assert_eq!(ratios.len(), 1);
    assert_eq!(ratios[0].value, 0.5);
    assert_eq!(ratios[0].labels[3], "1"); // chan_id

    // The plain balance sample is emitted for both channels.
    let balances = values_for(&samples, "channel_balance_sats");
    assert_eq!(balances.len(), 2);
    assert!(balances.iter().all(|s| s.value == 45.0));
}

#[tokio::test]
async fn test_forwarding_events_one_sample_each() {
    let mut connector = MockConnector::ok();
    connector.responses.forwarding = Some(ForwardingHistoryResponse {
        forwarding_events: vec![ForwardingEvent {
            chan_id_in: 100,
            chan_id_out: 200,
            amt_in: 1000,
            amt_out: 990,
            fee: 10,
            timestamp_ns: 1_700_000_000_000_000_000,
            peer_alias_in: "alice".to_string(),
            peer_alias_out: "bob".to_string(),
        }],
        last_offset_index: 1,
    });
    let collector = collector(connector);
    let samples = collect_all(&collector).await;

    let events = values_for(&samples, "forwarding_history_info");
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].labels,
        vec![
            "alice",
            "bob",
            "1000",
            "990",
            "10",
            "100",
            "200",
            "1700000000000000000"
        ]
    );
}

#[tokio::test]
async fn test_peer_probe_samples_and_direction() {
    let mut connector = MockConnector::ok();
    connector.responses.peers = Some(ListPeersResponse {
        peers: vec![Peer {
            pub_key: "03cc".to_string(),
            address: "1.2.3.4:9735".to_string(),
            bytes_sent: 2048,
            bytes_recv: 4096,
            inbound: true,
        }],
    });
    let collector = collector(connector);
    let samples = collect_all(&collector).await;

    let info = values_for(&samples, "peer_info");
    assert_eq!(info.len(), 1);
    assert_eq!(info[0].labels, vec!["1.2.3.4:9735", "03cc", "inbound"]);
    assert_eq!(
        values_for(&samples, "peer_info_received_bytes_total")[0].value,
        4096.0
    );
    assert_eq!(
        values_for(&samples, "peer_info_sent_bytes_total")[0].value,
        2048.0
    );
}

#[tokio::test]
async fn test_peer_probe_disabled_by_flag() {
    let collector = LightningCollector::new("lnd", MockConnector::ok(), false);
    let samples: Vec<Sample> = collector.collect().collect().await;
    assert!(values_for(&samples, "peer_info").is_empty());
}

#[tokio::test]
async fn test_shared_deadline_skips_remaining_probes() {
    let mut connector = MockConnector::ok();
    connector.delays.wallet = Some(Duration::from_millis(100));
    let collector =
        collector(connector).with_timeout(Duration::from_millis(20));
    let samples = collect_all(&collector).await;

    // Node status landed before the deadline; everything at and after the
    // slow probe was skipped, but liveness still closed the session with 1.
    assert_eq!(values_for(&samples, "peers")[0].value, 5.0);
    assert!(values_for(&samples, "wallet_balance_sats").is_empty());
    assert!(values_for(&samples, "network_nodes_total").is_empty());
    let up = values_for(&samples, "lnd_up");
    assert_eq!(up.len(), 1);
    assert_eq!(up[0].value, 1.0);
}

#[tokio::test]
async fn test_skip_outcomes_are_recorded_in_the_session_report() {
    let mut connector = MockConnector::ok();
    connector.responses.wallet = None;
    let collector = collector(connector);

    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });
    let report = collector.scrape(tx).await;
    drain.await.unwrap();

    assert!(report.connected);
    assert!(!report.cancelled);
    let wallet = report
        .probes
        .iter()
        .find(|p| p.probe == ProbeKind::WalletBalance)
        .unwrap();
    assert!(matches!(wallet.outcome, ProbeOutcome::Skipped { .. }));
    let network = report
        .probes
        .iter()
        .find(|p| p.probe == ProbeKind::NetworkInfo)
        .unwrap();
    assert!(matches!(
        network.outcome,
        ProbeOutcome::Collected { samples: 3 }
    ));
}

#[tokio::test]
async fn test_dropped_receiver_cancels_the_session() {
    let collector = collector(MockConnector::ok());

    let (tx, rx) = tokio::sync::mpsc::channel(1);
    drop(rx);
    let report = collector.scrape(tx).await;

    assert!(report.cancelled);
    assert!(!report.connected);
}

#[tokio::test]
async fn test_concurrent_scrapes_are_serialized() {
    let mut connector = MockConnector::ok();
    connector.delays.info = Some(Duration::from_millis(100));
    let collector = collector(connector);

    let first_done = Arc::new(AtomicBool::new(false));

    let mut first = collector.collect();
    // Give the first session time to take the scrape lock.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let mut second = collector.collect();

    let drain_first = {
        let first_done = first_done.clone();
        async move {
            while first.next().await.is_some() {}
            first_done.store(true, Ordering::SeqCst);
        }
    };
    let observe_second = {
        let first_done = first_done.clone();
        async move {
            let sample = second.next().await.expect("second scrape yields samples");
            assert!(
                first_done.load(Ordering::SeqCst),
                "second scrape produced a sample before the first session ended"
            );
            sample
        }
    };

    let (_, sample) = tokio::join!(drain_first, observe_second);
    assert_eq!(sample.desc.name, "lnd_instance_info");
}
