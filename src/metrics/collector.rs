//! The collection orchestrator: one exclusive session per scrape, a fixed
//! ordered probe sequence against the node, samples emitted incrementally.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::time::{timeout_at, Instant};
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;
use tracing::warn;

use crate::lnrpc::{LightningRpc, NodeConnector};
use crate::metrics::catalog::{MetricCatalog, MetricDescriptor};
use crate::metrics::sample::{ProbeKind, ProbeOutcome, Sample, SessionReport, SkipCause};

/// One deadline bounds the whole probe sequence, not each call.
pub const SCRAPE_TIMEOUT: Duration = Duration::from_secs(15);

const SAMPLE_CHANNEL_CAPACITY: usize = 64;

/// The receiver of the sample stream went away; stop probing. The session
/// guard and connection are released by drop on the way out.
struct Cancelled;

/// Ephemeral per-scrape state: the connection handle and the shared probe
/// deadline. Dropped at session end, which closes the connection.
struct ScrapeSession<R> {
    client: R,
    deadline: Instant,
}

impl<R: LightningRpc> ScrapeSession<R> {
    fn new(client: R, timeout: Duration) -> Self {
        Self {
            client,
            deadline: Instant::now() + timeout,
        }
    }

    fn expired(&self) -> bool {
        Instant::now() >= self.deadline
    }
}

fn classify<T>(result: Result<Result<T, Status>, tokio::time::error::Elapsed>) -> Result<T, SkipCause> {
    match result {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(status)) => Err(SkipCause::Rpc(status)),
        Err(_) => Err(SkipCause::DeadlineExceeded),
    }
}

async fn emit(tx: &mpsc::Sender<Sample>, sample: Sample) -> Result<(), Cancelled> {
    tx.send(sample).await.map_err(|_| Cancelled)
}

/// Scrapes one Lightning node on demand and turns the RPC responses into
/// Prometheus samples.
///
/// `collect()` never fails from the caller's point of view: connection
/// problems surface as a liveness sample of 0, individual probe failures as
/// the absence of that probe's samples.
pub struct LightningCollector<C: NodeConnector> {
    catalog: Arc<MetricCatalog>,
    connector: Arc<C>,
    // Serializes scrapes: the node connection and credentials are a single
    // shared resource, so a second concurrent scrape blocks until the first
    // session fully ends.
    scrape_lock: Arc<Mutex<()>>,
    timeout: Duration,
    export_payment_metrics: bool,
    export_peer_metrics: bool,
}

impl<C: NodeConnector> Clone for LightningCollector<C> {
    fn clone(&self) -> Self {
        Self {
            catalog: self.catalog.clone(),
            connector: self.connector.clone(),
            scrape_lock: self.scrape_lock.clone(),
            timeout: self.timeout,
            export_payment_metrics: self.export_payment_metrics,
            export_peer_metrics: self.export_peer_metrics,
        }
    }
}

impl<C: NodeConnector> LightningCollector<C> {
    pub fn new(namespace: &str, connector: C, export_peer_metrics: bool) -> Self {
        Self {
            catalog: Arc::new(MetricCatalog::new(namespace)),
            connector: Arc::new(connector),
            scrape_lock: Arc::new(Mutex::new(())),
            timeout: SCRAPE_TIMEOUT,
            export_payment_metrics: true,
            export_peer_metrics,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    /// The fixed descriptor set, available before any scrape has run.
    pub fn describe(&self) -> Vec<Arc<MetricDescriptor>> {
        self.catalog.describe()
    }

    /// Runs one full scrape session, emitting samples on `tx` as each probe
    /// completes. Returns the session report; the caller decides whether to
    /// log it.
    pub async fn scrape(&self, tx: mpsc::Sender<Sample>) -> SessionReport {
        let _guard = self.scrape_lock.lock().await;
        let mut report = SessionReport::default();

        let client = match self.connector.connect().await {
            Ok(client) => client,
            Err(e) => {
                warn!("Connection to node failed: {}", e);
                let _ = emit(&tx, Sample::gauge(self.catalog.up.clone(), 0.0, vec![])).await;
                return report;
            }
        };

        let mut session = ScrapeSession::new(client, self.timeout);

        // Node status failure is connection-establishment class: the session
        // ends with liveness 0 and no skippable probe runs.
        match self.probe_node_status(&mut session, &tx).await {
            Ok(ProbeOutcome::Collected { samples }) => {
                report.connected = true;
                report.record(ProbeKind::NodeStatus, ProbeOutcome::Collected { samples });
            }
            Ok(ProbeOutcome::Skipped { cause }) => {
                report.record(ProbeKind::NodeStatus, ProbeOutcome::Skipped { cause });
                let _ = emit(&tx, Sample::gauge(self.catalog.up.clone(), 0.0, vec![])).await;
                return report;
            }
            Err(Cancelled) => {
                report.cancelled = true;
                return report;
            }
        }

        // Once the shared deadline has passed, the rest of the sequence is
        // skipped without issuing further calls.
        macro_rules! run_probe {
            ($kind:expr, $future:expr) => {
                if session.expired() {
                    report.record(
                        $kind,
                        ProbeOutcome::Skipped {
                            cause: SkipCause::DeadlineExceeded,
                        },
                    );
                } else {
                    match $future.await {
                        Ok(outcome) => report.record($kind, outcome),
                        Err(Cancelled) => {
                            report.cancelled = true;
                            return report;
                        }
                    }
                }
            };
        }

        run_probe!(
            ProbeKind::WalletBalance,
            self.probe_wallet_balance(&mut session, &tx)
        );
        run_probe!(
            ProbeKind::PendingChannels,
            self.probe_pending_channels(&mut session, &tx)
        );
        run_probe!(
            ProbeKind::ChannelBalance,
            self.probe_channel_balance(&mut session, &tx)
        );
        if self.export_payment_metrics {
            run_probe!(
                ProbeKind::ForwardingHistory,
                self.probe_forwarding_history(&mut session, &tx)
            );
        }
        run_probe!(
            ProbeKind::NetworkInfo,
            self.probe_network_info(&mut session, &tx)
        );
        run_probe!(
            ProbeKind::ChannelList,
            self.probe_channel_list(&mut session, &tx)
        );
        if self.export_peer_metrics {
            run_probe!(ProbeKind::PeerList, self.probe_peer_list(&mut session, &tx));
        }

        // Liveness is the final sample of every session that reached a
        // usable connection, no matter how many probes were skipped.
        let _ = emit(&tx, Sample::gauge(self.catalog.up.clone(), 1.0, vec![])).await;
        report
    }

    async fn probe_node_status(
        &self,
        session: &mut ScrapeSession<C::Client>,
        tx: &mpsc::Sender<Sample>,
    ) -> Result<ProbeOutcome, Cancelled> {
        let info = match classify(timeout_at(session.deadline, session.client.get_info()).await) {
            Ok(info) => info,
            Err(cause) => return Ok(ProbeOutcome::Skipped { cause }),
        };

        let c = &self.catalog;
        emit(
            tx,
            Sample::gauge(
                c.instance_info.clone(),
                1.0,
                vec![info.alias, info.identity_pubkey, info.version],
            ),
        )
        .await?;
        emit(tx, Sample::gauge(c.peers.clone(), info.num_peers as f64, vec![])).await?;
        emit(
            tx,
            Sample::gauge(
                c.channels.clone(),
                info.num_active_channels as f64,
                vec!["active".to_string()],
            ),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(
                c.channels.clone(),
                info.num_pending_channels as f64,
                vec!["pending".to_string()],
            ),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(
                c.channels.clone(),
                info.num_inactive_channels as f64,
                vec!["inactive".to_string()],
            ),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(c.block_height.clone(), info.block_height as f64, vec![]),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(
                c.synced_to_chain.clone(),
                if info.synced_to_chain { 1.0 } else { 0.0 },
                vec![],
            ),
        )
        .await?;

        Ok(ProbeOutcome::Collected { samples: 7 })
    }

    async fn probe_wallet_balance(
        &self,
        session: &mut ScrapeSession<C::Client>,
        tx: &mpsc::Sender<Sample>,
    ) -> Result<ProbeOutcome, Cancelled> {
        let balance =
            match classify(timeout_at(session.deadline, session.client.wallet_balance()).await) {
                Ok(balance) => balance,
                Err(cause) => return Ok(ProbeOutcome::Skipped { cause }),
            };

        let c = &self.catalog;
        emit(
            tx,
            Sample::gauge(
                c.wallet_balance.clone(),
                balance.unconfirmed_balance as f64,
                vec!["unconfirmed".to_string()],
            ),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(
                c.wallet_balance.clone(),
                balance.confirmed_balance as f64,
                vec!["confirmed".to_string()],
            ),
        )
        .await?;

        Ok(ProbeOutcome::Collected { samples: 2 })
    }

    async fn probe_pending_channels(
        &self,
        session: &mut ScrapeSession<C::Client>,
        tx: &mpsc::Sender<Sample>,
    ) -> Result<ProbeOutcome, Cancelled> {
        let pending =
            match classify(timeout_at(session.deadline, session.client.pending_channels()).await) {
                Ok(pending) => pending,
                Err(cause) => return Ok(ProbeOutcome::Skipped { cause }),
            };

        let c = &self.catalog;
        emit(
            tx,
            Sample::gauge(
                c.limbo_balance.clone(),
                pending.total_limbo_balance as f64,
                vec![],
            ),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(
                c.channels_pending.clone(),
                pending.pending_open_channels.len() as f64,
                vec!["opening".to_string(), "false".to_string()],
            ),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(
                c.channels_pending.clone(),
                pending.pending_closing_channels.len() as f64,
                vec!["closing".to_string(), "false".to_string()],
            ),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(
                c.channels_pending.clone(),
                pending.pending_force_closing_channels.len() as f64,
                vec!["closing".to_string(), "true".to_string()],
            ),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(
                c.channels_waiting_close.clone(),
                pending.waiting_close_channels.len() as f64,
                vec![],
            ),
        )
        .await?;

        Ok(ProbeOutcome::Collected { samples: 5 })
    }

    async fn probe_channel_balance(
        &self,
        session: &mut ScrapeSession<C::Client>,
        tx: &mpsc::Sender<Sample>,
    ) -> Result<ProbeOutcome, Cancelled> {
        let balance =
            match classify(timeout_at(session.deadline, session.client.channel_balance()).await) {
                Ok(balance) => balance,
                Err(cause) => return Ok(ProbeOutcome::Skipped { cause }),
            };

        emit(
            tx,
            Sample::gauge(
                self.catalog.channels_balance.clone(),
                balance.balance as f64,
                vec![],
            ),
        )
        .await?;

        Ok(ProbeOutcome::Collected { samples: 1 })
    }

    async fn probe_forwarding_history(
        &self,
        session: &mut ScrapeSession<C::Client>,
        tx: &mpsc::Sender<Sample>,
    ) -> Result<ProbeOutcome, Cancelled> {
        let history = match classify(
            timeout_at(session.deadline, session.client.forwarding_history()).await,
        ) {
            Ok(history) => history,
            Err(cause) => return Ok(ProbeOutcome::Skipped { cause }),
        };

        let mut emitted = 0;
        for event in history.forwarding_events {
            emit(
                tx,
                Sample::gauge(
                    self.catalog.forwarding_history_info.clone(),
                    1.0,
                    vec![
                        event.peer_alias_in,
                        event.peer_alias_out,
                        event.amt_in.to_string(),
                        event.amt_out.to_string(),
                        event.fee.to_string(),
                        event.chan_id_in.to_string(),
                        event.chan_id_out.to_string(),
                        event.timestamp_ns.to_string(),
                    ],
                ),
            )
            .await?;
            emitted += 1;
        }

        Ok(ProbeOutcome::Collected { samples: emitted })
    }

    async fn probe_network_info(
        &self,
        session: &mut ScrapeSession<C::Client>,
        tx: &mpsc::Sender<Sample>,
    ) -> Result<ProbeOutcome, Cancelled> {
        let network =
            match classify(timeout_at(session.deadline, session.client.get_network_info()).await) {
                Ok(network) => network,
                Err(cause) => return Ok(ProbeOutcome::Skipped { cause }),
            };

        let c = &self.catalog;
        emit(
            tx,
            Sample::gauge(
                c.network_capacity.clone(),
                network.total_network_capacity as f64,
                vec![],
            ),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(c.network_channels.clone(), network.num_channels as f64, vec![]),
        )
        .await?;
        emit(
            tx,
            Sample::gauge(c.network_nodes.clone(), network.num_nodes as f64, vec![]),
        )
        .await?;

        Ok(ProbeOutcome::Collected { samples: 3 })
    }

    async fn probe_channel_list(
        &self,
        session: &mut ScrapeSession<C::Client>,
        tx: &mpsc::Sender<Sample>,
    ) -> Result<ProbeOutcome, Cancelled> {
        let list =
            match classify(timeout_at(session.deadline, session.client.list_channels()).await) {
                Ok(list) => list,
                Err(cause) => return Ok(ProbeOutcome::Skipped { cause }),
            };

        let mut emitted = 0;
        for channel in list.channels {
            let labels = vec![
                channel.active.to_string(),
                channel.remote_pubkey,
                channel.channel_point,
                channel.chan_id.to_string(),
                channel.capacity.to_string(),
                channel.commit_fee.to_string(),
                channel.private.to_string(),
                channel.initiator.to_string(),
            ];

            // The commit fee is carved out of the capacity; only a strictly
            // positive remainder yields a meaningful ratio.
            let usable_capacity = channel.capacity as f64 - channel.commit_fee as f64;
            if usable_capacity > 0.0 {
                emit(
                    tx,
                    Sample::gauge(
                        self.catalog.channel_balance_ratio.clone(),
                        channel.local_balance as f64 / usable_capacity,
                        labels.clone(),
                    ),
                )
                .await?;
                emitted += 1;
            }

            emit(
                tx,
                Sample::gauge(
                    self.catalog.channel_balance.clone(),
                    channel.local_balance as f64,
                    labels,
                ),
            )
            .await?;
            emitted += 1;
        }

        Ok(ProbeOutcome::Collected { samples: emitted })
    }

    async fn probe_peer_list(
        &self,
        session: &mut ScrapeSession<C::Client>,
        tx: &mpsc::Sender<Sample>,
    ) -> Result<ProbeOutcome, Cancelled> {
        let list = match classify(timeout_at(session.deadline, session.client.list_peers()).await) {
            Ok(list) => list,
            Err(cause) => return Ok(ProbeOutcome::Skipped { cause }),
        };

        let c = &self.catalog;
        let mut emitted = 0;
        for peer in list.peers {
            let direction = if peer.inbound { "inbound" } else { "outbound" };
            emit(
                tx,
                Sample::gauge(
                    c.peer_info.clone(),
                    1.0,
                    vec![
                        peer.address.clone(),
                        peer.pub_key,
                        direction.to_string(),
                    ],
                ),
            )
            .await?;
            emit(
                tx,
                Sample::counter(
                    c.peer_recv_bytes.clone(),
                    peer.bytes_recv as f64,
                    vec![peer.address.clone()],
                ),
            )
            .await?;
            emit(
                tx,
                Sample::counter(
                    c.peer_sent_bytes.clone(),
                    peer.bytes_sent as f64,
                    vec![peer.address],
                ),
            )
            .await?;
            emitted += 3;
        }

        Ok(ProbeOutcome::Collected { samples: emitted })
    }
}

impl<C> LightningCollector<C>
where
    C: NodeConnector + 'static,
    C::Client: 'static,
{
    /// One scrape: a lazy, finite, non-restartable sample stream. Dropping
    /// the stream cancels the remaining probe sequence; samples already
    /// yielded stand.
    pub fn collect(&self) -> ReceiverStream<Sample> {
        let (tx, rx) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
        let collector = self.clone();
        tokio::spawn(async move {
            let report = collector.scrape(tx).await;
            report.log();
        });
        ReceiverStream::new(rx)
    }
}
