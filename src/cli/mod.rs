use clap::Parser;

/// Every flag has an environment-variable default; the flag wins when both
/// are set.
#[derive(Parser, Debug, Clone)]
#[command(name = "lnd-exporter")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Prometheus exporter for Lightning Network daemon (lnd) nodes", long_about = None)]
pub struct Cli {
    /// The namespace or prefix to use in the exported metrics
    #[arg(long, env = "NAMESPACE", default_value = "lnd")]
    pub namespace: String,

    /// An address to listen on for web interface and telemetry
    #[arg(long = "web.listen-address", env = "LISTEN_ADDRESS", default_value = "0.0.0.0:9113")]
    pub listen_address: String,

    /// A path under which to expose metrics
    #[arg(long = "web.telemetry-path", env = "TELEMETRY_PATH", default_value = "/metrics")]
    pub telemetry_path: String,

    /// Lightning node RPC host
    #[arg(long = "rpc.addr", env = "RPC_ADDR", default_value = "localhost:10009")]
    pub rpc_addr: String,

    /// The path to the node's TLS certificate
    #[arg(long = "lnd.tls-cert-path", env = "TLS_CERT_PATH", default_value = "/root/.lnd/tls.cert")]
    pub tls_cert_path: String,

    /// The path to the read-only macaroon
    #[arg(long = "lnd.macaroon-path", env = "MACAROON_PATH", default_value = "")]
    pub macaroon_path: String,

    /// Expose process metrics alongside the node metrics
    #[arg(long = "process-metrics", env = "PROCESS_METRICS")]
    pub process_metrics: bool,

    /// Export one sample per peer (high cardinality on well-connected nodes)
    #[arg(
        long = "peer-metrics",
        env = "PEER_METRICS",
        default_value_t = true,
        num_args = 0..=1,
        default_missing_value = "true",
        action = clap::ArgAction::Set
    )]
    pub peer_metrics: bool,

    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,
}
