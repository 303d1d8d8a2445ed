use clap::Parser;
use lnd_exporter::cli::Cli;
use lnd_exporter::lnrpc::GrpcConnector;
use lnd_exporter::metrics::LightningCollector;
use lnd_exporter::server::{self, AppState};
use std::process;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Starting lnd-exporter v{}", env!("CARGO_PKG_VERSION"));

    // Startup failures are the only fatal condition; once serving, scrape
    // errors surface as metric content instead.
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if !cli.telemetry_path.starts_with('/') {
        return Err(lnd_exporter::ExporterError::ConfigError(format!(
            "telemetry path must start with '/': {}",
            cli.telemetry_path
        ))
        .into());
    }

    let connector = GrpcConnector::new(
        cli.rpc_addr.clone(),
        cli.tls_cert_path.clone(),
        cli.macaroon_path.clone(),
    );
    let collector = LightningCollector::new(&cli.namespace, connector, cli.peer_metrics);

    let process_registry = if cli.process_metrics {
        server::process_registry()
    } else {
        None
    };

    let state = Arc::new(AppState::new(
        collector,
        process_registry,
        cli.telemetry_path.clone(),
    ));
    let app = server::create_router(state);

    let listener = tokio::net::TcpListener::bind(&cli.listen_address).await?;
    info!(
        "Listening on http://{}{}",
        cli.listen_address, cli.telemetry_path
    );
    axum::serve(listener, app).await?;

    Ok(())
}
