use async_trait::async_trait;
use tonic::metadata::AsciiMetadataValue;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint};
use tracing::debug;

use crate::lnrpc::{LightningClient, NodeConnector};
use crate::{ExporterError, Result};

/// Loads the node's TLS certificate and read-only macaroon from disk and
/// dials the RPC endpoint. Credentials are re-read on every connect so a
/// rotated macaroon is picked up without a restart.
pub struct GrpcConnector {
    rpc_addr: String,
    tls_cert_path: String,
    macaroon_path: String,
}

impl GrpcConnector {
    pub fn new(rpc_addr: String, tls_cert_path: String, macaroon_path: String) -> Self {
        Self {
            rpc_addr,
            tls_cert_path,
            macaroon_path,
        }
    }

    async fn load_macaroon(&self) -> Result<AsciiMetadataValue> {
        let bytes = tokio::fs::read(&self.macaroon_path)
            .await
            .map_err(|source| ExporterError::Macaroon {
                path: self.macaroon_path.clone(),
                source,
            })?;

        AsciiMetadataValue::try_from(hex::encode(bytes))
            .map_err(|e| ExporterError::InvalidCredential(e.to_string()))
    }

    async fn dial(&self) -> Result<Channel> {
        let pem = tokio::fs::read(&self.tls_cert_path)
            .await
            .map_err(|source| ExporterError::TlsCertificate {
                path: self.tls_cert_path.clone(),
                source,
            })?;

        let tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(pem));

        let dial_err = |e: tonic::transport::Error| ExporterError::Dial {
            addr: self.rpc_addr.clone(),
            reason: e.to_string(),
        };

        let endpoint = Endpoint::from_shared(format!("https://{}", self.rpc_addr))
            .map_err(dial_err)?
            .tls_config(tls)
            .map_err(dial_err)?;

        debug!("Dialing {}", self.rpc_addr);
        endpoint.connect().await.map_err(dial_err)
    }
}

#[async_trait]
impl NodeConnector for GrpcConnector {
    type Client = LightningClient;

    async fn connect(&self) -> Result<LightningClient> {
        let macaroon = self.load_macaroon().await?;
        let channel = self.dial().await?;
        Ok(LightningClient::new(channel, macaroon))
    }
}
