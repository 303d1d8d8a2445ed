//! Typed client for the node's `lnrpc.Lightning` gRPC interface.
//!
//! The collector only ever consumes this interface; [`LightningRpc`] is the
//! seam tests substitute, [`NodeConnector`] covers credential loading and
//! dialing.

pub mod client;
pub mod connect;
pub mod wire;

pub use client::LightningClient;
pub use connect::GrpcConnector;

use async_trait::async_trait;
use tonic::Status;

use crate::Result;
use wire::{
    ChannelBalanceResponse, ForwardingHistoryResponse, GetInfoResponse, ListChannelsResponse,
    ListPeersResponse, NetworkInfo, PendingChannelsResponse, WalletBalanceResponse,
};

/// The read-only RPC surface the collector probes. One method per upstream
/// call, all issued with default (non-paginated) requests.
#[async_trait]
pub trait LightningRpc: Send {
    async fn get_info(&mut self) -> std::result::Result<GetInfoResponse, Status>;
    async fn wallet_balance(&mut self) -> std::result::Result<WalletBalanceResponse, Status>;
    async fn pending_channels(&mut self) -> std::result::Result<PendingChannelsResponse, Status>;
    async fn channel_balance(&mut self) -> std::result::Result<ChannelBalanceResponse, Status>;
    async fn forwarding_history(&mut self)
        -> std::result::Result<ForwardingHistoryResponse, Status>;
    async fn get_network_info(&mut self) -> std::result::Result<NetworkInfo, Status>;
    async fn list_channels(&mut self) -> std::result::Result<ListChannelsResponse, Status>;
    async fn list_peers(&mut self) -> std::result::Result<ListPeersResponse, Status>;
}

/// Produces a fresh connected client for one scrape session. The connection
/// is closed when the client is dropped at session end.
#[async_trait]
pub trait NodeConnector: Send + Sync {
    type Client: LightningRpc + Send;

    async fn connect(&self) -> Result<Self::Client>;
}
