use async_trait::async_trait;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::metadata::AsciiMetadataValue;
use tonic::transport::Channel;
use tonic::Status;

use crate::lnrpc::wire::{
    ChannelBalanceRequest, ChannelBalanceResponse, ForwardingHistoryRequest,
    ForwardingHistoryResponse, GetInfoRequest, GetInfoResponse, ListChannelsRequest,
    ListChannelsResponse, ListPeersRequest, ListPeersResponse, NetworkInfo, NetworkInfoRequest,
    PendingChannelsRequest, PendingChannelsResponse, WalletBalanceRequest, WalletBalanceResponse,
};
use crate::lnrpc::LightningRpc;

/// Largest message the client will accept (~50 MiB); graph-wide responses
/// from big nodes exceed tonic's 4 MiB default.
pub const MAX_RECV_MSG_SIZE: usize = 50 * 1024 * 1024;

/// Unary gRPC client for `lnrpc.Lightning`, authenticating every call with
/// the macaroon metadata header over the TLS channel it was built with.
pub struct LightningClient {
    inner: tonic::client::Grpc<Channel>,
    macaroon: AsciiMetadataValue,
}

impl LightningClient {
    pub fn new(channel: Channel, macaroon: AsciiMetadataValue) -> Self {
        let inner = tonic::client::Grpc::new(channel).max_decoding_message_size(MAX_RECV_MSG_SIZE);
        Self { inner, macaroon }
    }

    async fn unary<Req, Resp>(&mut self, path: &'static str, request: Req) -> Result<Resp, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        self.inner
            .ready()
            .await
            .map_err(|e| Status::unknown(format!("service was not ready: {}", e)))?;

        let codec: ProstCodec<Req, Resp> = ProstCodec::default();
        let mut request = tonic::Request::new(request);
        request
            .metadata_mut()
            .insert("macaroon", self.macaroon.clone());

        let response = self
            .inner
            .unary(request, PathAndQuery::from_static(path), codec)
            .await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl LightningRpc for LightningClient {
    async fn get_info(&mut self) -> Result<GetInfoResponse, Status> {
        self.unary("/lnrpc.Lightning/GetInfo", GetInfoRequest::default())
            .await
    }

    async fn wallet_balance(&mut self) -> Result<WalletBalanceResponse, Status> {
        self.unary(
            "/lnrpc.Lightning/WalletBalance",
            WalletBalanceRequest::default(),
        )
        .await
    }

    async fn pending_channels(&mut self) -> Result<PendingChannelsResponse, Status> {
        self.unary(
            "/lnrpc.Lightning/PendingChannels",
            PendingChannelsRequest::default(),
        )
        .await
    }

    async fn channel_balance(&mut self) -> Result<ChannelBalanceResponse, Status> {
        self.unary(
            "/lnrpc.Lightning/ChannelBalance",
            ChannelBalanceRequest::default(),
        )
        .await
    }

    async fn forwarding_history(&mut self) -> Result<ForwardingHistoryResponse, Status> {
        self.unary(
            "/lnrpc.Lightning/ForwardingHistory",
            ForwardingHistoryRequest::default(),
        )
        .await
    }

    async fn get_network_info(&mut self) -> Result<NetworkInfo, Status> {
        self.unary(
            "/lnrpc.Lightning/GetNetworkInfo",
            NetworkInfoRequest::default(),
        )
        .await
    }

    async fn list_channels(&mut self) -> Result<ListChannelsResponse, Status> {
        self.unary(
            "/lnrpc.Lightning/ListChannels",
            ListChannelsRequest::default(),
        )
        .await
    }

    async fn list_peers(&mut self) -> Result<ListPeersResponse, Status> {
        self.unary("/lnrpc.Lightning/ListPeers", ListPeersRequest::default())
            .await
    }
}
