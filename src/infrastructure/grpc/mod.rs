//! gRPC surface for the RPC facade

use std::net::SocketAddr;

use tokio_util::sync::CancellationToken;
use tonic::{Request, Response, Status};

use crate::application::errors::{RpcError, RpcErrorKind};
use crate::application::services::rpc_service::filter_from_request;
use crate::application::services::RpcService;

pub mod proto {
    tonic::include_proto!("telegram.v1");
}

use proto::telegram_service_server::{TelegramService, TelegramServiceServer};
use proto::{
    BotStatusRequest, BotStatusResponse, ChatData, GetPrivateChatRequest, GetPrivateChatResponse,
    SendMessageRequest, SendMessageResponse,
};

/// Fully qualified service name, as callers see it
pub const SERVICE_NAME: &str = "telegram.v1.TelegramService";

impl From<RpcError> for Status {
    fn from(err: RpcError) -> Self {
        match err.kind {
            RpcErrorKind::InvalidArgument => Status::invalid_argument(err.message),
            RpcErrorKind::NotFound => Status::not_found(err.message),
            RpcErrorKind::DeadlineExceeded => Status::deadline_exceeded(err.message),
            RpcErrorKind::Canceled => Status::cancelled(err.message),
            RpcErrorKind::Internal => Status::internal(err.message),
            RpcErrorKind::Aborted => Status::aborted(err.message),
        }
    }
}

#[derive(Clone)]
pub struct GrpcApi {
    service: RpcService,
}

impl GrpcApi {
    pub fn new(service: RpcService) -> Self {
        Self { service }
    }

    pub fn into_server(self) -> TelegramServiceServer<Self> {
        TelegramServiceServer::new(self)
    }
}

#[tonic::async_trait]
impl TelegramService for GrpcApi {
    async fn bot_status(
        &self,
        _request: Request<BotStatusRequest>,
    ) -> Result<Response<BotStatusResponse>, Status> {
        let info = self.service.bot_status().await?;
        Ok(Response::new(BotStatusResponse {
            id: info.id,
            is_bot: info.is_bot,
            first_name: info.first_name,
            username: info.username,
            can_join_groups: info.can_join_groups,
            can_read_all_group_messages: info.can_read_all_group_messages,
            supports_inline_queries: info.supports_inline_queries,
        }))
    }

    async fn send_message(
        &self,
        request: Request<SendMessageRequest>,
    ) -> Result<Response<SendMessageResponse>, Status> {
        let req = request.into_inner();
        let receipt = self
            .service
            .send_message(req.chat_id, &req.text, req.use_markdown)
            .await?;
        Ok(Response::new(SendMessageResponse {
            message_id: receipt.message_id,
            chat_id: req.chat_id,
            recipient: receipt.recipient,
        }))
    }

    async fn get_private_chat(
        &self,
        request: Request<GetPrivateChatRequest>,
    ) -> Result<Response<GetPrivateChatResponse>, Status> {
        let req = request.into_inner();
        let filter = filter_from_request(&req.filter_chat_id, &req.filter_username)?;
        let chats = self.service.known_chats(filter).await?;

        let data: Vec<ChatData> = chats
            .into_iter()
            .map(|chat| ChatData {
                chat_id: chat.chat_id,
                username: chat.username,
                display_name: chat.display_name,
                bio: chat.bio,
            })
            .collect();
        Ok(Response::new(GetPrivateChatResponse {
            count: data.len() as u64,
            data,
        }))
    }
}

/// Serve the facade on `addr` until `shutdown` fires.
pub async fn serve(
    addr: SocketAddr,
    api: GrpcApi,
    shutdown: CancellationToken,
) -> Result<(), tonic::transport::Error> {
    tracing::info!(%addr, service = SERVICE_NAME, "Starting gRPC server");
    tonic::transport::Server::builder()
        .add_service(api.into_server())
        .serve_with_shutdown(addr, async move { shutdown.cancelled().await })
        .await?;
    tracing::info!("gRPC server stopped");
    Ok(())
}
