//! Application services - Business logic orchestration

pub mod chat_gateway;
pub mod command_service;
pub mod rpc_service;

pub use chat_gateway::{escape_markdown, ChatGateway};
pub use command_service::{CommandService, HELLO_USAGE, REGISTER_COMMAND};
pub use rpc_service::{sanitize_markup, RpcService};
