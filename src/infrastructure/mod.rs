//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Logging: Subscriber and log file setup
//! - Database: Chat persistence
//! - Adapters: Platform integrations (Telegram)
//! - gRPC: The RPC surface

pub mod adapters;
pub mod config;
pub mod database;
pub mod grpc;
pub mod logging;
