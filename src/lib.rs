//! bidoof-bot - a Telegram bot with a supervised task core and a gRPC facade
//!
//! Inbound chat updates are parsed into commands and run as deadline-bound,
//! fault-contained tasks. The same supervisor wraps every RPC call that
//! reaches the messaging API or the chat store.

pub mod application;
pub mod domain;
pub mod infrastructure;
