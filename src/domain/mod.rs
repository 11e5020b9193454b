//! Domain layer - Core business objects with no I/O
//!
//! This layer contains:
//! - Entities: Known chats, inbound events, commands
//! - Traits: Ports for the messaging transport and chat persistence

pub mod entities;
pub mod traits;
