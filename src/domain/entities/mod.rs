//! Domain entities - Core business objects with no external dependencies

pub mod chat;
pub mod command;
pub mod message;

pub use chat::{ChatFilter, ChatIdentity};
pub use command::{Command, CommandHandler, CommandRegistry};
pub use message::{ChatKind, InboundEvent, OutboundReply, Sender};
