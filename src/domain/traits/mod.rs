//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod store;

pub use bot::{Bot, BotCommand, BotInfo, CommandScope, DeliveryReceipt, ParseMode};
pub use store::ChatStore;
