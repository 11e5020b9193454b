//! Message handling - Event-driven update processing

pub mod context;
pub mod dispatcher;
pub mod parser;

pub use context::CommandContext;
pub use dispatcher::{UpdateDispatcher, UpdateOutcome};
pub use parser::{parse_arguments, parse_command, ParsedCommand};
