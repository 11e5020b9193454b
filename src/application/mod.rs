//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Errors: Domain-specific errors
//! - Supervisor: Deadline-bound, fault-contained task execution
//! - Messaging: Argument parsing and update dispatching
//! - Services: Chat gateway, bot commands, RPC facade

pub mod errors;
pub mod messaging;
pub mod services;
pub mod supervisor;
