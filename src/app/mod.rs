//! Application orchestration layer
//!
//! This module owns the per-session state, parses user commands, runs the
//! merge pipeline and dispatches everything through the controller.

pub mod controller;
pub mod merge;
pub mod session;
pub mod state;

pub use controller::{AppError, Outcome, SessionController};
pub use session::{AbacusSession, SessionSummary};
pub use state::{Command, ParseError};
