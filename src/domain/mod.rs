//! Domain logic and core data structures
//!
//! This module contains the pure bead-state logic. Nothing here talks to
//! the arithmetic engine or touches the filesystem.

pub mod columns;
pub mod core;
pub mod interpreter;
pub mod legend;
pub mod phrase;
pub mod selection;

use thiserror::Error;

/// Malformed input to a public domain operation
///
/// These are contract violations by the caller, never user errors that
/// should be absorbed silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("steps must be at least 1 (got {steps})")]
    ZeroSteps { steps: u32 },
    #[error("base must be at least 2 (got {base})")]
    BaseTooSmall { base: u32 },
    #[error("base must be at most {max} (got {base})")]
    BaseTooLarge { base: u32, max: u32 },
    #[error("shifting row {row} up by {steps} leaves the row range")]
    RowOverflow { row: u32, steps: u32 },
    #[error("{what} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },
}

/// Checks the `steps >= 1` precondition shared by shift and engine operations
pub fn require_steps(steps: u32) -> Result<u32, ValidationError> {
    if steps == 0 {
        return Err(ValidationError::ZeroSteps { steps });
    }
    Ok(steps)
}

/// Largest supported base; the grid is at most `MAX_BASE - 1` cells wide
pub const MAX_BASE: u32 = 1024;

/// Checks the `2 <= base <= MAX_BASE` precondition for grid (re)initialization
pub fn require_base(base: u32) -> Result<u32, ValidationError> {
    if base < 2 {
        return Err(ValidationError::BaseTooSmall { base });
    }
    if base > MAX_BASE {
        return Err(ValidationError::BaseTooLarge {
            base,
            max: MAX_BASE,
        });
    }
    Ok(base)
}
