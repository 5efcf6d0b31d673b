//! Boundary to the base-n arithmetic engine
//!
//! The engine owns the authoritative base grid and all carry handling.
//! Every operation returns a full grid snapshot which the session treats
//! as opaque and authoritative.

pub mod http;
pub mod local;

pub use http::HttpEngine;
pub use local::LocalEngine;

use std::fmt;

use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::core::GridSnapshot;
use crate::domain::{ValidationError, require_base, require_steps};

/// One request understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOp {
    State,
    Init { base: u32 },
    Add { row: u32, weight: u32 },
    Sub { row: u32, weight: u32 },
    Mul2 { steps: u32 },
    Div2 { steps: u32 },
    Convert { base: u32 },
}

impl EngineOp {
    /// Short operation name used in logs and errors
    pub fn name(&self) -> &'static str {
        match self {
            EngineOp::State => "state",
            EngineOp::Init { .. } => "init",
            EngineOp::Add { .. } => "add",
            EngineOp::Sub { .. } => "sub",
            EngineOp::Mul2 { .. } => "mul2",
            EngineOp::Div2 { .. } => "div2",
            EngineOp::Convert { .. } => "convert",
        }
    }

    /// Path below the engine namespace
    pub fn path(&self) -> String {
        format!("/{}", self.name())
    }

    /// Row the operation targets, if any
    pub fn row(&self) -> Option<u32> {
        match self {
            EngineOp::Add { row, .. } | EngineOp::Sub { row, .. } => Some(*row),
            _ => None,
        }
    }

    /// JSON request body; `None` for the read-only state query
    pub fn body(&self) -> Option<Value> {
        match *self {
            EngineOp::State => None,
            EngineOp::Init { base } | EngineOp::Convert { base } => Some(json!({ "base": base })),
            EngineOp::Add { row, weight } | EngineOp::Sub { row, weight } => {
                Some(json!({ "y": row, "k": weight }))
            }
            EngineOp::Mul2 { steps } | EngineOp::Div2 { steps } => Some(json!({ "steps": steps })),
        }
    }

    /// Rejects malformed operations before they reach the engine
    pub fn validate(&self) -> Result<(), ValidationError> {
        match *self {
            EngineOp::Init { base } | EngineOp::Convert { base } => require_base(base).map(|_| ()),
            EngineOp::Mul2 { steps } | EngineOp::Div2 { steps } => require_steps(steps).map(|_| ()),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for EngineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineOp::State => write!(f, "state"),
            EngineOp::Init { base } => write!(f, "init(base={base})"),
            EngineOp::Add { row, weight } => write!(f, "add(row={row}, weight={weight})"),
            EngineOp::Sub { row, weight } => write!(f, "sub(row={row}, weight={weight})"),
            EngineOp::Mul2 { steps } => write!(f, "mul2(steps={steps})"),
            EngineOp::Div2 { steps } => write!(f, "div2(steps={steps})"),
            EngineOp::Convert { base } => write!(f, "convert(base={base})"),
        }
    }
}

/// Why an engine call failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineErrorKind {
    #[error("engine answered with status {code}: {body}")]
    Status { code: u16, body: String },
    #[error("engine unreachable: {0}")]
    Transport(String),
    #[error("malformed engine response: {0}")]
    Decode(String),
    #[error("engine rejected the request: {0}")]
    Rejected(String),
}

/// A failed engine call, with enough context to retry it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("engine call {op} failed: {kind}")]
pub struct EngineCallError {
    pub op: EngineOp,
    pub kind: EngineErrorKind,
}

impl EngineCallError {
    pub fn new(op: EngineOp, kind: EngineErrorKind) -> Self {
        Self { op, kind }
    }

    /// Row of the failed request, when the operation targets one
    pub fn row(&self) -> Option<u32> {
        self.op.row()
    }
}

/// The external arithmetic engine
///
/// Implementors only need [`ArithmeticEngine::execute`]; the named
/// operations are conveniences over it.
pub trait ArithmeticEngine {
    /// Performs one request and returns the resulting grid snapshot
    fn execute(&mut self, op: EngineOp) -> Result<GridSnapshot, EngineCallError>;

    fn state(&mut self) -> Result<GridSnapshot, EngineCallError> {
        self.execute(EngineOp::State)
    }

    fn init(&mut self, base: u32) -> Result<GridSnapshot, EngineCallError> {
        self.execute(EngineOp::Init { base })
    }

    fn add(&mut self, row: u32, weight: u32) -> Result<GridSnapshot, EngineCallError> {
        self.execute(EngineOp::Add { row, weight })
    }

    fn sub(&mut self, row: u32, weight: u32) -> Result<GridSnapshot, EngineCallError> {
        self.execute(EngineOp::Sub { row, weight })
    }

    fn mul2(&mut self, steps: u32) -> Result<GridSnapshot, EngineCallError> {
        self.execute(EngineOp::Mul2 { steps })
    }

    fn div2(&mut self, steps: u32) -> Result<GridSnapshot, EngineCallError> {
        self.execute(EngineOp::Div2 { steps })
    }

    fn convert(&mut self, base: u32) -> Result<GridSnapshot, EngineCallError> {
        self.execute(EngineOp::Convert { base })
    }
}

impl<E: ArithmeticEngine + ?Sized> ArithmeticEngine for Box<E> {
    fn execute(&mut self, op: EngineOp) -> Result<GridSnapshot, EngineCallError> {
        (**self).execute(op)
    }
}
