//! In-process engine following the reference server's grid rules
//!
//! Used for offline sessions and as the engine behind controller tests.
//! The grid has `width = base - 1` cells per row; counts saturate at the
//! width and empty rows are dropped from the row list.

use std::collections::BTreeMap;

use crate::domain::MAX_BASE;
use crate::domain::core::GridSnapshot;
use crate::engine::{ArithmeticEngine, EngineCallError, EngineErrorKind, EngineOp};

/// Default base of a freshly started engine
pub const DEFAULT_BASE: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEngine {
    width: u32,
    divider: u32,
    rows: BTreeMap<u32, u32>,
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::with_base(DEFAULT_BASE)
    }
}

impl LocalEngine {
    /// Creates an empty grid for `base`, clamped into `2..=MAX_BASE`
    pub fn with_base(base: u32) -> Self {
        let width = base.clamp(2, MAX_BASE) - 1;
        Self {
            width,
            divider: width,
            rows: BTreeMap::new(),
        }
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot {
            width: self.width,
            divider: Some(self.divider),
            rows: self.rows.iter().map(|(&y, &count)| (y, count)).collect(),
        }
    }

    fn compact(&mut self) {
        self.rows.retain(|_, count| *count > 0);
    }

    fn reset_divider(&mut self) {
        self.divider = self.width;
    }

    fn add_beads(&mut self, row: u32, weight: u32) {
        self.reset_divider();
        let count = self.rows.entry(row).or_insert(0);
        *count = count.saturating_add(weight).min(self.width);
        self.compact();
    }

    fn sub_beads(&mut self, row: u32, weight: u32) {
        self.reset_divider();
        let count = self.rows.entry(row).or_insert(0);
        *count = count.saturating_sub(weight);
        self.compact();
    }

    fn all_full(&self) -> bool {
        !self.rows.is_empty() && self.rows.values().all(|&count| count == self.width)
    }

    fn double(&mut self, steps: u32) -> Result<(), String> {
        for _ in 0..steps {
            self.reset_divider();
            if self.all_full() {
                // full rows move up one position instead of doubling
                if let Some(&top) = self.rows.keys().next_back() {
                    if top == u32::MAX {
                        return Err(format!("row {top} is full and cannot move up"));
                    }
                }
                self.rows = self.rows.iter().map(|(&y, &count)| (y + 1, count)).collect();
            } else {
                let width = self.width;
                for count in self.rows.values_mut() {
                    *count = count.saturating_mul(2).min(width);
                }
            }
            self.compact();
        }
        Ok(())
    }

    fn halve(&mut self, steps: u32) {
        for _ in 0..steps {
            if self.rows.is_empty() {
                self.reset_divider();
                return;
            }
            if self.rows.values().any(|&count| count >= 2) {
                self.divider = (self.divider / 2).max(1);
                let divider = self.divider;
                for count in self.rows.values_mut() {
                    *count = (*count).min(divider);
                }
                self.compact();
            } else {
                // single beads shift down until one reaches row 0
                if self.rows.keys().next() == Some(&0) {
                    break;
                }
                self.rows = self.rows.iter().map(|(&y, &count)| (y - 1, count)).collect();
            }
        }
    }

    fn convert_base(&mut self, base: u32) {
        let width = base.clamp(2, MAX_BASE) - 1;
        for count in self.rows.values_mut() {
            *count = (*count).min(width);
        }
        self.width = width;
        self.divider = width;
        self.compact();
    }
}

impl ArithmeticEngine for LocalEngine {
    /// Applies one operation; a rejected operation leaves the grid as it was
    fn execute(&mut self, op: EngineOp) -> Result<GridSnapshot, EngineCallError> {
        match op {
            EngineOp::State => {}
            EngineOp::Init { base } => *self = Self::with_base(base),
            EngineOp::Add { row, weight } => self.add_beads(row, weight),
            EngineOp::Sub { row, weight } => self.sub_beads(row, weight),
            EngineOp::Mul2 { steps } => {
                let before = self.clone();
                if let Err(reason) = self.double(steps) {
                    *self = before;
                    return Err(EngineCallError::new(op, EngineErrorKind::Rejected(reason)));
                }
            }
            EngineOp::Div2 { steps } => self.halve(steps),
            EngineOp::Convert { base } => self.convert_base(base),
        }
        Ok(self.snapshot())
    }
}
