//! Independent, carry-free binary bead columns
//!
//! Each column is a set of occupied row positions. A row holds at most one
//! bead per column and nothing ever carries between rows or columns, so
//! doubling and halving are plain shifts of the set. Aggregation across
//! columns only happens in [`BinaryColumnStore::count_by_row`].

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::domain::{ValidationError, require_steps};

/// Errors raised by column operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColumnError {
    /// No column carries the requested id
    #[error("no binary column with id {id}")]
    NotFound { id: u32 },
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A single binary bead column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeadColumn {
    id: u32,
    beads: BTreeSet<u32>,
}

impl BeadColumn {
    /// Creates an empty column with the given id
    pub fn new(id: u32) -> Self {
        Self {
            id,
            beads: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Occupied rows, ascending
    pub fn beads(&self) -> &BTreeSet<u32> {
        &self.beads
    }

    pub fn has_bead(&self, row: u32) -> bool {
        self.beads.contains(&row)
    }

    fn replace_rows(&mut self, map: impl Fn(u32) -> u32) {
        // Rebuild rather than mutate in place: colliding destinations collapse
        self.beads = self.beads.iter().map(|&row| map(row)).collect();
    }
}

/// Ordered collection of binary columns owned by one session
///
/// The collection is never empty. A fresh or reset store holds exactly one
/// empty column with id 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryColumnStore {
    columns: Vec<BeadColumn>,
}

impl Default for BinaryColumnStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BinaryColumnStore {
    /// Id given to the single column of a reset store
    pub const INITIAL_ID: u32 = 1;

    /// Creates the canonical store: one empty column with id 1
    ///
    /// # Example
    /// ```rust
    /// use bead_abacus::domain::columns::BinaryColumnStore;
    ///
    /// let store = BinaryColumnStore::new();
    /// assert_eq!(store.len(), 1);
    /// assert_eq!(store.total_bead_count(), 0);
    /// ```
    pub fn new() -> Self {
        Self {
            columns: vec![BeadColumn::new(Self::INITIAL_ID)],
        }
    }

    /// Columns in insertion order
    pub fn columns(&self) -> &[BeadColumn] {
        &self.columns
    }

    pub fn column(&self, id: u32) -> Option<&BeadColumn> {
        self.columns.iter().find(|column| column.id == id)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; present for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    fn column_mut(&mut self, id: u32) -> Result<&mut BeadColumn, ColumnError> {
        self.columns
            .iter_mut()
            .find(|column| column.id == id)
            .ok_or(ColumnError::NotFound { id })
    }

    /// Places a bead at row 0 (no-op if already present)
    pub fn increment(&mut self, id: u32) -> Result<(), ColumnError> {
        self.column_mut(id)?.beads.insert(0);
        Ok(())
    }

    /// Removes the bead at row 0 (no-op if absent)
    pub fn decrement(&mut self, id: u32) -> Result<(), ColumnError> {
        self.column_mut(id)?.beads.remove(&0);
        Ok(())
    }

    /// Moves every bead of the column up by `steps` rows (multiply by 2^steps)
    ///
    /// Fails without touching the column when the topmost bead would leave
    /// the `u32` row range.
    ///
    /// # Arguments
    /// * `id` - Target column
    /// * `steps` - Number of rows to shift, must be >= 1
    pub fn shift_up(&mut self, id: u32, steps: u32) -> Result<(), ColumnError> {
        let steps = require_steps(steps)?;
        let column = self.column_mut(id)?;
        if let Some(&top) = column.beads.last() {
            if top.checked_add(steps).is_none() {
                return Err(ValidationError::RowOverflow { row: top, steps }.into());
            }
        }
        column.replace_rows(|row| row + steps);
        Ok(())
    }

    /// Moves every bead of the column down by `steps` rows, flooring at row 0
    ///
    /// Beads that would fall below row 0 collapse onto it. Since a column
    /// is a set, several collapsed beads still count as one at row 0.
    ///
    /// # Arguments
    /// * `id` - Target column
    /// * `steps` - Number of rows to shift, must be >= 1
    pub fn shift_down(&mut self, id: u32, steps: u32) -> Result<(), ColumnError> {
        let steps = require_steps(steps)?;
        self.column_mut(id)?
            .replace_rows(|row| row.saturating_sub(steps));
        Ok(())
    }

    /// Appends an empty column and returns its id
    ///
    /// The id is one past the largest id currently in the store.
    pub fn add_column(&mut self) -> u32 {
        let id = self
            .columns
            .iter()
            .map(|column| column.id)
            .max()
            .map_or(Self::INITIAL_ID, |max| max + 1);
        self.columns.push(BeadColumn::new(id));
        id
    }

    /// Replaces the whole collection with the canonical single empty column
    pub fn reset_all(&mut self) {
        *self = Self::new();
    }

    /// Number of columns holding a bead at each occupied row, ascending by row
    ///
    /// This is the per-row weight folded into the base grid by a merge.
    pub fn count_by_row(&self) -> BTreeMap<u32, u32> {
        let mut weights = BTreeMap::new();
        for row in self.columns.iter().flat_map(|column| column.beads.iter()) {
            *weights.entry(*row).or_insert(0) += 1;
        }
        weights
    }

    /// Total number of beads across all columns
    pub fn total_bead_count(&self) -> usize {
        self.columns.iter().map(|column| column.beads.len()).sum()
    }
}
