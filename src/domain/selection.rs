//! Row selection mask and manual-text scoring
//!
//! A row is selected when the base grid holds at least one bead there.
//! Text typed against a row scores one point per character, but only while
//! the row is selected. Text typed against an unselected row is kept so it
//! counts again once the row fills.

use crate::domain::ValidationError;
use crate::domain::core::BaseRow;

/// Per-row selection flags in visual order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionMask {
    selected: Vec<bool>,
}

impl SelectionMask {
    /// Derives the mask from the visible rows
    ///
    /// # Example
    /// ```rust
    /// use bead_abacus::domain::core::BaseRow;
    /// use bead_abacus::domain::selection::SelectionMask;
    ///
    /// let mask = SelectionMask::compute(&[BaseRow::new(1, 0), BaseRow::new(0, 2)]);
    /// assert_eq!(mask.flags(), &[false, true]);
    /// ```
    pub fn compute(rows: &[BaseRow]) -> Self {
        Self {
            selected: rows.iter().map(BaseRow::is_occupied).collect(),
        }
    }

    pub fn from_flags(selected: Vec<bool>) -> Self {
        Self { selected }
    }

    pub fn flags(&self) -> &[bool] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Returns true if the row at `index` (visual order) is selected
    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    /// Number of selected rows
    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|&&s| s).count()
    }
}

/// Manually typed text, one entry per visible row
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualRowText {
    rows: Vec<String>,
}

impl ManualRowText {
    /// Creates blank entries for a window of `len` rows
    pub fn with_len(len: usize) -> Self {
        Self {
            rows: vec![String::new(); len],
        }
    }

    pub fn from_rows<I, S>(rows: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows.into_iter().map(Into::into).collect(),
        }
    }

    pub fn rows(&self) -> &[String] {
        &self.rows
    }

    /// Text at a row, empty if never written
    pub fn text(&self, index: usize) -> &str {
        self.rows.get(index).map_or("", String::as_str)
    }

    /// Replaces the text of one row
    ///
    /// # Arguments
    /// * `index` - Row in visual order
    /// * `text` - New text, may be empty
    pub fn set(&mut self, index: usize, text: impl Into<String>) -> Result<(), ValidationError> {
        let len = self.rows.len();
        let slot = self
            .rows
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfRange {
                what: "manual row",
                index,
                len,
            })?;
        *slot = text.into();
        Ok(())
    }
}

/// Scores manual text against a mask
///
/// Sums the character counts of every selected row. Rows missing from
/// `manual` count as empty.
///
/// # Returns
/// Total number of characters typed in selected rows
pub fn score(manual: &ManualRowText, mask: &SelectionMask) -> usize {
    mask.flags()
        .iter()
        .enumerate()
        .filter(|(_, selected)| **selected)
        .map(|(index, _)| manual.text(index).chars().count())
        .sum()
}
