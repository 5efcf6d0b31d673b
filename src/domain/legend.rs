//! User-editable symbol legend and its phrase table
//!
//! Slot 0 of the legend is the symbol for an empty row; slot `i >= 1` is
//! the symbol for a row holding `i` beads. The phrase table runs parallel
//! to the legend, one replacement string per slot.

use crate::domain::ValidationError;

/// Symbol legend, one optional character per slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Legend {
    slots: Vec<Option<char>>,
}

impl Legend {
    /// Creates an all-empty legend for a grid of the given width
    pub fn for_width(width: u32) -> Self {
        Self {
            slots: vec![None; width as usize + 1],
        }
    }

    /// Builds a legend from display strings, keeping the first character of each
    ///
    /// # Example
    /// ```rust
    /// use bead_abacus::domain::legend::Legend;
    ///
    /// let legend = Legend::from_symbols(["0", "A", "", "Cat"]);
    /// assert_eq!(legend.symbol(1), Some('A'));
    /// assert_eq!(legend.symbol(2), None);
    /// assert_eq!(legend.symbol(3), Some('C'));
    /// ```
    pub fn from_symbols<I, S>(symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            slots: symbols
                .into_iter()
                .map(|s| s.as_ref().chars().next())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Option<char>] {
        &self.slots
    }

    /// Symbol at a slot; `None` for an unset slot or one past the end
    pub fn symbol(&self, index: usize) -> Option<char> {
        self.slots.get(index).copied().flatten()
    }

    /// Truncates or pads the legend to `width + 1` slots
    ///
    /// Surviving slots keep their symbols; new slots start empty.
    pub fn resize_for_width(&mut self, width: u32) {
        self.slots.resize(width as usize + 1, None);
    }

    /// Edits one slot in place without shifting the others
    ///
    /// Only the first character of `text` is kept; empty text clears the slot.
    ///
    /// # Arguments
    /// * `index` - Slot to edit
    /// * `text` - New symbol text
    pub fn set(&mut self, index: usize, text: &str) -> Result<(), ValidationError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfRange {
                what: "legend",
                index,
                len,
            })?;
        *slot = text.chars().next();
        Ok(())
    }
}

/// Replacement phrases, one per legend slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhraseTable {
    phrases: Vec<String>,
}

impl PhraseTable {
    /// Creates a table of `len` blank phrases
    pub fn with_len(len: usize) -> Self {
        Self {
            phrases: vec![String::new(); len],
        }
    }

    pub fn from_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            phrases: phrases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }

    /// Phrase for a slot, empty if unset or out of range
    pub fn phrase(&self, index: usize) -> &str {
        self.phrases.get(index).map_or("", String::as_str)
    }

    /// Truncates or pads to `len`, preserving entries at surviving indices
    pub fn resize(&mut self, len: usize) {
        self.phrases.resize(len, String::new());
    }

    /// Replaces the phrase of a single slot
    pub fn set(&mut self, index: usize, phrase: impl Into<String>) -> Result<(), ValidationError> {
        let len = self.phrases.len();
        let slot = self
            .phrases
            .get_mut(index)
            .ok_or(ValidationError::IndexOutOfRange {
                what: "phrase",
                index,
                len,
            })?;
        *slot = phrase.into();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legend_length_tracks_width() {
        let mut legend = Legend::for_width(4);
        assert_eq!(legend.len(), 5);

        legend.set(4, "D").unwrap();
        legend.resize_for_width(2);
        assert_eq!(legend.len(), 3);

        legend.resize_for_width(4);
        assert_eq!(legend.len(), 5);
        // truncated slot does not come back
        assert_eq!(legend.symbol(4), None);
    }

    #[test]
    fn legend_edit_keeps_single_character_in_place() {
        let mut legend = Legend::from_symbols(["0", "A", "B"]);
        legend.set(1, "xyz").unwrap();

        assert_eq!(legend.slots(), &[Some('0'), Some('x'), Some('B')]);

        legend.set(2, "").unwrap();
        assert_eq!(legend.symbol(2), None);
    }

    #[test]
    fn legend_edit_out_of_range_fails() {
        let mut legend = Legend::for_width(1);
        let result = legend.set(2, "Z");
        assert_eq!(
            result,
            Err(ValidationError::IndexOutOfRange {
                what: "legend",
                index: 2,
                len: 2
            })
        );
    }

    #[test]
    fn phrase_table_resize_preserves_entries() {
        let mut table = PhraseTable::from_phrases(["zero", "one", "two"]);

        table.resize(5);
        assert_eq!(table.len(), 5);
        assert_eq!(table.phrase(2), "two");
        assert_eq!(table.phrase(4), "");

        table.resize(2);
        assert_eq!(table.phrase(1), "one");
        assert_eq!(table.phrase(2), "");
    }

    #[test]
    fn phrase_set_replaces_one_slot() {
        let mut table = PhraseTable::with_len(3);
        table.set(1, "hello").unwrap();

        assert_eq!(table.phrase(0), "");
        assert_eq!(table.phrase(1), "hello");
        assert!(table.set(3, "nope").is_err());
    }
}
