//! Core domain types shared by every component
//!
//! The base grid is owned by the arithmetic engine. The types here are the
//! read-only snapshot of that grid and its projection onto the visible
//! window of rows.

use serde::{Deserialize, Serialize};

/// Number of rows shown in the visible window (positions `0..VISIBLE_ROWS`)
pub const VISIBLE_ROWS: u32 = 16;

/// One row of the base grid as presented to the interpreters
///
/// `count` is the number of filled cells at `position`, already clamped to
/// the grid width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseRow {
    pub position: u32,
    pub count: u32,
}

impl BaseRow {
    /// Creates a new base row
    pub fn new(position: u32, count: u32) -> Self {
        Self { position, count }
    }

    /// Returns true if the row holds at least one bead
    pub fn is_occupied(&self) -> bool {
        self.count > 0
    }
}

/// Authoritative grid snapshot returned by every engine call
///
/// Rows are `(position, count)` pairs in whatever order the engine sent
/// them. Rows missing from the list are empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSnapshot {
    pub width: u32,
    #[serde(default)]
    pub divider: Option<u32>,
    #[serde(default)]
    pub rows: Vec<(u32, u32)>,
}

impl Default for GridSnapshot {
    /// Matches the engine's default grid (base 5) before the first refresh
    fn default() -> Self {
        Self {
            width: 4,
            divider: Some(4),
            rows: Vec::new(),
        }
    }
}

impl GridSnapshot {
    /// Count at a given position, 0 if the engine did not list it
    pub fn count_at(&self, position: u32) -> u32 {
        self.rows
            .iter()
            .filter(|(y, _)| *y == position)
            .map(|(_, count)| *count)
            .last()
            .unwrap_or(0)
    }

    /// Projects the snapshot onto the visible window
    ///
    /// Produces exactly `window` rows, most-significant position first
    /// (`window - 1` down to `0`). Counts are clamped to the grid width and
    /// rows outside the window are dropped.
    ///
    /// # Example
    /// ```rust
    /// use bead_abacus::domain::core::GridSnapshot;
    ///
    /// let snapshot = GridSnapshot { width: 4, divider: Some(4), rows: vec![(0, 2), (3, 9)] };
    /// let rows = snapshot.visible_rows(4);
    /// assert_eq!(rows[0].position, 3);
    /// assert_eq!(rows[0].count, 4);
    /// assert_eq!(rows[3].count, 2);
    /// ```
    pub fn visible_rows(&self, window: u32) -> Vec<BaseRow> {
        (0..window)
            .rev()
            .map(|position| BaseRow::new(position, self.count_at(position).min(self.width)))
            .collect()
    }

    /// Total beads in the snapshot, used for display only
    pub fn bead_total(&self) -> u64 {
        self.rows.iter().map(|(_, count)| u64::from(*count)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(rows: Vec<(u32, u32)>) -> GridSnapshot {
        GridSnapshot {
            width: 4,
            divider: Some(4),
            rows,
        }
    }

    #[test]
    fn visible_rows_are_most_significant_first() {
        let rows = snapshot(vec![(0, 1), (2, 3)]).visible_rows(VISIBLE_ROWS);

        assert_eq!(rows.len(), VISIBLE_ROWS as usize);
        assert_eq!(rows.first().unwrap().position, VISIBLE_ROWS - 1);
        assert_eq!(rows.last().unwrap(), &BaseRow::new(0, 1));
        assert_eq!(rows[(VISIBLE_ROWS - 3) as usize], BaseRow::new(2, 3));
    }

    #[test]
    fn rows_outside_window_are_dropped() {
        let rows = snapshot(vec![(20, 2)]).visible_rows(VISIBLE_ROWS);
        assert!(rows.iter().all(|row| !row.is_occupied()));
    }

    #[test]
    fn counts_are_clamped_to_width() {
        let rows = snapshot(vec![(0, 7)]).visible_rows(1);
        assert_eq!(rows, vec![BaseRow::new(0, 4)]);
    }

    #[test]
    fn snapshot_parses_engine_json() {
        let json = r#"{"width": 4, "divider": 2, "rows": [[0, 3], [5, 1]]}"#;
        let parsed: GridSnapshot = serde_json::from_str(json).unwrap();

        assert_eq!(parsed.width, 4);
        assert_eq!(parsed.divider, Some(2));
        assert_eq!(parsed.count_at(5), 1);
        assert_eq!(parsed.count_at(1), 0);
        assert_eq!(parsed.bead_total(), 4);
    }
}
