//! Session-scoped bead state
//!
//! One `AbacusSession` holds everything a single interactive session owns:
//! the last engine snapshot, the binary columns, the legend with its phrase
//! table, and the manual row text. It is created at session start, passed
//! by reference to every operation, and dropped at session end.

use tracing::debug;

use crate::app::merge::{self, MergeFailure, MergeReport};
use crate::domain::ValidationError;
use crate::domain::columns::BinaryColumnStore;
use crate::domain::core::{BaseRow, GridSnapshot, VISIBLE_ROWS};
use crate::domain::interpreter::{Interpreter, InterpreterSettings, Reading};
use crate::domain::legend::{Legend, PhraseTable};
use crate::domain::phrase::map_phrase;
use crate::domain::selection::{self, ManualRowText, SelectionMask};
use crate::engine::ArithmeticEngine;

/// Everything derived from the session at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub width: u32,
    pub divider: Option<u32>,
    pub binary_beads: usize,
    pub word: String,
    pub sum: u64,
    pub phrase: String,
    pub manual_score: usize,
}

#[derive(Debug)]
pub struct AbacusSession {
    window: u32,
    snapshot: GridSnapshot,
    rows: Vec<BaseRow>,
    /// Bumped on every change to the interpreter's inputs
    version: u64,
    columns: BinaryColumnStore,
    legend: Legend,
    phrases: PhraseTable,
    manual: ManualRowText,
    interpreter: Interpreter,
}

impl AbacusSession {
    /// Creates a session over the default grid with the standard window
    pub fn new(settings: InterpreterSettings) -> Self {
        Self::with_window(settings, VISIBLE_ROWS)
    }

    pub fn with_window(settings: InterpreterSettings, window: u32) -> Self {
        let snapshot = GridSnapshot::default();
        let legend = Legend::for_width(snapshot.width);
        let phrases = PhraseTable::with_len(legend.len());

        Self {
            window,
            rows: snapshot.visible_rows(window),
            snapshot,
            version: 0,
            columns: BinaryColumnStore::new(),
            legend,
            phrases,
            manual: ManualRowText::with_len(window as usize),
            interpreter: Interpreter::new(settings),
        }
    }

    pub fn window(&self) -> u32 {
        self.window
    }

    pub fn snapshot(&self) -> &GridSnapshot {
        &self.snapshot
    }

    /// Visible rows, most-significant first
    pub fn rows(&self) -> &[BaseRow] {
        &self.rows
    }

    pub fn columns(&self) -> &BinaryColumnStore {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut BinaryColumnStore {
        &mut self.columns
    }

    pub fn legend(&self) -> &Legend {
        &self.legend
    }

    pub fn phrases(&self) -> &PhraseTable {
        &self.phrases
    }

    pub fn manual(&self) -> &ManualRowText {
        &self.manual
    }

    /// Access to the interpreter, e.g. to register observers
    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }

    /// Replaces the grid with a fresh engine snapshot
    ///
    /// A width change resizes the legend and the phrase table, keeping
    /// entries at surviving slots.
    pub fn apply_snapshot(&mut self, snapshot: GridSnapshot) {
        if snapshot.width != self.snapshot.width || self.legend.len() != snapshot.width as usize + 1 {
            debug!(from = self.snapshot.width, to = snapshot.width, "grid width changed");
            self.legend.resize_for_width(snapshot.width);
            self.phrases.resize(self.legend.len());
        }
        self.rows = snapshot.visible_rows(self.window);
        self.snapshot = snapshot;
        self.version += 1;
    }

    /// Changes how rows are read; the next reading is recomputed
    pub fn set_interpreter_settings(&mut self, settings: InterpreterSettings) {
        self.interpreter.set_settings(settings);
    }

    /// Edits one legend slot
    pub fn set_legend(&mut self, index: usize, text: &str) -> Result<(), ValidationError> {
        self.legend.set(index, text)?;
        self.version += 1;
        Ok(())
    }

    /// Edits the phrase of one legend slot
    pub fn set_phrase(&mut self, index: usize, text: &str) -> Result<(), ValidationError> {
        self.phrases.set(index, text)
    }

    /// Replaces the manual text typed against the row at `position`
    pub fn set_manual(&mut self, position: u32, text: &str) -> Result<(), ValidationError> {
        let index = self.visual_index(position)?;
        self.manual.set(index, text)
    }

    /// Visual index of a row position inside the window
    fn visual_index(&self, position: u32) -> Result<usize, ValidationError> {
        if position >= self.window {
            return Err(ValidationError::IndexOutOfRange {
                what: "row",
                index: position as usize,
                len: self.window as usize,
            });
        }
        Ok((self.window - 1 - position) as usize)
    }

    /// Current interpretation of the grid, recomputed only when inputs changed
    pub fn reading(&mut self) -> Reading {
        self.interpreter
            .update(self.version, self.snapshot.width, &self.rows, &self.legend)
    }

    /// The word run through the phrase table
    pub fn phrase_output(&mut self) -> String {
        let reading = self.reading();
        map_phrase(&reading.word, &self.legend, &self.phrases)
    }

    pub fn mask(&self) -> SelectionMask {
        SelectionMask::compute(&self.rows)
    }

    pub fn manual_score(&self) -> usize {
        selection::score(&self.manual, &self.mask())
    }

    pub fn summary(&mut self) -> SessionSummary {
        let reading = self.reading();
        SessionSummary {
            width: self.snapshot.width,
            divider: self.snapshot.divider,
            binary_beads: self.columns.total_bead_count(),
            phrase: map_phrase(&reading.word, &self.legend, &self.phrases),
            word: reading.word,
            sum: reading.sum,
            manual_score: self.manual_score(),
        }
    }

    /// Folds the binary columns into the engine's grid
    ///
    /// The session grid follows the engine either way: the final snapshot
    /// on success, the last successful one on failure. Columns are reset
    /// only on success.
    pub fn merge<E>(&mut self, engine: &mut E) -> Result<MergeReport, MergeFailure>
    where
        E: ArithmeticEngine + ?Sized,
    {
        let current = self.snapshot.clone();
        match merge::merge_into(&mut self.columns, &current, engine) {
            Ok(report) => {
                if !report.is_noop() {
                    self.apply_snapshot(report.snapshot.clone());
                }
                Ok(report)
            }
            Err(failure) => {
                if let Some(snapshot) = &failure.last_snapshot {
                    self.apply_snapshot(snapshot.clone());
                }
                Err(failure)
            }
        }
    }
}

impl Default for AbacusSession {
    fn default() -> Self {
        Self::new(InterpreterSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineCallError, EngineErrorKind, EngineOp, LocalEngine};

    fn grid(rows: Vec<(u32, u32)>) -> GridSnapshot {
        GridSnapshot {
            width: 4,
            divider: Some(4),
            rows,
        }
    }

    #[test]
    fn new_session_matches_default_grid() {
        let mut session = AbacusSession::default();

        assert_eq!(session.rows().len(), VISIBLE_ROWS as usize);
        assert_eq!(session.legend().len(), 5);
        assert_eq!(session.phrases().len(), 5);
        assert_eq!(session.columns().len(), 1);
        assert_eq!(session.reading().sum, 0);
    }

    #[test]
    fn width_change_resizes_legend_and_phrases() {
        let mut session = AbacusSession::default();
        session.set_legend(1, "A").unwrap();
        session.set_phrase(1, "alpha").unwrap();

        session.apply_snapshot(GridSnapshot {
            width: 9,
            divider: Some(9),
            rows: vec![],
        });
        assert_eq!(session.legend().len(), 10);
        assert_eq!(session.phrases().len(), 10);
        assert_eq!(session.legend().symbol(1), Some('A'));
        assert_eq!(session.phrases().phrase(1), "alpha");

        session.apply_snapshot(GridSnapshot {
            width: 1,
            divider: Some(1),
            rows: vec![],
        });
        assert_eq!(session.legend().len(), 2);
        assert_eq!(session.phrases().len(), 2);
    }

    #[test]
    fn legend_edit_refreshes_reading() {
        let mut session = AbacusSession::with_window(InterpreterSettings::default(), 2);
        session.apply_snapshot(grid(vec![(1, 2)]));

        assert_eq!(session.reading().word, "");
        session.set_legend(2, "B").unwrap();
        session.set_legend(0, "_").unwrap();
        assert_eq!(session.reading().word, "B_");
        assert_eq!(session.reading().sum, 2);
    }

    #[test]
    fn settings_change_rereads_the_grid() {
        let mut session = AbacusSession::with_window(InterpreterSettings::default(), 2);
        session.apply_snapshot(grid(vec![(1, 1), (0, 2)]));
        session.set_legend(1, "A").unwrap();
        session.set_legend(2, "B").unwrap();
        assert_eq!(session.reading().word, "AB");

        session.set_interpreter_settings(InterpreterSettings {
            joiner: "+".into(),
            ..InterpreterSettings::default()
        });
        assert_eq!(session.reading().word, "A+B");
    }

    #[test]
    fn phrase_output_uses_current_word() {
        let mut session = AbacusSession::with_window(InterpreterSettings::default(), 2);
        session.apply_snapshot(grid(vec![(0, 1), (1, 1)]));
        session.set_legend(1, "F").unwrap();
        session.set_phrase(1, "fa").unwrap();

        assert_eq!(session.phrase_output(), "fafa");
    }

    #[test]
    fn manual_rows_are_addressed_by_position() {
        let mut session = AbacusSession::with_window(InterpreterSettings::default(), 4);
        session.apply_snapshot(grid(vec![(2, 2), (0, 1)]));

        session.set_manual(3, "ab").unwrap();
        session.set_manual(2, "cde").unwrap();
        session.set_manual(1, "fg").unwrap();
        session.set_manual(0, "h").unwrap();

        assert_eq!(session.mask().flags(), &[false, true, false, true]);
        assert_eq!(session.manual_score(), 4);
        assert!(session.set_manual(4, "x").is_err());
    }

    #[test]
    fn successful_merge_updates_grid_and_resets_columns() {
        let mut session = AbacusSession::default();
        let mut engine = LocalEngine::with_base(5);
        session.columns_mut().increment(1).unwrap();
        session.columns_mut().shift_up(1, 3).unwrap();

        let report = session.merge(&mut engine).unwrap();
        assert_eq!(report.applied.len(), 1);
        assert_eq!(session.snapshot().count_at(3), 1);
        assert_eq!(session.columns().total_bead_count(), 0);
    }

    struct FailingAfter {
        inner: LocalEngine,
        remaining: usize,
    }

    impl ArithmeticEngine for FailingAfter {
        fn execute(&mut self, op: EngineOp) -> Result<GridSnapshot, EngineCallError> {
            if self.remaining == 0 {
                return Err(EngineCallError::new(
                    op,
                    EngineErrorKind::Status {
                        code: 503,
                        body: String::new(),
                    },
                ));
            }
            self.remaining -= 1;
            self.inner.execute(op)
        }
    }

    #[test]
    fn failed_merge_keeps_columns_and_shows_applied_rows() {
        let mut session = AbacusSession::default();
        let second = session.columns_mut().add_column();
        let third = session.columns_mut().add_column();
        session.columns_mut().increment(1).unwrap();
        session.columns_mut().increment(second).unwrap();
        session.columns_mut().shift_up(second, 1).unwrap();
        session.columns_mut().increment(third).unwrap();
        session.columns_mut().shift_up(third, 2).unwrap();
        let columns_before = session.columns().clone();

        let mut engine = FailingAfter {
            inner: LocalEngine::with_base(5),
            remaining: 1,
        };
        let failure = session.merge(&mut engine).unwrap_err();

        assert_eq!(failure.failed.row, 1);
        assert_eq!(session.snapshot().count_at(0), 1);
        assert_eq!(session.snapshot().count_at(1), 0);
        assert_eq!(session.columns(), &columns_before);
    }
}
