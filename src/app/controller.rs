//! Application controller and coordination layer
//!
//! The controller owns the engine and the session and applies parsed
//! commands to them. Engine requests are validated before they are sent,
//! and every snapshot the engine returns replaces the session grid.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::merge::{MergeFailure, MergeReport};
use crate::app::session::{AbacusSession, SessionSummary};
use crate::app::state::{ColumnAction, Command, ParseError};
use crate::config::{AbacusConfig, ConfigError, StageConfig};
use crate::domain::ValidationError;
use crate::domain::columns::ColumnError;
use crate::engine::{ArithmeticEngine, EngineCallError, EngineOp};
use crate::ui::{RendererError, StageLayout, StageRenderer};

/// Application errors that can occur during controller operations
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Column(#[from] ColumnError),
    #[error(transparent)]
    Engine(#[from] EngineCallError),
    #[error(transparent)]
    Merge(#[from] MergeFailure),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("render failed: {0}")]
    Render(#[from] RendererError),
}

/// What a command did, for the caller to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The engine returned a new grid
    Grid,
    /// Binary columns changed; carries the id of a newly added column
    Columns { added: Option<u32> },
    Merged(MergeReport),
    /// Legend, phrase or manual text edited
    Edited,
    Reading(SessionSummary),
    Rendered(PathBuf),
    Help,
    Quit,
}

/// Coordinates one session against one engine
#[derive(Debug)]
pub struct SessionController<E> {
    engine: E,
    session: AbacusSession,
    stage: StageConfig,
    renderer: StageRenderer,
}

impl<E: ArithmeticEngine> SessionController<E> {
    /// Create a controller over `engine` with settings from `config`
    pub fn new(engine: E, config: &AbacusConfig) -> Self {
        Self {
            engine,
            session: AbacusSession::new(config.interpreter.clone()),
            stage: config.stage,
            renderer: StageRenderer::new(),
        }
    }

    pub fn session(&self) -> &AbacusSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut AbacusSession {
        &mut self.session
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Loads the engine's current grid into the session
    pub fn refresh(&mut self) -> Result<(), AppError> {
        self.call(EngineOp::State)
    }

    /// Parses and executes one command line
    pub fn run_line(&mut self, line: &str) -> Result<Outcome, AppError> {
        let command: Command = line.parse()?;
        self.execute(command)
    }

    /// Applies one command to the session
    pub fn execute(&mut self, command: Command) -> Result<Outcome, AppError> {
        debug!(?command, "dispatch");

        match command {
            Command::Engine(op) => {
                self.call(op)?;
                Ok(Outcome::Grid)
            }
            Command::Column(action) => self.column(action),
            Command::Merge => {
                let report = self.session.merge(&mut self.engine)?;
                if report.is_noop() {
                    info!("merge skipped: no binary beads");
                }
                Ok(Outcome::Merged(report))
            }
            Command::Legend { index, text } => {
                self.session.set_legend(index, &text)?;
                Ok(Outcome::Edited)
            }
            Command::Phrase { index, text } => {
                self.session.set_phrase(index, &text)?;
                Ok(Outcome::Edited)
            }
            Command::Manual { row, text } => {
                self.session.set_manual(row, &text)?;
                Ok(Outcome::Edited)
            }
            Command::Order(settings) => {
                self.session.set_interpreter_settings(settings);
                Ok(Outcome::Edited)
            }
            Command::Read => Ok(Outcome::Reading(self.session.summary())),
            Command::Render { path } => {
                self.render(&path)?;
                Ok(Outcome::Rendered(path))
            }
            Command::Help => Ok(Outcome::Help),
            Command::Quit => Ok(Outcome::Quit),
        }
    }

    fn call(&mut self, op: EngineOp) -> Result<(), AppError> {
        op.validate()?;
        info!(op = %op, "engine call");
        let snapshot = self.engine.execute(op).inspect_err(|err| {
            warn!(op = %op, error = %err, "engine call failed");
        })?;
        self.session.apply_snapshot(snapshot);
        Ok(())
    }

    fn column(&mut self, action: ColumnAction) -> Result<Outcome, AppError> {
        let columns = self.session.columns_mut();
        let mut added = None;

        match action {
            ColumnAction::Add => added = Some(columns.add_column()),
            ColumnAction::Reset => columns.reset_all(),
            ColumnAction::Increment { id } => columns.increment(id)?,
            ColumnAction::Decrement { id } => columns.decrement(id)?,
            ColumnAction::ShiftUp { id, steps } => columns.shift_up(id, steps)?,
            ColumnAction::ShiftDown { id, steps } => columns.shift_down(id, steps)?,
        }

        Ok(Outcome::Columns { added })
    }

    /// Writes the current stage to `path` as PNG
    pub fn render(&self, path: &Path) -> Result<(), AppError> {
        let layout = StageLayout::from_session(&self.session, &self.stage);
        self.renderer.save_png(&layout, path)?;
        info!(path = %path.display(), "stage rendered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LocalEngine;

    fn controller() -> SessionController<LocalEngine> {
        let mut controller = SessionController::new(LocalEngine::default(), &AbacusConfig::default());
        controller.refresh().unwrap();
        controller
    }

    #[test]
    fn refresh_loads_engine_grid() {
        let controller = controller();
        assert_eq!(controller.session().snapshot().width, 4);
        assert!(controller.session().snapshot().rows.is_empty());
    }

    #[test]
    fn engine_commands_replace_the_grid() {
        let mut controller = controller();

        assert_eq!(controller.run_line("init 10").unwrap(), Outcome::Grid);
        controller.run_line("add 2 5").unwrap();
        controller.run_line("mul2").unwrap();

        let snapshot = controller.session().snapshot();
        assert_eq!(snapshot.width, 9);
        assert_eq!(snapshot.rows, vec![(2, 9)]);
        // legend follows the width
        assert_eq!(controller.session().legend().len(), 10);
    }

    #[test]
    fn invalid_operations_never_reach_the_engine() {
        let mut controller = controller();
        controller.run_line("add 0 1").unwrap();

        let err = controller.run_line("div2 0").unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::ZeroSteps { .. })));
        let err = controller.run_line("convert 1").unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::BaseTooSmall { .. })));
        let err = controller.run_line("init 4000000000").unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::BaseTooLarge { .. })));
        assert_eq!(controller.session().legend().len(), 5);

        assert_eq!(controller.engine().snapshot().rows, vec![(0, 1)]);
    }

    #[test]
    fn column_commands_edit_the_store() {
        let mut controller = controller();

        assert_eq!(
            controller.run_line("col add").unwrap(),
            Outcome::Columns { added: Some(2) }
        );
        controller.run_line("col inc 2").unwrap();
        controller.run_line("col up 2 3").unwrap();
        assert!(controller.session().columns().column(2).unwrap().has_bead(3));

        let err = controller.run_line("col inc 9").unwrap_err();
        assert!(matches!(err, AppError::Column(ColumnError::NotFound { id: 9 })));

        controller.run_line("col reset").unwrap();
        assert_eq!(controller.session().columns().len(), 1);
    }

    #[test]
    fn merge_folds_columns_into_grid() {
        let mut controller = controller();
        for line in ["col add", "col inc 1", "col inc 2", "col up 2 1", "merge"] {
            controller.run_line(line).unwrap();
        }

        assert_eq!(controller.session().snapshot().rows, vec![(0, 1), (1, 1)]);
        assert_eq!(controller.session().columns().total_bead_count(), 0);

        let Outcome::Merged(report) = controller.run_line("merge").unwrap() else {
            panic!("expected a merge outcome");
        };
        assert!(report.is_noop());
    }

    #[test]
    fn read_reports_word_sum_and_phrase() {
        let mut controller = controller();
        for line in ["add 1 2", "add 0 1", "legend 2 B", "legend 1 A", "phrase 2 bee", "phrase 1 ay"] {
            controller.run_line(line).unwrap();
        }

        let Outcome::Reading(summary) = controller.run_line("read").unwrap() else {
            panic!("expected a reading");
        };
        assert_eq!(summary.sum, 3);
        assert!(summary.word.ends_with("BA"));
        assert!(summary.phrase.ends_with("beeay"));
    }

    #[test]
    fn order_changes_the_word() {
        let mut controller = controller();
        for line in ["add 15 1", "add 14 2", "legend 1 A", "legend 2 B", "legend 0 .", "order bottom ltr"] {
            controller.run_line(line).unwrap();
        }

        let Outcome::Reading(summary) = controller.run_line("read").unwrap() else {
            panic!("expected a reading");
        };
        // ltr over bottom-to-top reads the same as rtl top-to-bottom
        assert!(summary.word.starts_with("AB."));
        assert_eq!(summary.sum, 3);
    }

    #[test]
    fn manual_text_rejects_rows_outside_window() {
        let mut controller = controller();
        assert_eq!(controller.run_line("manual 3 abc").unwrap(), Outcome::Edited);

        let err = controller.run_line("manual 16 abc").unwrap_err();
        assert!(matches!(err, AppError::Validation(ValidationError::IndexOutOfRange { .. })));
    }

    #[test]
    fn parse_errors_are_reported() {
        let mut controller = controller();
        assert!(matches!(
            controller.run_line("frobnicate"),
            Err(AppError::Parse(ParseError::UnknownCommand(_)))
        ));
        assert_eq!(controller.run_line("quit").unwrap(), Outcome::Quit);
    }

    #[test]
    fn render_writes_png() {
        let mut controller = controller();
        let path = std::env::temp_dir().join(format!("bead-controller-{}.png", std::process::id()));

        let outcome = controller
            .run_line(&format!("render {}", path.display()))
            .unwrap();
        assert_eq!(outcome, Outcome::Rendered(path.clone()));
        assert!(path.exists());
        let _ = std::fs::remove_file(&path);
    }
}
