//! Row interpretation: base grid + legend → word and numeric sum
//!
//! Each visible row contributes one legend symbol, picked by its bead
//! count, and one numeric value equal to the slot it addressed. The word
//! is the symbols concatenated in reading order; the sum ignores order.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::core::BaseRow;
use crate::domain::legend::Legend;

/// Order in which rows are traversed before concatenation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Traversal {
    #[default]
    TopToBottom,
    BottomToTop,
}

/// Reading direction of the produced word
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Symbols appear in traversal order
    #[default]
    Rtl,
    /// Symbols appear in reverse traversal order
    Ltr,
}

/// Knobs of the interpretation that do not come from the grid
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterSettings {
    pub traversal: Traversal,
    pub direction: Direction,
    pub joiner: String,
}

/// Result of interpreting the grid
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reading {
    pub word: String,
    pub sum: u64,
}

/// Legend slot and numeric value a row resolves to
///
/// Counts past the grid width address the last slot. An empty row maps to
/// slot 0 with value 0.
pub fn row_slot(count: u32, width: u32) -> usize {
    if count > 0 { count.min(width) as usize } else { 0 }
}

/// Interprets a list of rows (visual top-to-bottom order) against a legend
///
/// A legend shorter than `width + 1` behaves as if padded with empty
/// symbols; a longer one is used as-is.
///
/// # Arguments
/// * `width` - Grid width (highest addressable legend slot)
/// * `rows` - Visible rows, top to bottom
/// * `legend` - Symbol legend
/// * `settings` - Traversal order, direction and joiner
///
/// # Example
/// ```rust
/// use bead_abacus::domain::core::BaseRow;
/// use bead_abacus::domain::interpreter::{interpret, InterpreterSettings};
/// use bead_abacus::domain::legend::Legend;
///
/// let legend = Legend::from_symbols(["0", "A", "B", "C", "D"]);
/// let rows = [BaseRow::new(1, 3), BaseRow::new(0, 0)];
/// let reading = interpret(4, &rows, &legend, &InterpreterSettings::default());
/// assert_eq!(reading.word, "C0");
/// assert_eq!(reading.sum, 3);
/// ```
pub fn interpret(
    width: u32,
    rows: &[BaseRow],
    legend: &Legend,
    settings: &InterpreterSettings,
) -> Reading {
    let mut items: Vec<(String, u64)> = rows
        .iter()
        .map(|row| {
            let slot = row_slot(row.count, width);
            let symbol = legend.symbol(slot).map(String::from).unwrap_or_default();
            (symbol, slot as u64)
        })
        .collect();

    if settings.traversal == Traversal::BottomToTop {
        items.reverse();
    }

    let sum = items.iter().map(|(_, value)| value).sum();

    let symbols: Vec<&str> = match settings.direction {
        Direction::Rtl => items.iter().map(|(symbol, _)| symbol.as_str()).collect(),
        Direction::Ltr => items.iter().rev().map(|(symbol, _)| symbol.as_str()).collect(),
    };

    Reading {
        word: symbols.join(&settings.joiner),
        sum,
    }
}

pub type TextObserver = Box<dyn FnMut(&str)>;
pub type SumObserver = Box<dyn FnMut(u64)>;

/// Memoized interpreter with change notifications
///
/// Recomputes only when the caller-supplied input version moves, and calls
/// each observer only when its part of the reading actually changed.
pub struct Interpreter {
    settings: InterpreterSettings,
    version: Option<u64>,
    last: Option<Reading>,
    on_text: Option<TextObserver>,
    on_sum: Option<SumObserver>,
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("settings", &self.settings)
            .field("version", &self.version)
            .field("last", &self.last)
            .field("on_text", &self.on_text.is_some())
            .field("on_sum", &self.on_sum.is_some())
            .finish()
    }
}

impl Interpreter {
    pub fn new(settings: InterpreterSettings) -> Self {
        Self {
            settings,
            version: None,
            last: None,
            on_text: None,
            on_sum: None,
        }
    }

    /// Registers the observer told about word changes
    pub fn on_text(&mut self, observer: impl FnMut(&str) + 'static) {
        self.on_text = Some(Box::new(observer));
    }

    /// Registers the observer told about sum changes
    pub fn on_sum(&mut self, observer: impl FnMut(u64) + 'static) {
        self.on_sum = Some(Box::new(observer));
    }

    pub fn settings(&self) -> &InterpreterSettings {
        &self.settings
    }

    /// Replaces the settings and invalidates the cached reading
    pub fn set_settings(&mut self, settings: InterpreterSettings) {
        self.settings = settings;
        self.version = None;
    }

    /// Last computed reading, if any
    pub fn reading(&self) -> Option<&Reading> {
        self.last.as_ref()
    }

    /// Brings the reading up to date with the inputs at `version`
    ///
    /// # Arguments
    /// * `version` - Identity of the inputs; equal versions skip recomputation
    /// * `width`, `rows`, `legend` - Inputs forwarded to [`interpret`]
    ///
    /// # Returns
    /// The current reading
    pub fn update(&mut self, version: u64, width: u32, rows: &[BaseRow], legend: &Legend) -> Reading {
        if self.version == Some(version) {
            if let Some(reading) = &self.last {
                return reading.clone();
            }
        }

        let reading = interpret(width, rows, legend, &self.settings);
        let previous = self.last.replace(reading.clone());
        self.version = Some(version);

        let word_changed = previous.as_ref().is_none_or(|p| p.word != reading.word);
        let sum_changed = previous.as_ref().is_none_or(|p| p.sum != reading.sum);

        if word_changed {
            if let Some(observer) = self.on_text.as_mut() {
                observer(&reading.word);
            }
        }
        if sum_changed {
            if let Some(observer) = self.on_sum.as_mut() {
                observer(reading.sum);
            }
        }

        reading
    }
}
