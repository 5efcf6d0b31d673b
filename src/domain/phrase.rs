//! Character-for-phrase substitution driven by the legend
//!
//! Every character of the input that appears in the legend is replaced by
//! the phrase stored for its slot. Blank phrases and unknown characters
//! pass through unchanged.

use std::collections::HashMap;

use crate::domain::legend::{Legend, PhraseTable};

/// Lookup from legend symbol to its slot
///
/// When a symbol occupies several slots the lowest index wins and the
/// later duplicates are unreachable.
pub fn symbol_index(legend: &Legend) -> HashMap<char, usize> {
    let mut index = HashMap::new();
    for (slot, symbol) in legend.slots().iter().enumerate() {
        if let Some(symbol) = symbol {
            index.entry(*symbol).or_insert(slot);
        }
    }
    index
}

/// Maps `text` through the phrase table
///
/// # Example
/// ```rust
/// use bead_abacus::domain::legend::{Legend, PhraseTable};
/// use bead_abacus::domain::phrase::map_phrase;
///
/// let legend = Legend::from_symbols(["", "F", "E", "D"]);
/// let phrases = PhraseTable::from_phrases(["", "feed ", "", "dad"]);
/// assert_eq!(map_phrase("FED!", &legend, &phrases), "feed Edad!");
/// ```
pub fn map_phrase(text: &str, legend: &Legend, phrases: &PhraseTable) -> String {
    if text.is_empty() {
        return String::new();
    }

    let index = symbol_index(legend);
    let mut output = String::with_capacity(text.len());
    for c in text.chars() {
        match index.get(&c).map(|&slot| phrases.phrase(slot)) {
            Some(phrase) if !phrase.is_empty() => output.push_str(phrase),
            _ => output.push(c),
        }
    }
    output
}
