//! User commands accepted by a session
//!
//! Every user action is one line of text, parsed into a [`Command`] before
//! the controller applies it. Parsing is pure; nothing here touches the
//! session or the engine.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::interpreter::{Direction, InterpreterSettings, Traversal};
use crate::engine::EngineOp;

/// Errors produced while parsing a command line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    UnknownCommand(String),
    #[error("'{command}' needs {argument}")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },
    #[error("'{command}': '{value}' is not a non-negative integer")]
    InvalidNumber { command: &'static str, value: String },
    #[error("'{command}': '{value}' is not one of {expected}")]
    InvalidChoice {
        command: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Actions on the binary columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnAction {
    Add,
    Reset,
    Increment { id: u32 },
    Decrement { id: u32 },
    ShiftUp { id: u32, steps: u32 },
    ShiftDown { id: u32, steps: u32 },
}

/// One user action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Forwarded to the arithmetic engine
    Engine(EngineOp),
    Column(ColumnAction),
    Merge,
    Legend { index: usize, text: String },
    Phrase { index: usize, text: String },
    Manual { row: u32, text: String },
    /// Changes how rows are read into a word
    Order(InterpreterSettings),
    Read,
    Render { path: PathBuf },
    Help,
    Quit,
}

pub const HELP: &str = "\
state | refresh              reload the grid from the engine
init <base>                  start a fresh grid in <base>
convert <base>               re-express the grid in <base>
add <row> <weight>           add beads to a row
sub <row> <weight>           remove beads from a row
mul2 [steps] | div2 [steps]  multiply / divide by 2^steps
col add | col reset          add a binary column / reset all columns
col inc|dec <id>             set / clear the bead at row 0 of a column
col up|down <id> [steps]     shift a column up / down
merge                        fold the binary columns into the grid
legend <index> [char]        set (or clear) a legend symbol
phrase <index> [text]        set (or clear) a phrase
manual <row> [text]          set (or clear) manual text for a row
order <top|bottom> <rtl|ltr> [joiner]
                             set traversal, direction and joiner
read                         show word, sums and phrase
render <path>                write the stage as PNG
quit";

/// Splits off the first whitespace-separated word
fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(end) => (&input[..end], input[end..].trim_start()),
        None => (input, ""),
    }
}

fn number<T: FromStr>(command: &'static str, argument: &'static str, value: &str) -> Result<T, ParseError> {
    if value.is_empty() {
        return Err(ParseError::MissingArgument { command, argument });
    }
    value.parse().map_err(|_| ParseError::InvalidNumber {
        command,
        value: value.to_string(),
    })
}

fn optional_steps(command: &'static str, value: &str) -> Result<u32, ParseError> {
    if value.is_empty() {
        Ok(1)
    } else {
        number(command, "steps", value)
    }
}

fn parse_order(rest: &str) -> Result<InterpreterSettings, ParseError> {
    let (traversal, rest) = split_word(rest);
    let (direction, joiner) = split_word(rest);

    let traversal = match traversal {
        "top" | "top-to-bottom" => Traversal::TopToBottom,
        "bottom" | "bottom-to-top" => Traversal::BottomToTop,
        "" => {
            return Err(ParseError::MissingArgument {
                command: "order",
                argument: "a traversal",
            });
        }
        other => {
            return Err(ParseError::InvalidChoice {
                command: "order",
                value: other.to_string(),
                expected: "top, bottom",
            });
        }
    };
    let direction = match direction {
        "rtl" => Direction::Rtl,
        "ltr" => Direction::Ltr,
        "" => {
            return Err(ParseError::MissingArgument {
                command: "order",
                argument: "a direction",
            });
        }
        other => {
            return Err(ParseError::InvalidChoice {
                command: "order",
                value: other.to_string(),
                expected: "rtl, ltr",
            });
        }
    };

    Ok(InterpreterSettings {
        traversal,
        direction,
        joiner: joiner.trim_end().to_string(),
    })
}

fn parse_column(rest: &str) -> Result<ColumnAction, ParseError> {
    let (action, rest) = split_word(rest);
    let (id, rest) = split_word(rest);
    let (steps, _) = split_word(rest);

    match action {
        "add" => Ok(ColumnAction::Add),
        "reset" => Ok(ColumnAction::Reset),
        "inc" => Ok(ColumnAction::Increment {
            id: number("col inc", "a column id", id)?,
        }),
        "dec" => Ok(ColumnAction::Decrement {
            id: number("col dec", "a column id", id)?,
        }),
        "up" => Ok(ColumnAction::ShiftUp {
            id: number("col up", "a column id", id)?,
            steps: optional_steps("col up", steps)?,
        }),
        "down" => Ok(ColumnAction::ShiftDown {
            id: number("col down", "a column id", id)?,
            steps: optional_steps("col down", steps)?,
        }),
        "" => Err(ParseError::MissingArgument {
            command: "col",
            argument: "an action (add, reset, inc, dec, up, down)",
        }),
        other => Err(ParseError::UnknownCommand(format!("col {other}"))),
    }
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let (head, rest) = split_word(line);
        let (first, after_first) = split_word(rest);
        let (second, _) = split_word(after_first);

        let command = match head {
            "" => return Err(ParseError::Empty),
            "state" | "refresh" => Command::Engine(EngineOp::State),
            "init" => Command::Engine(EngineOp::Init {
                base: number("init", "a base", first)?,
            }),
            "convert" => Command::Engine(EngineOp::Convert {
                base: number("convert", "a base", first)?,
            }),
            "add" => Command::Engine(EngineOp::Add {
                row: number("add", "a row", first)?,
                weight: number("add", "a weight", second)?,
            }),
            "sub" => Command::Engine(EngineOp::Sub {
                row: number("sub", "a row", first)?,
                weight: number("sub", "a weight", second)?,
            }),
            "mul2" => Command::Engine(EngineOp::Mul2 {
                steps: optional_steps("mul2", first)?,
            }),
            "div2" => Command::Engine(EngineOp::Div2 {
                steps: optional_steps("div2", first)?,
            }),
            "col" => Command::Column(parse_column(rest)?),
            "merge" => Command::Merge,
            "legend" => Command::Legend {
                index: number("legend", "a slot index", first)?,
                text: after_first.to_string(),
            },
            "phrase" => Command::Phrase {
                index: number("phrase", "a slot index", first)?,
                text: after_first.trim_end().to_string(),
            },
            "manual" => Command::Manual {
                row: number("manual", "a row", first)?,
                text: after_first.trim_end().to_string(),
            },
            "order" => Command::Order(parse_order(rest)?),
            "read" => Command::Read,
            "render" => {
                if rest.is_empty() {
                    return Err(ParseError::MissingArgument {
                        command: "render",
                        argument: "an output path",
                    });
                }
                Command::Render {
                    path: PathBuf::from(rest.trim_end()),
                }
            }
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(ParseError::UnknownCommand(other.to_string())),
        };

        Ok(command)
    }
}
