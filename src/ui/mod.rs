//! Stage rendering

pub mod renderer;

pub use renderer::{RendererError, StageLayout, StageRenderer};
