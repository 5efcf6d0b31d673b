//! Bead abacus: a base grid driven by an external arithmetic engine,
//! client-side binary columns that merge into it, and the readings derived
//! from both.

pub mod app;
pub mod config;
pub mod domain;
pub mod engine;
pub mod ui;
