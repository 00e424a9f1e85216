// src/cli/handlers/mod.rs

// One module per CLI action.

pub mod command;
pub mod commons;
pub mod config;
pub mod explain;
pub mod history;
pub mod matching;
pub mod open;
pub mod select;
pub mod version;
