// src/core/mod.rs

pub mod config_loader;
pub mod context;
pub mod history;
pub mod matcher;
pub mod paths;
pub mod pipeline;
pub mod script;
pub mod sniff;
pub mod templater;
