// src/core/script.rs

//! # Rule Scripts
//!
//! A rule may carry a small script that decides, at resolution time, whether the rule
//! applies and optionally which command to run. The matcher only talks to the
//! [`ScriptEngine`] trait. [`RhaiEngine`] is the embedded implementation.
//!
//! Scripts see read-only bindings: `file`, `absFile`, `dir`, `base`, `ext`, `name` and
//! `env` (a map of the process environment). The value of the last expression decides
//! the outcome:
//!
//! - a string: the rule matches and the string replaces the rule's command;
//! - a boolean: the rule matches (or not) and keeps its static command;
//! - anything else, including `()`: the rule does not match.

use crate::core::context::CommandContext;
use rhai::{Dynamic, Engine, Map, Scope};
use std::{collections::HashMap, fmt};
use thiserror::Error;

/// Upper bound on interpreter operations for a single evaluation.
const MAX_OPERATIONS: u64 = 1_000_000;
const MAX_CALL_LEVELS: usize = 32;
const MAX_EXPR_DEPTH: usize = 64;

/// The decision a script returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptResult {
    /// The rule matches and this command overrides the rule's own command.
    Command(String),
    /// The rule matches (or not); the rule's own command is used on a match.
    Matched(bool),
    /// The script produced no usable value; the rule does not match.
    NoMatch,
}

impl fmt::Display for ScriptResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(command) => write!(f, "returned '{}'", command),
            Self::Matched(value) => write!(f, "returned {}", value),
            Self::NoMatch => f.write_str("returned no value"),
        }
    }
}

impl ScriptResult {
    /// Whether the rule should be treated as matching.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Command(_) | Self::Matched(true))
    }

    /// The command supplied by the script, if any.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Command(c) => Some(c),
            _ => None,
        }
    }
}

/// Errors raised by a script.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Script could not be parsed: {0}")]
    Parse(String),
    #[error("Script execution failed: {0}")]
    Runtime(String),
}

/// Read-only values exposed to a script.
#[derive(Debug, Clone, Copy)]
pub struct ScriptBindings<'a> {
    pub context: &'a CommandContext,
    pub env: &'a HashMap<String, String>,
}

impl<'a> ScriptBindings<'a> {
    pub fn new(context: &'a CommandContext, env: &'a HashMap<String, String>) -> Self {
        Self { context, env }
    }
}

/// An embeddable interpreter able to evaluate rule scripts.
///
/// Implementations must not keep state between calls: every evaluation starts from a
/// fresh interpreter state.
pub trait ScriptEngine: fmt::Debug {
    /// Runs `source` with `bindings` in scope and maps its final value.
    fn evaluate(
        &self,
        source: &str,
        bindings: &ScriptBindings<'_>,
    ) -> Result<ScriptResult, ScriptError>;
}

/// Takes a snapshot of the current process environment for script bindings.
pub fn environment_snapshot() -> HashMap<String, String> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

/// Sandboxed Rhai interpreter. No filesystem, network or process access is registered.
#[derive(Debug, Default, Clone, Copy)]
pub struct RhaiEngine;

impl RhaiEngine {
    pub fn new() -> Self {
        Self
    }

    fn build_engine() -> Engine {
        let mut engine = Engine::new();
        engine.set_max_operations(MAX_OPERATIONS);
        engine.set_max_call_levels(MAX_CALL_LEVELS);
        engine.set_max_expr_depths(MAX_EXPR_DEPTH, MAX_EXPR_DEPTH);
        engine.disable_symbol("eval");
        // Keep stdout clean for dry-run output.
        engine.on_print(|text| log::debug!("[script] {}", text));
        engine.on_debug(|text, _source, pos| log::debug!("[script:{}] {}", pos, text));
        engine
    }

    fn build_scope(bindings: &ScriptBindings<'_>) -> Scope<'static> {
        let ctx = bindings.context;
        let mut scope = Scope::new();
        scope.push_constant("file", ctx.file.clone());
        scope.push_constant("absFile", ctx.abs_file.clone());
        scope.push_constant("dir", ctx.dir.clone());
        scope.push_constant("base", ctx.base.clone());
        scope.push_constant("ext", ctx.ext.clone());
        scope.push_constant("name", ctx.name.clone());

        let mut env = Map::new();
        for (key, value) in bindings.env {
            env.insert(key.as_str().into(), Dynamic::from(value.clone()));
        }
        scope.push_constant("env", env);
        scope
    }
}

impl ScriptEngine for RhaiEngine {
    fn evaluate(
        &self,
        source: &str,
        bindings: &ScriptBindings<'_>,
    ) -> Result<ScriptResult, ScriptError> {
        let engine = Self::build_engine();
        let ast = engine
            .compile(source)
            .map_err(|e| ScriptError::Parse(e.to_string()))?;

        let mut scope = Self::build_scope(bindings);
        let value: Dynamic = engine
            .eval_ast_with_scope(&mut scope, &ast)
            .map_err(|e| ScriptError::Runtime(e.to_string()))?;

        let result = if value.is_string() {
            value
                .into_string()
                .map(ScriptResult::Command)
                .unwrap_or(ScriptResult::NoMatch)
        } else if value.is_bool() {
            value
                .as_bool()
                .map(ScriptResult::Matched)
                .unwrap_or(ScriptResult::NoMatch)
        } else {
            log::trace!("Script returned '{}'; treating as no match.", value.type_name());
            ScriptResult::NoMatch
        };
        log::debug!("Script result: {:?}", result);
        Ok(result)
    }
}
