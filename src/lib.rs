//! Interpreter for the Pyro scripting language.
//!
//! The pipeline is source text → scanner → tokens → recursive-descent
//! parser → syntax tree → tree-walking evaluator over chained scopes.
//! Scan and parse diagnostics go to a collector threaded through the
//! passes; runtime errors abort the current run.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].
//!
//! # Limitations
//!
//! - No classes, no modules, no `return` statement: a function body that
//!   falls through yields `nil`.
//! - Function call scopes chain to the caller's scope, not the declaration
//!   site (see `src/value.rs`).

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod ast;
pub mod diag;
pub mod interpreter;
pub mod token;

mod env;
mod eval;
mod parser;
mod scanner;
mod value;
