//! Diagnostics collected while scanning, parsing and running a program.
//!
//! There is no process-wide "had error" flag: every pass that can fail takes
//! a [`Diagnostics`] collector, so the core stays testable in isolation.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::token::{Token, TokenKind};

/// A single reported problem: source line, a location hint and a message.
#[derive(Debug, PartialEq, Clone)]
pub struct Diagnostic {
    pub line: u32,
    pub location: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u32, location: impl Into<String>, message: impl Into<String>) -> Diagnostic {
        Diagnostic {
            line,
            location: location.into(),
            message: message.into(),
        }
    }

    /// Diagnostic pointing at `token`, hinting at its lexeme.
    pub fn at_token(token: &Token, message: impl Into<String>) -> Diagnostic {
        let location = if token.kind == TokenKind::Eof {
            " at end".to_string()
        } else {
            format!(" at '{}'", token.lexeme)
        };
        Diagnostic::new(token.line, location, message)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error{}: {}", self.line, self.location, self.message)
    }
}

/// Accumulates diagnostics over one run.
///
/// The driver decides the process exit code from [`Diagnostics::had_error`].
#[derive(Debug, Default)]
pub struct Diagnostics {
    reports: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.reports.push(diagnostic);
    }

    pub fn had_error(&self) -> bool {
        !self.reports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.reports.iter()
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Forget everything reported so far.  The prompt does this between lines.
    pub fn clear(&mut self) {
        self.reports.clear();
    }
}

/// Errors raised while executing a program.
///
/// A runtime error aborts the current execution: it propagates through
/// nested blocks, loops and calls up to the top-level entry point without
/// being reported more than once.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Fault in the interpreted program (type mismatch, undefined variable,
    /// bad arity, calling a non-callable).
    #[error("[line {line}] Error: {message}")]
    Raised { line: u32, message: String },

    /// The output collaborator failed.
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl RuntimeError {
    /// Runtime error originating at `token`.
    pub fn new(token: &Token, message: impl Into<String>) -> RuntimeError {
        RuntimeError::Raised {
            line: token.line,
            message: message.into(),
        }
    }

    pub fn diagnostic(&self) -> Diagnostic {
        match self {
            RuntimeError::Raised { line, message } => Diagnostic::new(*line, "", message.clone()),
            RuntimeError::Output(e) => Diagnostic::new(0, "", e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_format() {
        let d = Diagnostic::new(3, " at 'foo'", "Expect ';' after value.");
        assert_eq!(d.to_string(), "[line 3] Error at 'foo': Expect ';' after value.");
    }

    #[test]
    fn diagnostic_at_eof_points_at_end() {
        let token = Token::new(TokenKind::Eof, "", 7);
        let d = Diagnostic::at_token(&token, "Expected expression.");
        assert_eq!(d.to_string(), "[line 7] Error at end: Expected expression.");
    }

    #[test]
    fn collector_starts_clean() {
        let diagnostics = Diagnostics::new();
        assert!(!diagnostics.had_error());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn collector_accumulates_and_clears() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.report(Diagnostic::new(1, "", "first"));
        diagnostics.report(Diagnostic::new(2, "", "second"));
        assert!(diagnostics.had_error());
        assert_eq!(diagnostics.len(), 2);
        diagnostics.clear();
        assert!(!diagnostics.had_error());
    }

    #[test]
    fn runtime_error_format() {
        let token = Token::new(TokenKind::Minus, "-", 4);
        let e = RuntimeError::new(&token, "Operand must be a number.");
        assert_eq!(e.to_string(), "[line 4] Error: Operand must be a number.");
    }
}
