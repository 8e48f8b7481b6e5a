//! API to control the interpreter.
//!
//! The core exposes two operations: [`parse`] turns source text into a
//! statement sequence (recording scan and parse diagnostics), and
//! [`Interpreter::interpret`] executes a statement sequence against the
//! session's top-level scope.

use std::fmt;
use std::io::Write;

use tracing::debug;

use crate::ast::Stmt;
use crate::diag::{Diagnostics, RuntimeError};
use crate::eval::Evaluator;
use crate::parser::Parser;
use crate::scanner::Scanner;

/// Scans and parses `source` into a statement sequence.
///
/// Best-effort: scan and parse errors land in `diagnostics` and the
/// returned sequence holds every declaration that parsed cleanly.
pub fn parse(source: &str, diagnostics: &mut Diagnostics) -> Vec<Stmt> {
    let tokens = Scanner::new(source, diagnostics).scan_tokens();
    let program = Parser::new(tokens, diagnostics).parse();
    debug!(
        statements = program.len(),
        errors = diagnostics.len(),
        "parsed program"
    );
    program
}

/// Tree-walk interpreter session.
///
/// The top-level scope persists across calls, so a definition from one run
/// is visible to the next.
///
/// # Example
///
/// ```
/// use pyro::diag::Diagnostics;
/// use pyro::interpreter::Interpreter;
///
/// let mut output: Vec<u8> = Vec::new();
/// let mut diagnostics = Diagnostics::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// interp.run("fun greet(name) { print \"hello \" + name; }", &mut diagnostics);
/// interp.run("greet(\"world\");", &mut diagnostics);
///
/// assert!(!diagnostics.had_error());
/// assert_eq!(output, b"hello world\n");
/// ```
pub struct Interpreter<'a> {
    evaluator: Evaluator<'a>,
}

impl<'a> Interpreter<'a> {
    pub fn new(output: &'a mut dyn Write) -> Interpreter<'a> {
        Interpreter {
            evaluator: Evaluator::new(output),
        }
    }

    /// Executes an already-parsed program.
    ///
    /// The first runtime error aborts execution and is returned; earlier
    /// side effects have already happened.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        self.evaluator.interpret(statements)
    }

    /// Parses and executes `source` in one step.
    ///
    /// Whatever parsed despite syntax errors is still executed, and a
    /// runtime failure is recorded in `diagnostics` alongside any scan or
    /// parse errors.  The driver decides what to do from
    /// [`Diagnostics::had_error`].
    pub fn run(&mut self, source: &str, diagnostics: &mut Diagnostics) {
        let program = parse(source, diagnostics);
        if let Err(e) = self.interpret(&program) {
            debug!(error = %e, "execution aborted");
            diagnostics.report(e.diagnostic());
        }
    }
}

impl fmt::Debug for Interpreter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter").finish_non_exhaustive()
    }
}
