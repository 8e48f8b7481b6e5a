//! Runtime values and the callable capability.

use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::diag::RuntimeError;
use crate::env::Environment;
use crate::eval::Evaluator;
use crate::token::Token;

/// A value a Pyro expression can evaluate to.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Rc<dyn Callable>),
}

impl Value {
    /// Only `nil` and `false` are falsy; everything else, including `0` and
    /// the empty string, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Number(l), Value::Number(r)) => l == r,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Callable(l), Value::Callable(r)) => {
                Rc::as_ptr(l) as *const () == Rc::as_ptr(r) as *const ()
            }
            // Values of different kinds are never equal.
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Bool(b) => write!(f, "{}", b),
            // f64's Display is already compact: no trailing ".0".
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Callable(c) => write!(f, "<fn {}>", c.name()),
        }
    }
}

/// Capability implemented by any value that can be invoked.
pub trait Callable: fmt::Debug {
    fn name(&self) -> &str;

    fn arity(&self) -> usize;

    /// Invokes the callable.  The evaluator has already checked that the
    /// argument count matches `arity`.  `paren` is the closing parenthesis
    /// of the call, used to locate runtime errors.
    fn call(
        &self,
        evaluator: &mut Evaluator<'_>,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError>;
}

/// A user-defined function built from a `fun` declaration.
#[derive(Debug)]
pub struct Function {
    declaration: Rc<FunctionDecl>,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>) -> Function {
        Function { declaration }
    }
}

impl Callable for Function {
    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        evaluator: &mut Evaluator<'_>,
        _paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        // The body runs in a fresh scope chained to the caller's scope at
        // call time, not to the scope the function was declared in.  This
        // departs from conventional lexical closures but is the language's
        // observed behavior, kept as is.
        let env = Environment::with_enclosing(evaluator.environment());
        for (param, value) in self.declaration.params.iter().zip(arguments) {
            env.define(&param.lexeme, value);
        }
        evaluator.execute_block(&self.declaration.body, env)?;

        // No return statement exists in the grammar; a body that falls
        // through yields nil.
        Ok(Value::Nil)
    }
}

/// A host-provided built-in over a plain function pointer.
#[derive(Debug)]
pub struct NativeFunction {
    name: &'static str,
    arity: usize,
    body: fn(&Token, &[Value]) -> Result<Value, RuntimeError>,
}

impl NativeFunction {
    pub fn new(
        name: &'static str,
        arity: usize,
        body: fn(&Token, &[Value]) -> Result<Value, RuntimeError>,
    ) -> NativeFunction {
        NativeFunction { name, arity, body }
    }
}

impl Callable for NativeFunction {
    fn name(&self) -> &str {
        self.name
    }

    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _evaluator: &mut Evaluator<'_>,
        paren: &Token,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        (self.body)(paren, &arguments)
    }
}
