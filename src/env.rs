//! Chained variable scopes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::diag::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// A name-to-value mapping plus an optional link to the enclosing scope.
///
/// Lookup and assignment walk outward through `enclosing` until the name is
/// found or the chain is exhausted.  Scopes never form cycles, so `Rc` is
/// enough to keep a parent alive for the lifetime of its children.
#[derive(Debug)]
pub struct Environment {
    enclosing: Option<Rc<Environment>>,
    values: RefCell<HashMap<String, Value>>,
}

impl Environment {
    /// Creates a scope with no parent, used as the top-level scope.
    pub fn new() -> Rc<Environment> {
        Rc::new(Environment {
            enclosing: None,
            values: RefCell::new(HashMap::new()),
        })
    }

    /// Creates a scope chained to `enclosing`.
    pub fn with_enclosing(enclosing: Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment {
            enclosing: Some(enclosing),
            values: RefCell::new(HashMap::new()),
        })
    }

    /// Binds `name` in this scope, shadowing any outer binding and
    /// overwriting any previous one here.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(name.into(), value);
    }

    /// Returns the value of `name` from the nearest scope defining it.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }
        match &self.enclosing {
            Some(parent) => parent.get(name),
            None => Err(undefined(name)),
        }
    }

    /// Mutates `name` in the nearest scope already defining it.  Never
    /// creates a binding.
    pub fn assign(&self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let mut values = self.values.borrow_mut();
        if let Some(slot) = values.get_mut(&name.lexeme) {
            *slot = value;
            return Ok(());
        }
        drop(values);
        match &self.enclosing {
            Some(parent) => parent.assign(name, value),
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}
