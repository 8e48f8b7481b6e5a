//! Tree-walking evaluator.

use std::io::prelude::*;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ast::{Expr, Literal, Stmt};
use crate::diag::RuntimeError;
use crate::env::Environment;
use crate::token::{Token, TokenKind};
use crate::value::{Function, NativeFunction, Value};

/// Walks the syntax tree, evaluating expressions to values and executing
/// statements for effect.
///
/// Execution is strictly sequential and depth-first.  A runtime error aborts
/// the statement sequence currently executing and propagates to the caller;
/// statements after the faulty one are not attempted.
pub struct Evaluator<'a> {
    output: &'a mut dyn Write,

    // Currently active scope.  Starts as the top-level scope holding the
    // built-in functions.
    env: Rc<Environment>,
}

impl<'a> Evaluator<'a> {
    pub fn new(output: &'a mut dyn Write) -> Evaluator<'a> {
        let globals = Environment::new();
        globals.define(
            "clock",
            Value::Callable(Rc::new(NativeFunction::new("clock", 0, builtin_clock))),
        );
        globals.define(
            "sqrt",
            Value::Callable(Rc::new(NativeFunction::new("sqrt", 1, builtin_sqrt))),
        );
        Evaluator {
            output,
            env: globals,
        }
    }

    /// Runs each statement in order against the current top-level scope.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), RuntimeError> {
        for statement in statements {
            self.execute(statement)?;
        }
        Ok(())
    }

    fn execute(&mut self, statement: &Stmt) -> Result<(), RuntimeError> {
        match statement {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.env.define(&name.lexeme, value);
            }
            Stmt::Block(statements) => {
                let scope = Environment::with_enclosing(self.env.clone());
                self.execute_block(statements, scope)?;
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
            }
            Stmt::Function(declaration) => {
                let function = Function::new(declaration.clone());
                self.env
                    .define(&declaration.name.lexeme, Value::Callable(Rc::new(function)));
            }
        }
        Ok(())
    }

    /// Executes `statements` with `scope` active, restoring the previous
    /// scope afterwards whether execution finished normally or not.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        scope: Rc<Environment>,
    ) -> Result<(), RuntimeError> {
        let previous = std::mem::replace(&mut self.env, scope);
        let result = statements.iter().try_for_each(|s| self.execute(s));
        self.env = previous;
        result
    }

    /// The currently active scope.  Function calls chain their body scope
    /// to this.
    pub(crate) fn environment(&self) -> Rc<Environment> {
        self.env.clone()
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Nil => Value::Nil,
                Literal::Bool(b) => Value::Bool(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            Expr::Grouping(inner) => self.evaluate(inner),
            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
                    TokenKind::Minus => {
                        let n = check_number_operand(operator, &right)?;
                        Ok(Value::Number(-n))
                    }
                    _ => unreachable!("parser only builds '!' and '-' unary nodes"),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                self.eval_binary(operator, left, right)
            }
            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                if operator.kind == TokenKind::Or {
                    if left.is_truthy() {
                        return Ok(left);
                    }
                } else if !left.is_truthy() {
                    return Ok(left);
                }
                self.evaluate(right)
            }
            Expr::Variable(name) => self.env.get(name),
            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.env.assign(name, value.clone())?;
                Ok(value)
            }
            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;
                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                let Value::Callable(function) = callee else {
                    return Err(RuntimeError::new(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };
                if args.len() != function.arity() {
                    return Err(RuntimeError::new(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            function.arity(),
                            args.len()
                        ),
                    ));
                }
                function.call(self, paren, args)
            }
        }
    }

    fn eval_binary(
        &mut self,
        operator: &Token,
        left: Value,
        right: Value,
    ) -> Result<Value, RuntimeError> {
        match operator.kind {
            TokenKind::Plus => match (left, right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
                _ => Err(RuntimeError::new(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },
            TokenKind::Minus => {
                let (l, r) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Number(l - r))
            }
            TokenKind::Star => {
                let (l, r) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Number(l * r))
            }
            // Division by zero is not an error: it follows IEEE 754 and
            // yields an infinity or NaN.
            TokenKind::Slash => {
                let (l, r) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Number(l / r))
            }
            TokenKind::Percent => {
                let (l, r) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Number(l % r))
            }
            TokenKind::Greater => {
                let (l, r) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(l > r))
            }
            TokenKind::GreaterEqual => {
                let (l, r) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(l >= r))
            }
            TokenKind::Less => {
                let (l, r) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(l < r))
            }
            TokenKind::LessEqual => {
                let (l, r) = check_number_operands(operator, &left, &right)?;
                Ok(Value::Bool(l <= r))
            }
            TokenKind::EqualEqual => Ok(Value::Bool(left == right)),
            TokenKind::BangEqual => Ok(Value::Bool(left != right)),
            _ => unreachable!("parser only builds binary operator nodes"),
        }
    }
}

fn check_number_operand(operator: &Token, operand: &Value) -> Result<f64, RuntimeError> {
    match operand {
        Value::Number(n) => Ok(*n),
        _ => Err(RuntimeError::new(operator, "Operand must be a number.")),
    }
}

fn check_number_operands(
    operator: &Token,
    left: &Value,
    right: &Value,
) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(RuntimeError::new(operator, "Operands must be numbers.")),
    }
}

fn builtin_clock(_paren: &Token, _args: &[Value]) -> Result<Value, RuntimeError> {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);
    Ok(Value::Number(seconds))
}

fn builtin_sqrt(paren: &Token, args: &[Value]) -> Result<Value, RuntimeError> {
    match args[0] {
        Value::Number(n) => Ok(Value::Number(n.sqrt())),
        _ => Err(RuntimeError::new(paren, "Argument must be a number.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::Diagnostics;
    use crate::interpreter::parse;

    fn try_run(source: &str) -> (String, Result<(), RuntimeError>) {
        let mut diagnostics = Diagnostics::new();
        let program = parse(source, &mut diagnostics);
        assert!(
            !diagnostics.had_error(),
            "unexpected syntax errors: {:?}",
            diagnostics.iter().collect::<Vec<_>>()
        );

        let mut out: Vec<u8> = Vec::new();
        let result = Evaluator::new(&mut out).interpret(&program);
        let output = String::from_utf8(out).expect("output is not UTF-8");
        (output, result)
    }

    fn run(source: &str) -> String {
        let (output, result) = try_run(source);
        if let Err(e) = result {
            panic!("unexpected runtime error: {}", e);
        }
        output
    }

    fn run_error(source: &str) -> (String, RuntimeError) {
        let (output, result) = try_run(source);
        match result {
            Err(e) => (output, e),
            Ok(()) => panic!("expected a runtime error, got output {:?}", output),
        }
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(run("print 2 + 3 * 4;"), "14\n");
        assert_eq!(run("print (2 + 3) * 4;"), "20\n");
        assert_eq!(run("print 1 + 2 * 3;"), "7\n");
    }

    #[test]
    fn unary_minus_and_not() {
        assert_eq!(run("print -3 + 5;"), "2\n");
        assert_eq!(run("print !nil;"), "true\n");
        assert_eq!(run("print !0;"), "false\n");
        assert_eq!(run("print !!\"\";"), "true\n");
    }

    #[test]
    fn remainder_operator() {
        assert_eq!(run("print 7 % 3;"), "1\n");
        assert_eq!(run("print 7.5 % 2;"), "1.5\n");
    }

    #[test]
    fn division_by_zero_is_not_an_error() {
        assert_eq!(run("print 1 / 0;"), "inf\n");
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(run("print \"foo\" + \"bar\";"), "foobar\n");
    }

    #[test]
    fn plus_rejects_mixed_operands() {
        let (_, e) = run_error("print \"foo\" + 1;");
        assert_eq!(
            e.to_string(),
            "[line 1] Error: Operands must be two numbers or two strings."
        );
    }

    #[test]
    fn unary_minus_requires_a_number() {
        let (_, e) = run_error("print -\"foo\";");
        assert_eq!(e.to_string(), "[line 1] Error: Operand must be a number.");
    }

    #[test]
    fn comparisons_require_numbers() {
        assert_eq!(run("print 1 < 2; print 2 <= 2; print 3 > 4; print 3 >= 4;"),
                   "true\ntrue\nfalse\nfalse\n");
        let (_, e) = run_error("print \"a\" < \"b\";");
        assert_eq!(e.to_string(), "[line 1] Error: Operands must be numbers.");
    }

    #[test]
    fn equality_across_kinds() {
        assert_eq!(run("print 1 == 1; print 1 == \"1\"; print nil == nil;"), "true\nfalse\ntrue\n");
        assert_eq!(run("print true != 1;"), "true\n");
    }

    #[test]
    fn logical_operators_short_circuit() {
        // The right operand would divide by a string, which is a type
        // error, so it must not be evaluated.
        assert_eq!(run("print false and (1 / \"x\");"), "false\n");
        assert_eq!(run("print true or (1 / \"x\");"), "true\n");
        // They return an operand, not a coerced boolean.
        assert_eq!(run("print nil or \"fallback\";"), "fallback\n");
        assert_eq!(run("print 1 and 2;"), "2\n");
    }

    #[test]
    fn variables_and_assignment() {
        assert_eq!(run("var a = 1; a = a + 1; print a;"), "2\n");
        assert_eq!(run("var a; print a;"), "nil\n");
        assert_eq!(run("var a = 1; var b = 2; print a = b = 3; print a;"), "3\n3\n");
    }

    #[test]
    fn assignment_to_undefined_name_aborts_the_run() {
        let (output, e) = run_error("print 1; ghost = 2; print 3;");
        // The first statement ran, the one after the failure did not.
        assert_eq!(output, "1\n");
        assert_eq!(e.to_string(), "[line 1] Error: Undefined variable 'ghost'.");
    }

    #[test]
    fn block_scoping_shadows_and_restores() {
        assert_eq!(
            run("var a = 1; { var a = 2; print a; } print a;"),
            "2\n1\n"
        );
        assert_eq!(run("var a = 1; { a = a + 1; } print a;"), "2\n");
    }

    #[test]
    fn if_else_uses_truthiness() {
        assert_eq!(run("if (0) print \"yes\"; else print \"no\";"), "yes\n");
        assert_eq!(run("if (nil) print \"yes\"; else print \"no\";"), "no\n");
        assert_eq!(run("if (false) print \"yes\";"), "");
    }

    #[test]
    fn while_loop() {
        assert_eq!(
            run("var i = 0; while (i < 3) { print i; i = i + 1; }"),
            "0\n1\n2\n"
        );
    }

    #[test]
    fn for_loop_desugars_to_while() {
        assert_eq!(
            run("for (var i = 0; i < 3; i = i + 1) print i;"),
            "0\n1\n2\n"
        );
        // The loop variable lives in its own scope.
        let (_, e) = run_error("for (var i = 0; i < 1; i = i + 1) {} print i;");
        assert_eq!(e.to_string(), "[line 1] Error: Undefined variable 'i'.");
    }

    #[test]
    fn function_declaration_and_call() {
        let source = r#"
            fun add_and_print(x, y) {
                print x + y;
            }
            add_and_print(6, 4);
            add_and_print(1, 2);
        "#;
        assert_eq!(run(source), "10\n3\n");
    }

    #[test]
    fn function_body_yields_no_value() {
        assert_eq!(run("fun f() { 1 + 1; } print f();"), "nil\n");
    }

    #[test]
    fn functions_are_ordinary_values() {
        assert_eq!(run("fun f() {} print f;"), "<fn f>\n");
        assert_eq!(run("fun f() { print 1; } var g = f; g();"), "1\n");
    }

    #[test]
    fn arity_is_checked_before_the_body_runs() {
        let (output, e) = run_error("fun f(a) { print a; } f();");
        assert_eq!(output, "");
        assert_eq!(
            e.to_string(),
            "[line 1] Error: Expected 1 arguments but got 0."
        );
    }

    #[test]
    fn calling_a_non_callable_fails() {
        let (_, e) = run_error("var x = 1; x();");
        assert_eq!(
            e.to_string(),
            "[line 1] Error: Can only call functions and classes."
        );
    }

    #[test]
    fn call_scope_chains_to_the_caller() {
        // Deliberate departure from lexical closures: the body sees the
        // scope active at the call site.
        let source = r#"
            var a = 1;
            fun show() { print a; }
            { var a = 2; show(); }
            show();
        "#;
        assert_eq!(run(source), "2\n1\n");
    }

    #[test]
    fn parameters_shadow_caller_bindings() {
        assert_eq!(
            run("var x = 1; fun f(x) { print x; } f(9); print x;"),
            "9\n1\n"
        );
    }

    #[test]
    fn builtin_sqrt_is_callable() {
        assert_eq!(run("print sqrt(4);"), "2\n");
        let (_, e) = run_error("print sqrt(nil);");
        assert_eq!(e.to_string(), "[line 1] Error: Argument must be a number.");
    }

    #[test]
    fn builtin_clock_returns_a_number() {
        assert_eq!(run("print clock() > 0;"), "true\n");
    }

    #[test]
    fn runtime_error_propagates_out_of_nested_constructs() {
        let (output, _) = run_error(
            "var i = 0; while (i < 3) { print i; { ghost = 1; } i = i + 1; } print \"done\";",
        );
        assert_eq!(output, "0\n");
    }
}
