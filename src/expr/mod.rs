//! Bundled [`Evaluator`] for plain math expressions.
//!
//! Grammar, loosest to tightest:
//!
//! ```text
//! cond ? a : b          right-associative
//! ||
//! &&
//! == !=
//! < <= > >=
//! + -
//! * / %                 also implicit: 2x, (x+1)(x-1)
//! -a +a !a              prefix
//! ^                     right-associative
//! f(args)  (e)  number  name
//! ```
//!
//! Comparisons and logic yield `1` or `0`; any non-zero value is true.
//! Arithmetic is plain IEEE-754, so `1/0` is infinite rather than an error.
//! Trees taller than [`parser::MAX_DEPTH`] are rejected while parsing.

pub mod ast;
pub mod lexer;
pub mod parser;

use std::f64::consts::{E, PI};

use crate::{
    error::EvaluationError,
    evaluator::{Bindings, CompiledFunction, Evaluator},
    types::Value,
};

use ast::{BinaryOp, Expr, UnaryOp};

/// Parses with [`parser::parse`] and walks the resulting tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExprEvaluator;

impl Evaluator for ExprEvaluator {
    fn evaluate(&self, expression: &str, bindings: &Bindings) -> Result<Value, EvaluationError> {
        let expr = parser::parse(expression)?;
        eval(&expr, bindings)
    }

    fn compile<'a>(
        &'a self,
        expression: &'a str,
    ) -> Result<Box<CompiledFunction<'a>>, EvaluationError> {
        let expr = parser::parse(expression)?;
        Ok(Box::new(move |bindings: &Bindings| eval(&expr, bindings)))
    }
}

/// Evaluates a parsed tree. Bindings take precedence over the `pi` and `e` constants.
pub fn eval(expr: &Expr, bindings: &Bindings) -> Result<Value, EvaluationError> {
    match expr {
        Expr::Number(v) => Ok(*v),
        Expr::Var(name) => lookup(name, bindings),
        Expr::Unary { op, operand } => {
            let v = eval(operand, bindings)?;
            Ok(match op {
                UnaryOp::Neg => -v,
                UnaryOp::Plus => v,
                UnaryOp::Not => truth(v == 0.),
            })
        }
        Expr::Binary { op, lhs, rhs } => {
            let a = eval(lhs, bindings)?;
            // Short-circuit so the untaken side may reference unbound names.
            match op {
                BinaryOp::And if a == 0. => return Ok(0.),
                BinaryOp::Or if is_true(a) => return Ok(1.),
                _ => {}
            }
            let b = eval(rhs, bindings)?;
            Ok(match op {
                BinaryOp::Add => a + b,
                BinaryOp::Sub => a - b,
                BinaryOp::Mul => a * b,
                BinaryOp::Div => a / b,
                BinaryOp::Rem => a % b,
                BinaryOp::Pow => a.powf(b),
                BinaryOp::Lt => truth(a < b),
                BinaryOp::LtEq => truth(a <= b),
                BinaryOp::Gt => truth(a > b),
                BinaryOp::GtEq => truth(a >= b),
                BinaryOp::Eq => truth(a == b),
                BinaryOp::NotEq => truth(a != b),
                BinaryOp::And | BinaryOp::Or => truth(is_true(b)),
            })
        }
        Expr::Call { func, args } => {
            let values = args
                .iter()
                .map(|arg| eval(arg, bindings))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(func.apply(&values))
        }
        Expr::Conditional {
            cond,
            then,
            otherwise,
        } => {
            if is_true(eval(cond, bindings)?) {
                eval(then, bindings)
            } else {
                eval(otherwise, bindings)
            }
        }
    }
}

fn lookup(name: &str, bindings: &Bindings) -> Result<Value, EvaluationError> {
    if let Some(v) = bindings.get(name) {
        return Ok(v);
    }
    match name {
        "pi" => Ok(PI),
        "e" => Ok(E),
        _ => Err(EvaluationError::UnknownIdentifier(name.to_string())),
    }
}

// NaN counts as true, matching `cond != 0`.
fn is_true(v: Value) -> bool {
    v != 0.
}

fn truth(b: bool) -> Value {
    if b { 1. } else { 0. }
}
