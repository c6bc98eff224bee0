//! Expression evaluator.
//!
//! Walks an [`Expr`] against a [`Context`] and produces a [`Value`].
//! Variable references resolve to stored fields first, then to computed
//! column definitions, which are evaluated recursively against the same
//! context. Columns currently being resolved are tracked so that a column
//! that (transitively) refers to itself fails instead of recursing forever.

use super::ast::{BinaryOp, Expr, Literal};
use super::value::Value;
use crate::error::{EvalError, EvalResult};

/// Where variable references are resolved.
pub trait Context {
    /// Raw text of a stored field, if the field is set.
    fn field(&self, name: &str) -> Option<&str>;

    /// Parsed definition of a computed column, if one exists.
    fn computed(&self, name: &str) -> Option<&Expr>;
}

/// Context with no fields and no computed columns, for constant expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyContext;

impl Context for EmptyContext {
    fn field(&self, _name: &str) -> Option<&str> {
        None
    }

    fn computed(&self, _name: &str) -> Option<&Expr> {
        None
    }
}

/// Evaluate an expression against a context.
///
/// # Example
/// ```
/// use tabulog::expr::{evaluate, parse, EmptyContext, Value};
///
/// let expr = parse("4 + -5").unwrap();
/// assert_eq!(evaluate(&expr, &EmptyContext).unwrap(), Value::Int(-1));
/// ```
pub fn evaluate(expr: &Expr, ctx: &dyn Context) -> EvalResult<Value> {
    Evaluator::new(ctx).eval(expr)
}

/// Evaluate the computed column `name` against a context.
///
/// Returns `Ok(None)` when the context has no such computed column. The
/// column itself counts as in progress, so a self-reference is reported as
/// circular.
pub fn evaluate_computed(name: &str, ctx: &dyn Context) -> EvalResult<Option<Value>> {
    match ctx.computed(name) {
        Some(expr) => Evaluator::new(ctx).resolve_computed(name, expr).map(Some),
        None => Ok(None),
    }
}

struct Evaluator<'c> {
    ctx: &'c dyn Context,
    /// Computed columns being resolved, outermost first.
    in_progress: Vec<&'c str>,
}

impl<'c> Evaluator<'c> {
    fn new(ctx: &'c dyn Context) -> Self {
        Self {
            ctx,
            in_progress: Vec::new(),
        }
    }

    fn eval(&mut self, expr: &'c Expr) -> EvalResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),
            Expr::Variable(name) => self.resolve(name),
            Expr::Negate(operand) => negate(self.eval(operand)?),
            Expr::Binary { op, left, right } => {
                let lhs = self.eval(left)?;
                let rhs = self.eval(right)?;
                match op {
                    BinaryOp::Add => add(lhs, rhs),
                    BinaryOp::Subtract => subtract(lhs, rhs),
                    BinaryOp::Multiply => multiply(lhs, rhs),
                    BinaryOp::Divide => {
                        let integer = left.is_integer_typed() && right.is_integer_typed();
                        divide(lhs, rhs, integer)
                    }
                    BinaryOp::Modulo => modulo(lhs, rhs),
                }
            }
        }
    }

    fn resolve(&mut self, name: &'c str) -> EvalResult<Value> {
        if let Some(text) = self.ctx.field(name) {
            return Ok(Value::from_field(text));
        }
        match self.ctx.computed(name) {
            Some(expr) => self.resolve_computed(name, expr),
            None => Err(EvalError::UnresolvedReference(name.to_string())),
        }
    }

    fn resolve_computed(&mut self, name: &'c str, expr: &'c Expr) -> EvalResult<Value> {
        if self.in_progress.contains(&name) {
            let mut chain: Vec<String> = self.in_progress.iter().map(|s| s.to_string()).collect();
            chain.push(name.to_string());
            return Err(EvalError::CircularReference { chain });
        }

        self.in_progress.push(name);
        let result = self.eval(expr);
        self.in_progress.pop();
        result
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(n) => Value::Int(*n),
        Literal::Float(f) => Value::Float(*f),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

fn mismatch(operator: &str, operand: &Value) -> EvalError {
    EvalError::TypeMismatch {
        operator: operator.to_string(),
        operand: operand.to_string(),
    }
}

/// Both operands as numbers, or a type mismatch naming the first string.
fn numeric_pair(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult<(f64, f64)> {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        (None, _) => Err(mismatch(op.symbol(), lhs)),
        (_, None) => Err(mismatch(op.symbol(), rhs)),
    }
}

/// Applies a checked integer operation, falling back to floats on overflow
/// or when either side is already a float.
fn arithmetic(
    op: BinaryOp,
    lhs: Value,
    rhs: Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> EvalResult<Value> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        if let Some(n) = int_op(*a, *b) {
            return Ok(Value::Int(n));
        }
    }
    let (a, b) = numeric_pair(op, &lhs, &rhs)?;
    Ok(Value::Float(float_op(a, b)))
}

fn negate(value: Value) -> EvalResult<Value> {
    match value {
        Value::Int(n) => Ok(n
            .checked_neg()
            .map(Value::Int)
            .unwrap_or(Value::Float(-(n as f64)))),
        Value::Float(f) => Ok(Value::Float(-f)),
        Value::Str(_) => Err(mismatch("-", &value)),
    }
}

/// Numeric addition, or concatenation when either side is a string.
fn add(lhs: Value, rhs: Value) -> EvalResult<Value> {
    if lhs.is_numeric() && rhs.is_numeric() {
        return arithmetic(BinaryOp::Add, lhs, rhs, i64::checked_add, |a, b| a + b);
    }
    Ok(Value::Str(format!("{}{}", lhs, rhs)))
}

fn subtract(lhs: Value, rhs: Value) -> EvalResult<Value> {
    arithmetic(BinaryOp::Subtract, lhs, rhs, i64::checked_sub, |a, b| a - b)
}

fn multiply(lhs: Value, rhs: Value) -> EvalResult<Value> {
    arithmetic(BinaryOp::Multiply, lhs, rhs, i64::checked_mul, |a, b| a * b)
}

/// Truncating division when `integer` is set and neither side is zero or
/// overflows; floating point otherwise, so `x / 0` is infinite or NaN.
fn divide(lhs: Value, rhs: Value, integer: bool) -> EvalResult<Value> {
    if integer {
        return arithmetic(BinaryOp::Divide, lhs, rhs, i64::checked_div, |a, b| a / b);
    }
    let (a, b) = numeric_pair(BinaryOp::Divide, &lhs, &rhs)?;
    Ok(Value::Float(a / b))
}

/// Truncating remainder, paired with truncating division: a non-zero result
/// takes the sign of the dividend.
fn modulo(lhs: Value, rhs: Value) -> EvalResult<Value> {
    arithmetic(BinaryOp::Modulo, lhs, rhs, i64::checked_rem, |a, b| a % b)
}
