//! Abstract syntax tree for column expressions.
//!
//! Trees are immutable once parsed and carry no evaluation state, so one
//! parsed expression can be evaluated against any number of rows.

use std::fmt;

use super::value::{format_float, number_shape};

/// A literal written directly in the expression text.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    /// A bare word (`foo`) or a quoted string (`"foo bar"`).
    Str(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// `{name}`: a stored field or another computed column.
    Variable(String),
    Negate(Box<Expr>),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
}

impl Expr {
    pub fn integer(n: i64) -> Self {
        Expr::Literal(Literal::Integer(n))
    }

    pub fn float(f: f64) -> Self {
        Expr::Literal(Literal::Float(f))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Expr::Literal(Literal::Str(s.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(name.into())
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(operand: Expr) -> Self {
        Expr::Negate(Box::new(operand))
    }

    /// Whether the expression is built only from integer literals.
    ///
    /// Division between two such sub-expressions truncates; anything with a
    /// float literal, a string or a variable reference divides in floating point.
    pub fn is_integer_typed(&self) -> bool {
        match self {
            Expr::Literal(Literal::Integer(_)) => true,
            Expr::Literal(_) | Expr::Variable(_) => false,
            Expr::Negate(operand) => operand.is_integer_typed(),
            Expr::Binary { left, right, .. } => left.is_integer_typed() && right.is_integer_typed(),
        }
    }

    /// Names referenced through `{...}`, in order of first appearance.
    pub fn variables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Variable(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Negate(operand) => operand.collect_variables(names),
            Expr::Binary { left, right, .. } => {
                left.collect_variables(names);
                right.collect_variables(names);
            }
        }
    }
}

/// Characters that end a bare word.
pub(crate) fn is_word_boundary(c: char) -> bool {
    c.is_whitespace() || matches!(c, '+' | '-' | '*' | '/' | '%' | '(' | ')' | '{' | '}' | '"' | '\'')
}

fn write_string_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let bare = !s.is_empty() && !s.chars().any(is_word_boundary) && number_shape(s).is_none();
    if bare {
        return f.write_str(s);
    }
    f.write_str("\"")?;
    for c in s.chars() {
        if c == '"' || c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{}", c)?;
    }
    f.write_str("\"")
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::Float(x) => f.write_str(&format_float(*x)),
            Literal::Str(s) => write_string_literal(f, s),
        }
    }
}

/// Re-serializes to expression text; binary nodes are fully parenthesized
/// so the output parses back to the same tree.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => write!(f, "{}", lit),
            Expr::Variable(name) => write!(f, "{{{}}}", name),
            Expr::Negate(operand) => write!(f, "-{}", operand),
            Expr::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
        }
    }
}
