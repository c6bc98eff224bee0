//! Scalar values produced by expression evaluation.

use std::fmt;

/// Result of evaluating an expression: a number or a string.
///
/// Integers and floats are kept apart so that integer arithmetic stays exact
/// and division can follow the literal typing rule of the evaluator.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
}

/// Numeric shape of a token, decided purely from its characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberShape {
    /// One or more ASCII digits.
    Integer,
    /// Digits with exactly one `.` and at least one digit.
    Float,
}

/// Classify `text` as an integer or float literal, if it is one.
///
/// Signs, exponents, `inf` and `NaN` are not numeric literals.
pub(crate) fn number_shape(text: &str) -> Option<NumberShape> {
    let mut digits = 0;
    let mut dots = 0;
    for c in text.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return None,
        }
    }
    match (digits, dots) {
        (0, _) => None,
        (_, 0) => Some(NumberShape::Integer),
        (_, 1) => Some(NumberShape::Float),
        _ => None,
    }
}

impl Value {
    /// Re-read a stored field value the way a literal would be read.
    ///
    /// Surrounding whitespace and one leading `-` are accepted for numbers.
    /// Anything that is not numeric stays a string, untouched.
    pub fn from_field(text: &str) -> Value {
        let trimmed = text.trim();
        let unsigned = trimmed.strip_prefix('-').unwrap_or(trimmed);

        match number_shape(unsigned) {
            Some(NumberShape::Integer) => match trimmed.parse::<i64>() {
                Ok(n) => Value::Int(n),
                // Too wide for i64; keep the magnitude as a float
                Err(_) => trimmed
                    .parse::<f64>()
                    .map(Value::Float)
                    .unwrap_or_else(|_| Value::Str(text.to_string())),
            },
            Some(NumberShape::Float) => trimmed
                .parse::<f64>()
                .map(Value::Float)
                .unwrap_or_else(|_| Value::Str(text.to_string())),
            None => Value::Str(text.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Float(f) if f.is_nan())
    }

    /// Numeric view of the value, `None` for strings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            Value::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Canonical text of a float: always carries a decimal point when finite.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        return "NaN".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let text = f.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{}.0", text)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}
