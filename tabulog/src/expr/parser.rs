//! Recursive descent parser that turns expression text into an [`Expr`].
//!
//! GRAMMAR:
//!   expression     --> additive
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/" | "%") unary )*
//!   unary          --> "-" unary | primary
//!   primary        --> INTEGER | FLOAT | WORD | QUOTED | VARIABLE | "(" expression ")"
//!
//! Binary operators are left-associative. The whole input must be consumed;
//! there is no partial result.
//!
//! Both the parser's recursion and the depth of the resulting tree are capped
//! at [`MAX_DEPTH`], so evaluating or printing a parsed tree stays within a
//! thread's stack.

use super::ast::{BinaryOp, Expr, Literal};
use super::lexer::{Lexer, Spanned, Token};
use crate::error::{ParseError, ParseResult};

/// Deepest nesting of groups, negations and operator chains an expression may have.
pub const MAX_DEPTH: usize = 256;

/// A parsed sub-expression with the depth of its tree.
type Parsed = (Expr, usize);

/// Parse an expression string into an AST.
///
/// # Example
/// ```
/// use tabulog::expr::parse;
///
/// let expr = parse("4*(3+2)").unwrap();
/// assert_eq!(expr.to_string(), "(4 * (3 + 2))");
/// ```
pub fn parse(input: &str) -> ParseResult<Expr> {
    Parser::new(input)?.parse()
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Spanned,
    /// Groups and negations currently open
    nesting: usize,
}

impl<'a> Parser<'a> {
    /// Creates a parser positioned on the first token.
    pub fn new(input: &'a str) -> ParseResult<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Parser { lexer, current, nesting: 0 })
    }

    /// Parses the entire input.
    pub fn parse(&mut self) -> ParseResult<Expr> {
        if self.current.token == Token::Eof {
            return Err(self.error("Empty expression"));
        }

        let (expr, _) = self.parse_additive()?;

        match self.current.token {
            Token::Eof => Ok(expr),
            Token::RParen => Err(self.error("Unmatched ')'")),
            ref token => Err(self.error(format!("Unexpected '{}' after complete expression", token))),
        }
    }

    fn advance(&mut self) -> ParseResult<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.lexer.input(), self.current.position)
    }

    fn too_deep(&self) -> ParseError {
        self.error(format!("Expression nested too deeply (limit {})", MAX_DEPTH))
    }

    fn enter(&mut self) -> ParseResult<()> {
        if self.nesting >= MAX_DEPTH {
            return Err(self.too_deep());
        }
        self.nesting += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.nesting -= 1;
    }

    fn binary(&self, op: BinaryOp, (left, left_depth): Parsed, (right, right_depth): Parsed) -> ParseResult<Parsed> {
        let depth = left_depth.max(right_depth) + 1;
        if depth > MAX_DEPTH {
            return Err(self.too_deep());
        }
        Ok((Expr::binary(op, left, right), depth))
    }

    fn parse_additive(&mut self) -> ParseResult<Parsed> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match self.current.token {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Subtract,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_multiplicative()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Parsed> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.current.token {
                Token::Star => BinaryOp::Multiply,
                Token::Slash => BinaryOp::Divide,
                Token::Percent => BinaryOp::Modulo,
                _ => break,
            };

            self.advance()?;
            let right = self.parse_unary()?;
            left = self.binary(op, left, right)?;
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Parsed> {
        if self.current.token == Token::Minus {
            self.enter()?;
            self.advance()?;
            let (operand, depth) = self.parse_unary()?;
            self.leave();
            if depth >= MAX_DEPTH {
                return Err(self.too_deep());
            }
            return Ok((Expr::negate(operand), depth + 1));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Parsed> {
        if self.current.token == Token::LParen {
            return self.parse_group();
        }

        let expr = match &self.current.token {
            Token::Integer(n) => Expr::Literal(Literal::Integer(*n)),
            Token::Float(f) => Expr::Literal(Literal::Float(*f)),
            Token::Word(s) | Token::Quoted(s) => Expr::Literal(Literal::Str(s.clone())),
            Token::Variable(name) => Expr::Variable(name.clone()),
            Token::Eof => return Err(self.error("Unexpected end of expression")),
            token => return Err(self.error(format!("Unexpected '{}'", token))),
        };

        self.advance()?;
        Ok((expr, 1))
    }

    /// Parses `( expression )` with the current token on the opening paren.
    fn parse_group(&mut self) -> ParseResult<Parsed> {
        let open = self.current.position;
        self.enter()?;
        self.advance()?;
        if self.current.token == Token::RParen {
            return Err(self.error("Empty parentheses"));
        }

        let inner = self.parse_additive()?;

        match self.current.token {
            Token::RParen => {
                self.leave();
                self.advance()?;
                Ok(inner)
            }
            Token::Eof => Err(ParseError::new("Unclosed '('", self.lexer.input(), open)),
            ref token => Err(self.error(format!("Expected ')', found '{}'", token))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_as(input: &str, expected: &str) {
        let parsed = parse(input).unwrap_or_else(|e| panic!("expected {} to parse; raised {}", input, e));
        assert_eq!(parsed.to_string(), expected, "expected {} to parse to {}", input, expected);
    }

    fn round_trip(input: &str) {
        parse_as(input, input);
    }

    #[test]
    fn test_literals() {
        parse_as("1", "1");
        parse_as("2.5", "2.5");
        parse_as("foo", "foo");
        parse_as("'foo bar'", "\"foo bar\"");
        parse_as("{stim_time}", "{stim_time}");
    }

    #[test]
    fn test_precedence() {
        parse_as("1+2*3", "(1 + (2 * 3))");
        parse_as("1*2+3", "((1 * 2) + 3)");
        parse_as("10 % 4 + 1", "((10 % 4) + 1)");
        parse_as("4*(3+2)", "(4 * (3 + 2))");
    }

    #[test]
    fn test_left_associativity() {
        parse_as("8 - 3 - 2", "((8 - 3) - 2)");
        parse_as("8 / 4 / 2", "((8 / 4) / 2)");
        parse_as("a + b + c", "((a + b) + c)");
    }

    #[test]
    fn test_unary_binds_tighter_than_multiplication() {
        parse_as("4 + -5", "(4 + -5)");
        parse_as("-2 * 3", "(-2 * 3)");
        parse_as("2 * -3", "(2 * -3)");
        parse_as("--1", "--1");
        parse_as("-(1 + 2)", "-(1 + 2)");
    }

    #[test]
    fn test_round_trips() {
        round_trip("(1 + 3)");
        round_trip("(({stim_time} - {run_start}) / 1000)");
        round_trip("(9 / 2.0)");
        round_trip("(\"a b\" + {x})");
        round_trip("-{x}");
    }

    #[test]
    fn test_reparse_is_structurally_equal() {
        let inputs = [
            "1+3",
            "4 + -5",
            "4*(3+2)",
            "9/2.0",
            "0.44*10",
            "10 % 4",
            "a + a",
            "'12' + \"x\\\"y\"",
            "{stim_offset}/1000",
            "-(-{a} % 3.25) - 'with space'",
        ];
        for input in inputs {
            let first = parse(input).unwrap();
            let second = parse(&first.to_string()).unwrap();
            assert_eq!(first, second, "round trip changed the tree for {}", input);
        }
    }

    #[test]
    fn test_malformed_expressions_fail() {
        let cases = [
            ("", "Empty expression"),
            ("   ", "Empty expression"),
            ("(1 + 2", "Unclosed '('"),
            ("1 + 2)", "Unmatched ')'"),
            ("1 +", "Unexpected end"),
            ("* 2", "Unexpected '*'"),
            ("1 2", "Unexpected '2'"),
            ("()", "Empty parentheses"),
            ("(1 2)", "Expected ')'"),
            ("foo bar", "Unexpected 'bar'"),
        ];
        for (input, message) in cases {
            let err = parse(input).expect_err(input);
            assert!(
                err.message.contains(message),
                "{}: expected '{}' in '{}'",
                input,
                message,
                err.message
            );
        }
    }

    #[test]
    fn test_error_positions() {
        let err = parse("1 + 2)").unwrap_err();
        assert_eq!(err.position, 5);
        assert_eq!(err.fragment, ")");

        let err = parse("(1 + 2").unwrap_err();
        assert_eq!(err.position, 0);

        let err = parse("1 * / 2").unwrap_err();
        assert_eq!(err.position, 4);
        assert_eq!(err.fragment, "/ 2");
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let n = 10_000;
        let input = format!("{}1{}", "(".repeat(n), ")".repeat(n));
        let err = parse(&input).unwrap_err();
        assert!(err.message.contains("nested too deeply"), "{}", err.message);
        assert_eq!(err.position, MAX_DEPTH);

        let err = parse(&format!("{}1", "-".repeat(n))).unwrap_err();
        assert!(err.message.contains("nested too deeply"));
    }

    #[test]
    fn test_long_operator_chain_is_bounded() {
        let chain = vec!["1"; 10_000].join(" + ");
        let err = parse(&chain).unwrap_err();
        assert!(err.message.contains("nested too deeply"));

        let short = vec!["1"; 100].join(" + ");
        assert!(parse(&short).is_ok());
    }

    #[test]
    fn test_nesting_within_limit_parses() {
        let n = 200;
        let input = format!("{}{{x}}{}", "(".repeat(n), ")".repeat(n));
        parse_as(&input, "{x}");

        let input = format!("{}1", "-".repeat(n));
        assert!(parse(&input).is_ok());

        // Sibling groups do not add up.
        let siblings = vec!["((1))"; 100].join(" * ");
        assert!(parse(&siblings).is_ok());
    }

    #[test]
    fn test_lexer_errors_propagate() {
        let err = parse("{a} + {b").unwrap_err();
        assert!(err.message.contains("Unterminated column reference"));
        assert_eq!(err.position, 6);
    }
}
