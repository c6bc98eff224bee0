//! Tokenizer for column expressions.
//!
//! Tokens carry the byte offset where they start so parse errors can point
//! at the offending input.

use std::fmt;

use super::ast::is_word_boundary;
use super::value::{format_float, number_shape, NumberShape};
use crate::error::{ParseError, ParseResult};

/// Tokens recognized by the expression lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Integer(i64),
    Float(f64),
    Word(String),
    Quoted(String),
    Variable(String),

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,

    // Delimiters
    LParen,
    RParen,

    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "{}", n),
            Token::Float(x) => f.write_str(&format_float(*x)),
            Token::Word(s) => write!(f, "{}", s),
            Token::Quoted(s) => write!(f, "\"{}\"", s),
            Token::Variable(s) => write!(f, "{{{}}}", s),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Eof => write!(f, "end of expression"),
        }
    }
}

/// A token and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    pub fn input(&self) -> &'a str {
        self.input
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.position += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn error(&self, message: impl Into<String>, position: usize) -> ParseError {
        ParseError::new(message, self.input, position)
    }

    /// Returns the next token, or `Token::Eof` once the input is exhausted.
    pub fn next_token(&mut self) -> ParseResult<Spanned> {
        self.skip_whitespace();
        let start = self.position;

        let token = match self.bump() {
            None => Token::Eof,
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Star,
            Some('/') => Token::Slash,
            Some('%') => Token::Percent,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,
            Some('{') => self.read_variable(start)?,
            Some('}') => return Err(self.error("Unmatched '}'", start)),
            Some(quote @ ('"' | '\'')) => self.read_quoted(quote, start)?,
            Some(_) => self.read_word(start)?,
        };

        Ok(Spanned {
            token,
            position: start,
        })
    }

    /// Reads the rest of `{name}` after the opening brace.
    fn read_variable(&mut self, start: usize) -> ParseResult<Token> {
        let name_start = self.position;
        loop {
            match self.bump() {
                Some('}') => break,
                Some('{') => {
                    return Err(self.error("Nested '{' in column reference", self.position - 1));
                }
                Some(_) => {}
                None => return Err(self.error("Unterminated column reference", start)),
            }
        }
        let name = self.input[name_start..self.position - 1].trim();
        if name.is_empty() {
            return Err(self.error("Empty column reference", start));
        }
        Ok(Token::Variable(name.to_string()))
    }

    /// Reads a quoted string after its opening quote; `\` escapes the next char.
    fn read_quoted(&mut self, quote: char, start: usize) -> ParseResult<Token> {
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('\\') => match self.bump() {
                    Some(c) => text.push(c),
                    None => return Err(self.error("Unterminated string", start)),
                },
                Some(c) if c == quote => return Ok(Token::Quoted(text)),
                Some(c) => text.push(c),
                None => return Err(self.error("Unterminated string", start)),
            }
        }
    }

    /// Reads a bare word; all-digit words become numbers.
    fn read_word(&mut self, start: usize) -> ParseResult<Token> {
        while self.peek_char().is_some_and(|c| !is_word_boundary(c)) {
            self.bump();
        }
        let word = &self.input[start..self.position];

        match number_shape(word) {
            Some(NumberShape::Integer) => word
                .parse::<i64>()
                .map(Token::Integer)
                .map_err(|_| self.error("Integer literal out of range", start)),
            Some(NumberShape::Float) => word
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Token::Float)
                .ok_or_else(|| self.error("Float literal out of range", start)),
            None => Ok(Token::Word(word.to_string())),
        }
    }

    /// Tokenizes the whole input, ending with `Token::Eof`.
    pub fn tokenize(mut self) -> ParseResult<Vec<Spanned>> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        Lexer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_simple_math() {
        assert_eq!(
            tokens("1 + 3"),
            vec![Token::Integer(1), Token::Plus, Token::Integer(3), Token::Eof]
        );
    }

    #[test]
    fn test_no_whitespace_needed() {
        assert_eq!(
            tokens("9/2.0"),
            vec![Token::Integer(9), Token::Slash, Token::Float(2.0), Token::Eof]
        );
    }

    #[test]
    fn test_variables_and_words() {
        assert_eq!(
            tokens("{stim_time} % foo"),
            vec![
                Token::Variable("stim_time".into()),
                Token::Percent,
                Token::Word("foo".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_variable_with_brackets_and_dots() {
        assert_eq!(
            tokens("{ Procedure[Trial] }+{Stim1.RT}"),
            vec![
                Token::Variable("Procedure[Trial]".into()),
                Token::Plus,
                Token::Variable("Stim1.RT".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_word_that_starts_with_digit() {
        assert_eq!(tokens("3abc"), vec![Token::Word("3abc".into()), Token::Eof]);
        assert_eq!(tokens("1.2.3"), vec![Token::Word("1.2.3".into()), Token::Eof]);
    }

    #[test]
    fn test_quoted_strings() {
        assert_eq!(
            tokens(r#""a b" + 'it\'s'"#),
            vec![
                Token::Quoted("a b".into()),
                Token::Plus,
                Token::Quoted("it's".into()),
                Token::Eof
            ]
        );
    }

    #[test]
    fn test_positions() {
        let spans = Lexer::new("12 * (x)").tokenize().unwrap();
        let positions: Vec<usize> = spans.iter().map(|s| s.position).collect();
        assert_eq!(positions, vec![0, 3, 5, 6, 7, 8]);
    }

    #[test]
    fn test_lexer_errors() {
        let err = Lexer::new("1 + {abc").tokenize().unwrap_err();
        assert!(err.message.contains("Unterminated"));
        assert_eq!(err.position, 4);

        let err = Lexer::new("{}").tokenize().unwrap_err();
        assert!(err.message.contains("Empty"));

        let err = Lexer::new("\"open").tokenize().unwrap_err();
        assert!(err.message.contains("Unterminated string"));

        let err = Lexer::new("1 }").tokenize().unwrap_err();
        assert_eq!(err.position, 2);

        let err = Lexer::new("99999999999999999999").tokenize().unwrap_err();
        assert!(err.message.contains("out of range"));
    }

    #[test]
    fn test_huge_float_literal_is_rejected() {
        let huge = format!("{}.0", "9".repeat(400));
        let err = Lexer::new(&format!("1 + {}", huge)).tokenize().unwrap_err();
        assert!(err.message.contains("Float literal out of range"), "{}", err.message);
        assert_eq!(err.position, 4);

        let largest = format!("{:.1}", f64::MAX);
        assert!(matches!(
            tokens(&largest).as_slice(),
            [Token::Float(f), Token::Eof] if *f == f64::MAX
        ));
    }
}
