//! Condition-language lexer.
//!
//! Turns raw strategy text into a flat token sequence terminated by `Eof`.
//! Whitespace (including newlines) is skipped. Keywords and logical
//! operators are matched case-insensitively; identifiers keep their case.

use crate::domain::error::LexError;
use crate::domain::rule::{CompareOp, LogicalOp};
use crate::domain::token::{Keyword, Token, TokenKind};

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn error(&self, position: usize, found: char, message: String) -> LexError {
        LexError {
            message,
            position,
            found,
        }
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            text: self.input[start..self.pos].to_string(),
            position: start,
        }
    }

    fn lex_word(&mut self, start: usize) -> Token {
        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }
        let word = &self.input[start..self.pos];
        let kind = if word.eq_ignore_ascii_case("AND") {
            TokenKind::Logical(LogicalOp::And)
        } else if word.eq_ignore_ascii_case("OR") {
            TokenKind::Logical(LogicalOp::Or)
        } else if let Some(kw) = Keyword::lookup(word) {
            TokenKind::Keyword(kw)
        } else {
            TokenKind::Ident(word.to_string())
        };
        self.token(kind, start)
    }

    fn lex_number(&mut self, start: usize) -> Result<Token, LexError> {
        if matches!(self.peek(), Some('-') | Some('+')) {
            self.advance();
        }

        let mut digits = 0;
        while let Some(ch) = self.peek() {
            if ch.is_ascii_digit() {
                digits += 1;
                self.advance();
            } else {
                break;
            }
        }
        if digits == 0 {
            let found = self.peek().unwrap_or(' ');
            let sign = self.input[start..].chars().next().unwrap_or('-');
            return Err(self.error(
                start,
                sign,
                format!("sign '{}' must be followed by digits, found '{}'", sign, found),
            ));
        }

        if self.peek() == Some('.') {
            let dot = self.pos;
            self.advance();
            let mut frac = 0;
            while let Some(ch) = self.peek() {
                if ch.is_ascii_digit() {
                    frac += 1;
                    self.advance();
                } else {
                    break;
                }
            }
            if frac == 0 {
                return Err(self.error(
                    dot,
                    '.',
                    format!(
                        "malformed number '{}': decimal point must be followed by digits",
                        &self.input[start..self.pos]
                    ),
                ));
            }
        }

        if let Some(ch) = self.peek() {
            if ch.is_alphabetic() || ch == '_' || ch == '.' {
                return Err(self.error(
                    self.pos,
                    ch,
                    format!(
                        "malformed number '{}{}'",
                        &self.input[start..self.pos],
                        ch
                    ),
                ));
            }
        }

        let text = &self.input[start..self.pos];
        let value: f64 = text.parse().map_err(|_| LexError {
            message: format!("invalid number: {}", text),
            position: start,
            found: text.chars().next().unwrap_or('0'),
        })?;
        Ok(self.token(TokenKind::Number(value), start))
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let start = self.pos;
        let Some(ch) = self.peek() else {
            return Ok(self.token(TokenKind::Eof, start));
        };

        if ch.is_alphabetic() || ch == '_' {
            return Ok(self.lex_word(start));
        }
        if ch.is_ascii_digit() || ch == '-' || ch == '+' {
            return self.lex_number(start);
        }

        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '>' if self.peek_second() == Some('=') => {
                self.advance();
                TokenKind::Op(CompareOp::Ge)
            }
            '<' if self.peek_second() == Some('=') => {
                self.advance();
                TokenKind::Op(CompareOp::Le)
            }
            '=' if self.peek_second() == Some('=') => {
                self.advance();
                TokenKind::Op(CompareOp::Eq)
            }
            '>' => TokenKind::Op(CompareOp::Gt),
            '<' => TokenKind::Op(CompareOp::Lt),
            '=' => {
                return Err(self.error(start, ch, "expected '==', found single '='".to_string()));
            }
            _ => {
                return Err(self.error(start, ch, format!("unexpected character '{}'", ch)));
            }
        };
        self.advance();
        Ok(self.token(kind, start))
    }
}

/// Tokenize `input`. The returned vector always ends with a single `Eof` token.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer::new(input);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
