//! Token types produced by the lexer.

use crate::domain::rule::{CompareOp, CrossDirection, LogicalOp};
use std::fmt;

/// Reserved words. Matched case-insensitively by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Entry,
    Exit,
    /// Bare `CROSS`: direction is not fixed by the syntax.
    Cross,
    /// `CROSSOVER` / `CROSS_ABOVE` and `CROSSUNDER` / `CROSS_BELOW`.
    CrossDirectional(CrossDirection),
}

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        match word.to_ascii_uppercase().as_str() {
            "ENTRY" => Some(Keyword::Entry),
            "EXIT" => Some(Keyword::Exit),
            "CROSS" => Some(Keyword::Cross),
            "CROSSOVER" | "CROSS_ABOVE" => Some(Keyword::CrossDirectional(CrossDirection::Over)),
            "CROSSUNDER" | "CROSS_BELOW" => {
                Some(Keyword::CrossDirectional(CrossDirection::Under))
            }
            _ => None,
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keyword::Entry => write!(f, "ENTRY"),
            Keyword::Exit => write!(f, "EXIT"),
            Keyword::Cross => write!(f, "CROSS"),
            Keyword::CrossDirectional(CrossDirection::Over) => write!(f, "CROSSOVER"),
            Keyword::CrossDirectional(CrossDirection::Under) => write!(f, "CROSSUNDER"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Number(f64),
    Op(CompareOp),
    Logical(LogicalOp),
    LParen,
    RParen,
    Comma,
    Colon,
    Keyword(Keyword),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source slice the token was read from (empty for `Eof`).
    pub text: String,
    /// Byte offset of the first character.
    pub position: usize,
}

impl Token {
    /// Human-readable description used in "found ..." parse messages.
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Number(_) => format!("number {}", self.text),
            TokenKind::Op(op) => format!("'{}'", op),
            TokenKind::Logical(op) => op.to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Keyword(kw) => kw.to_string(),
            TokenKind::Eof => "end of input".to_string(),
        }
    }
}
