//! Token types for lexical analysis

use crate::span::Span;
use serde::{Deserialize, Serialize};

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// Token text. For strings this is the raw content between the quotes,
    /// for backtick identifiers the name without backticks.
    pub lexeme: String,
    /// Source location
    pub span: Span,
    /// Whether a line break separates this token from the previous one
    pub newline_before: bool,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
            newline_before: false,
        }
    }
}

/// Classification of token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Integer or decimal literal
    Number,
    /// String literal, possibly containing `$` templates
    String,
    True,
    False,
    Null,
    /// Plain or backtick-quoted identifier
    Identifier,

    // Keywords
    /// `val`
    Val,
    /// `by` (property delegation)
    By,

    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    Comma,
    Dot,
    Equal,
    Colon,
    /// `::` (class references)
    ColonColon,
    Less,
    Greater,
    Semicolon,

    /// Lexer error placeholder; a diagnostic was recorded
    Error,
    Eof,
}

impl TokenKind {
    /// Check whether an identifier is a reserved word
    pub fn is_keyword(ident: &str) -> Option<TokenKind> {
        match ident {
            "val" => Some(TokenKind::Val),
            "by" => Some(TokenKind::By),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Identifier => "identifier",
            TokenKind::Val => "val",
            TokenKind::By => "by",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Equal => "=",
            TokenKind::Colon => ":",
            TokenKind::ColonColon => "::",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::Semicolon => ";",
            TokenKind::Error => "error",
            TokenKind::Eof => "end of file",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
