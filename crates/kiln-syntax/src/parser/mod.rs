//! Parsing (tokens to syntax tree)
//!
//! Recursive descent over the Kotlin-DSL subset used by build descriptors.
//! Statements end at a line break, a `;` or a closing `}`.

mod expr;
mod stmt;
mod template;

pub use template::parse_template;

use crate::ast::*;
use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Deepest nesting of blocks and expressions the parser accepts
pub const MAX_NESTING: usize = 64;

/// Parser state for building a script from tokens
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    pub(super) diagnostics: Vec<Diagnostic>,
    /// Current block and expression nesting
    depth: usize,
    nesting_reported: bool,
}

impl Parser {
    /// Create a new parser. Lexer error tokens are dropped since the lexer
    /// has already reported them.
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens: Vec<Token> = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Error)
            .collect();

        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or_else(Span::dummy);
            tokens.push(Token::new(
                TokenKind::Eof,
                "",
                Span::new(end.end, end.end, end.line, end.column),
            ));
        }

        Self {
            tokens,
            current: 0,
            diagnostics: Vec::new(),
            depth: 0,
            nesting_reported: false,
        }
    }

    /// Parse tokens into a script
    pub fn parse(&mut self) -> (Script, Vec<Diagnostic>) {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.match_token(TokenKind::Semicolon) {
                continue;
            }

            if self.check(TokenKind::RightBrace) {
                self.error_at_current("K2006", "Unexpected '}' without a matching '{'");
                self.advance();
                continue;
            }

            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize(),
            }
        }

        (Script { statements }, std::mem::take(&mut self.diagnostics))
    }

    /// Parse a `{ ... }` block
    pub(super) fn parse_block(&mut self) -> Result<Block, ()> {
        self.nested(Self::parse_block_body)
    }

    fn parse_block_body(&mut self) -> Result<Block, ()> {
        let open = self
            .consume(TokenKind::LeftBrace, "Expected '{' to start block")?
            .span;
        let mut statements = Vec::new();

        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            if self.match_token(TokenKind::Semicolon) {
                continue;
            }

            match self.parse_statement() {
                Ok(stmt) => statements.push(stmt),
                Err(()) => self.synchronize(),
            }
        }

        let close = self
            .consume(TokenKind::RightBrace, "Expected '}' to close block")?
            .span;

        Ok(Block {
            statements,
            span: open.merge(close),
        })
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`]
    pub(super) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ()>,
    ) -> Result<T, ()> {
        if self.depth >= MAX_NESTING {
            if !self.nesting_reported {
                self.nesting_reported = true;
                self.error_at_current(
                    "K2008",
                    &format!("Nesting deeper than {} levels", MAX_NESTING),
                );
            }
            return Err(());
        }

        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Skip to the start of the next statement after an error
    fn synchronize(&mut self) {
        if !self.is_at_end() && !self.check(TokenKind::RightBrace) {
            self.advance();
        }

        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            let next = self.peek();
            if next.newline_before || next.kind == TokenKind::RightBrace {
                return;
            }
            self.advance();
        }
    }

    // === Token navigation ===

    pub(super) fn peek(&self) -> &Token {
        &self.tokens[self.current.min(self.tokens.len() - 1)]
    }

    pub(super) fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.current + offset)
    }

    pub(super) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(super) fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Check the current token kind and that it sits on the same line as the previous token
    pub(super) fn check_same_line(&self, kind: TokenKind) -> bool {
        self.check(kind) && !self.peek().newline_before
    }

    pub(super) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        token
    }

    pub(super) fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, ()> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let found = self.describe_current();
            self.error_at_current("K2002", &format!("{}, found {}", message, found));
            Err(())
        }
    }

    pub(super) fn consume_identifier(&mut self, what: &str) -> Result<Ident, ()> {
        let token = self.consume(TokenKind::Identifier, &format!("Expected {}", what))?;
        Ok(Ident {
            name: token.lexeme,
            span: token.span,
        })
    }

    pub(super) fn describe_current(&self) -> String {
        let token = self.peek();
        match token.kind {
            TokenKind::Eof => "end of file".to_string(),
            TokenKind::String => format!("string \"{}\"", token.lexeme),
            _ => format!("'{}'", token.lexeme),
        }
    }

    pub(super) fn error_at_current(&mut self, code: &str, message: &str) {
        let span = self.peek().span;
        self.error_at(code, message, span);
    }

    pub(super) fn error_at(&mut self, code: &str, message: &str, span: Span) {
        self.diagnostics
            .push(Diagnostic::error_with_code(code, message, span).with_label("syntax error"));
    }
}
