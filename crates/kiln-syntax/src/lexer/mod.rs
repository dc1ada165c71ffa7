//! Lexical analysis (tokenization)
//!
//! The lexer converts descriptor source into a stream of tokens. Each token
//! remembers whether a line break preceded it, which the parser uses to
//! separate statements the way Kotlin scripts do.

use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::token::{Token, TokenKind};

mod literals;

/// Lexer state for tokenizing source code
pub struct Lexer {
    /// Characters of source code
    pub(super) chars: Vec<char>,
    /// Current position in chars
    pub(super) current: usize,
    /// Current line number (1-indexed)
    pub(super) line: usize,
    /// Current column number (1-indexed)
    pub(super) column: usize,
    /// Start position of current token
    pub(super) start_pos: usize,
    pub(super) start_line: usize,
    pub(super) start_column: usize,
    /// Set when whitespace skipped before the current token contained a newline
    saw_newline: bool,
    pub(super) diagnostics: Vec<Diagnostic>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    ///
    /// A leading byte order mark is skipped.
    pub fn new(source: &str) -> Self {
        let source = crate::strip_byte_order_mark(source);
        Self {
            chars: source.chars().collect(),
            current: 0,
            line: 1,
            column: 1,
            start_pos: 0,
            start_line: 1,
            start_column: 1,
            saw_newline: false,
            diagnostics: Vec::new(),
        }
    }

    /// Tokenize the source code, returning tokens and any diagnostics
    pub fn tokenize(&mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();

        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        (tokens, std::mem::take(&mut self.diagnostics))
    }

    /// Scan the next token
    fn next_token(&mut self) -> Token {
        self.saw_newline = false;
        self.skip_whitespace_and_comments();

        self.start_pos = self.current;
        self.start_line = self.line;
        self.start_column = self.column;

        if self.is_at_end() {
            return self.make_token(TokenKind::Eof, "");
        }

        let c = self.advance();

        match c {
            '(' => self.make_token(TokenKind::LeftParen, "("),
            ')' => self.make_token(TokenKind::RightParen, ")"),
            '{' => self.make_token(TokenKind::LeftBrace, "{"),
            '}' => self.make_token(TokenKind::RightBrace, "}"),
            '[' => self.make_token(TokenKind::LeftBracket, "["),
            ']' => self.make_token(TokenKind::RightBracket, "]"),
            ',' => self.make_token(TokenKind::Comma, ","),
            '.' => self.make_token(TokenKind::Dot, "."),
            '=' => self.make_token(TokenKind::Equal, "="),
            ';' => self.make_token(TokenKind::Semicolon, ";"),
            '<' => self.make_token(TokenKind::Less, "<"),
            '>' => self.make_token(TokenKind::Greater, ">"),
            ':' => {
                if self.match_char(':') {
                    self.make_token(TokenKind::ColonColon, "::")
                } else {
                    self.make_token(TokenKind::Colon, ":")
                }
            }

            '"' => self.string(),
            '`' => self.quoted_identifier(),

            c if c.is_ascii_digit() => self.number(),
            c if c.is_alphabetic() || c == '_' => self.identifier(),

            _ => self.error_token("K1001", &format!("Unexpected character '{}'", c)),
        }
    }

    /// Skip whitespace and comments, remembering whether a newline was crossed
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            if self.is_at_end() {
                return;
            }

            match self.peek() {
                ' ' | '\r' | '\t' => {
                    self.advance();
                }
                '\n' => {
                    self.advance();
                    self.saw_newline = true;
                }
                '/' if self.peek_next() == Some('/') => {
                    while !self.is_at_end() && self.peek() != '\n' {
                        self.advance();
                    }
                }
                '/' if self.peek_next() == Some('*') => self.block_comment(),
                _ => return,
            }
        }
    }

    /// Skip a (possibly nested) block comment
    fn block_comment(&mut self) {
        let start = self.current;
        let start_line = self.line;
        let start_column = self.column;
        self.advance(); // /
        self.advance(); // *

        let mut depth = 1;
        while !self.is_at_end() {
            if self.peek() == '*' && self.peek_next() == Some('/') {
                self.advance();
                self.advance();
                depth -= 1;
                if depth == 0 {
                    return;
                }
            } else if self.peek() == '/' && self.peek_next() == Some('*') {
                self.advance();
                self.advance();
                depth += 1;
            } else {
                if self.peek() == '\n' {
                    self.saw_newline = true;
                }
                self.advance();
            }
        }

        let span = Span::new(start, start + 2, start_line, start_column);
        self.diagnostics.push(
            Diagnostic::error_with_code("K1003", "Unterminated block comment", span)
                .with_label("comment starts here")
                .with_help("add '*/' to close the comment"),
        );
    }

    /// Scan an identifier or keyword
    fn identifier(&mut self) -> Token {
        while !self.is_at_end() && (self.peek().is_alphanumeric() || self.peek() == '_') {
            self.advance();
        }

        let text: String = self.chars[self.start_pos..self.current].iter().collect();
        let kind = TokenKind::is_keyword(&text).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, &text)
    }

    /// Scan a backtick-quoted identifier such as `java-library`
    fn quoted_identifier(&mut self) -> Token {
        let mut name = String::new();
        while !self.is_at_end() && self.peek() != '`' && self.peek() != '\n' {
            name.push(self.advance());
        }

        if self.is_at_end() || self.peek() == '\n' {
            return self.error_token("K1004", "Unterminated quoted identifier");
        }
        self.advance(); // closing backtick

        if name.is_empty() {
            return self.error_token("K1004", "Empty quoted identifier");
        }
        self.make_token(TokenKind::Identifier, &name)
    }

    // === Character navigation ===

    /// Advance to next character and return it
    pub(super) fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    pub(super) fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    pub(super) fn peek_next(&self) -> Option<char> {
        self.chars.get(self.current + 1).copied()
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.current] != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }

    // === Token creation ===

    fn current_span(&self) -> Span {
        Span::new(
            self.start_pos,
            self.current,
            self.start_line,
            self.start_column,
        )
    }

    pub(super) fn make_token(&self, kind: TokenKind, lexeme: &str) -> Token {
        let mut token = Token::new(kind, lexeme, self.current_span());
        token.newline_before = self.saw_newline;
        token
    }

    /// Create an error token and record a diagnostic
    pub(super) fn error_token(&mut self, code: &str, message: &str) -> Token {
        let mut span = self.current_span();
        span.end = span.end.max(span.start + 1);

        self.diagnostics
            .push(Diagnostic::error_with_code(code, message, span).with_label("lexer error"));

        let mut token = Token::new(TokenKind::Error, message, span);
        token.newline_before = self.saw_newline;
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, diags) = Lexer::new(source).tokenize();
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_leading_byte_order_mark() {
        let (tokens, diags) = Lexer::new("\u{feff}plugins { java }").tokenize();
        assert!(diags.is_empty(), "unexpected diagnostics: {:?}", diags);
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "plugins");
        assert_eq!(tokens[0].span.column, 1);
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("( ) { } < > , . = :: ;"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Less,
                TokenKind::Greater,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Equal,
                TokenKind::ColonColon,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("val x by true false null"),
            vec![
                TokenKind::Val,
                TokenKind::Identifier,
                TokenKind::By,
                TokenKind::True,
                TokenKind::False,
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_newline_flag() {
        let (tokens, _) = Lexer::new("scala\n`java-library`").tokenize();
        assert!(!tokens[0].newline_before);
        assert!(tokens[1].newline_before);
        assert_eq!(tokens[1].lexeme, "java-library");
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 1);
    }

    #[test]
    fn test_comments_are_skipped() {
        let source = "/* banner\n * text\n */\n// line comment\nplugins";
        let (tokens, diags) = Lexer::new(source).tokenize();
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        assert_eq!(tokens[0].lexeme, "plugins");
        assert!(tokens[0].newline_before);
        assert_eq!(tokens[0].span.line, 5);
    }

    #[test]
    fn test_nested_block_comment() {
        let (tokens, diags) = Lexer::new("/* a /* b */ c */ x").tokenize();
        assert!(diags.is_empty());
        assert_eq!(tokens[0].lexeme, "x");
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (_, diags) = Lexer::new("/* never closed").tokenize();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "K1003");
    }

    #[test]
    fn test_unexpected_character() {
        let (tokens, diags) = Lexer::new("a # b").tokenize();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "K1001");
        assert_eq!(diags[0].column, 3);
        assert_eq!(tokens[1].kind, TokenKind::Error);
    }
}
