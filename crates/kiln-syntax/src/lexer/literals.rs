//! Literal scanning for the lexer

use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

impl Lexer {
    /// Scan a string literal
    ///
    /// The token lexeme is the raw text between the quotes. Escapes and
    /// `$` templates are interpreted by the parser.
    pub(super) fn string(&mut self) -> Token {
        let mut raw = String::new();

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() == '\n' {
                return self.error_unterminated_string();
            }

            if self.peek() == '\\' {
                raw.push(self.advance());
                if self.is_at_end() {
                    return self.error_unterminated_string();
                }
            }
            raw.push(self.advance());
        }

        if self.is_at_end() {
            return self.error_unterminated_string();
        }

        self.advance(); // closing "
        self.make_token(TokenKind::String, &raw)
    }

    /// Scan an integer or decimal literal
    pub(super) fn number(&mut self) -> Token {
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        // Kotlin long suffix
        if self.peek() == 'L' {
            self.advance();
        }

        let text: String = self.chars[self.start_pos..self.current].iter().collect();
        self.make_token(TokenKind::Number, text.trim_end_matches('L'))
    }

    fn error_unterminated_string(&mut self) -> Token {
        let token = self.error_token("K1002", "Unterminated string literal");
        if let Some(diag) = self.diagnostics.last_mut() {
            diag.help = Some("add a closing '\"' on the same line".to_string());
        }
        token
    }
}

#[cfg(test)]
mod tests {
    use crate::lexer::Lexer;
    use crate::token::TokenKind;

    #[test]
    fn test_string_keeps_raw_escapes() {
        let (tokens, diags) = Lexer::new(r#""a\"b\$c""#).tokenize();
        assert!(diags.is_empty());
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, r#"a\"b\$c"#);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, diags) = Lexer::new("implementation(\"org.scala-lang\n)").tokenize();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "K1002");
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
    }

    #[test]
    fn test_numbers() {
        let (tokens, _) = Lexer::new("4 2.5 10L").tokenize();
        assert_eq!(tokens[0].lexeme, "4");
        assert_eq!(tokens[1].lexeme, "2.5");
        assert_eq!(tokens[2].lexeme, "10");
        assert!(tokens[..3].iter().all(|t| t.kind == TokenKind::Number));
    }
}
