//! Expression parsing

use crate::ast::*;
use crate::parser::{parse_template, Parser};
use crate::token::TokenKind;

impl Parser {
    /// Parse an expression, including single-line infix calls
    pub(super) fn parse_expression(&mut self) -> Result<Expr, ()> {
        self.nested(Self::parse_infix)
    }

    fn parse_infix(&mut self) -> Result<Expr, ()> {
        let mut expr = self.parse_postfix()?;

        while self.check_same_line(TokenKind::Identifier) && self.infix_operand_follows() {
            let op = self.consume_identifier("an infix function name")?;
            let rhs = self.parse_postfix()?;
            let span = expr.span().merge(rhs.span());
            expr = Expr::Infix {
                lhs: Box::new(expr),
                op,
                rhs: Box::new(rhs),
                span,
            };
        }

        Ok(expr)
    }

    /// Whether the token after an identifier can start an infix operand
    fn infix_operand_follows(&self) -> bool {
        match self.peek_at(1) {
            Some(token) if !token.newline_before => matches!(
                token.kind,
                TokenKind::String
                    | TokenKind::Number
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Null
                    | TokenKind::Identifier
            ),
            _ => false,
        }
    }

    /// Member access, calls, type arguments, trailing lambdas and class references
    fn parse_postfix(&mut self) -> Result<Expr, ()> {
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(TokenKind::Dot) {
                self.advance();
                let name = self.consume_identifier("a member name after '.'")?;
                let span = expr.span().merge(name.span);
                expr = Expr::Member {
                    receiver: Box::new(expr),
                    name,
                    span,
                };
            } else if self.check_same_line(TokenKind::Less) && expr.path().is_some() {
                let type_args = self.parse_type_args()?;
                if !self.check_same_line(TokenKind::LeftParen)
                    && !self.check_same_line(TokenKind::LeftBrace)
                {
                    let found = self.describe_current();
                    self.error_at_current(
                        "K2002",
                        &format!("Expected '(' or '{{' after type arguments, found {}", found),
                    );
                    return Err(());
                }
                expr = self.parse_call(expr, type_args)?;
            } else if self.check_same_line(TokenKind::LeftParen) {
                expr = self.parse_call(expr, Vec::new())?;
            } else if self.check_same_line(TokenKind::LeftBrace) && expr.path().is_some() {
                expr = self.parse_call(expr, Vec::new())?;
            } else if self.check(TokenKind::ColonColon) {
                let colons = self.advance().span;
                let Some(path) = expr.path() else {
                    self.error_at("K2001", "Expected a type name before '::'", colons);
                    return Err(());
                };
                let member = self.consume_identifier("'class' after '::'")?;
                if member.name != "class" {
                    self.error_at(
                        "K2007",
                        &format!("Unsupported callable reference '::{}'", member.name),
                        member.span,
                    );
                    return Err(());
                }
                let span = expr.span().merge(member.span);
                expr = Expr::ClassRef(
                    Ident {
                        name: path,
                        span: expr.span(),
                    },
                    span,
                );
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse arguments and an optional trailing lambda after `callee`
    fn parse_call(&mut self, callee: Expr, type_args: Vec<String>) -> Result<Expr, ()> {
        let args = if self.check_same_line(TokenKind::LeftParen) {
            self.parse_args()?
        } else {
            Vec::new()
        };

        let lambda = if self.check_same_line(TokenKind::LeftBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };

        let span = callee.span().merge(self.previous().span);
        Ok(Expr::Call(Call {
            callee: Box::new(callee),
            type_args,
            args,
            lambda,
            span,
        }))
    }

    fn parse_args(&mut self) -> Result<Vec<Arg>, ()> {
        self.consume(TokenKind::LeftParen, "Expected '('")?;
        let mut args = Vec::new();

        if !self.check(TokenKind::RightParen) {
            loop {
                let named = self.check(TokenKind::Identifier)
                    && self.peek_at(1).map(|t| t.kind) == Some(TokenKind::Equal);

                let name = if named {
                    let ident = self.consume_identifier("an argument name")?;
                    self.advance(); // =
                    Some(ident)
                } else {
                    None
                };

                let value = self.parse_expression()?;
                args.push(Arg { name, value });

                if !self.match_token(TokenKind::Comma) {
                    break;
                }
                // Trailing comma
                if self.check(TokenKind::RightParen) {
                    break;
                }
            }
        }

        self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;
        Ok(args)
    }

    /// `<Test>` or `<org.gradle.api.tasks.testing.Test, Other>`
    fn parse_type_args(&mut self) -> Result<Vec<String>, ()> {
        self.consume(TokenKind::Less, "Expected '<'")?;
        let mut type_args = Vec::new();

        loop {
            let mut name = self.consume_identifier("a type name")?.name;
            while self.match_token(TokenKind::Dot) {
                name.push('.');
                name.push_str(&self.consume_identifier("a type name after '.'")?.name);
            }
            type_args.push(name);

            if !self.match_token(TokenKind::Comma) {
                break;
            }
        }

        self.consume(TokenKind::Greater, "Expected '>' after type arguments")?;
        Ok(type_args)
    }

    fn parse_primary(&mut self) -> Result<Expr, ()> {
        let token = self.peek().clone();

        match token.kind {
            TokenKind::String => {
                self.advance();
                match parse_template(&token.lexeme) {
                    Ok(parts) => Ok(Expr::Literal(Literal::String(parts), token.span)),
                    Err(message) => {
                        self.error_at("K2005", &message, token.span);
                        Err(())
                    }
                }
            }
            TokenKind::Number => {
                self.advance();
                Ok(Expr::Literal(Literal::Number(token.lexeme), token.span))
            }
            TokenKind::True => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(true), token.span))
            }
            TokenKind::False => {
                self.advance();
                Ok(Expr::Literal(Literal::Bool(false), token.span))
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal(Literal::Null, token.span))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Ident(Ident {
                    name: token.lexeme,
                    span: token.span,
                }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
                Ok(expr)
            }
            TokenKind::LeftBrace => Ok(Expr::Lambda(self.parse_block()?)),
            _ => {
                let found = self.describe_current();
                self.error_at_current("K2001", &format!("Expected expression, found {}", found));
                Err(())
            }
        }
    }
}
