//! Statement parsing

use crate::ast::*;
use crate::parser::Parser;
use crate::token::TokenKind;

impl Parser {
    /// Parse one statement including its terminator
    pub(super) fn parse_statement(&mut self) -> Result<Stmt, ()> {
        let stmt = if self.check(TokenKind::Val) {
            Stmt::Val(self.parse_val()?)
        } else {
            self.parse_expression_statement()?
        };

        self.expect_statement_end()?;
        Ok(stmt)
    }

    /// `val name = expr` or `val name by delegate`
    fn parse_val(&mut self) -> Result<ValDecl, ()> {
        let val_span = self.consume(TokenKind::Val, "Expected 'val'")?.span;
        let name = self.consume_identifier("a name after 'val'")?;

        // Optional type annotation: val x: String = ...
        if self.match_token(TokenKind::Colon) {
            self.consume_identifier("a type after ':'")?;
        }

        let init = if self.match_token(TokenKind::Equal) {
            ValInit::Value(self.parse_expression()?)
        } else if self.match_token(TokenKind::By) {
            ValInit::Delegate(self.parse_expression()?)
        } else {
            let found = self.describe_current();
            self.error_at_current(
                "K2002",
                &format!("Expected '=' or 'by' after val name, found {}", found),
            );
            return Err(());
        };

        let end = self.previous().span;
        Ok(ValDecl {
            name,
            init,
            span: val_span.merge(end),
        })
    }

    fn parse_expression_statement(&mut self) -> Result<Stmt, ()> {
        let expr = self.parse_expression()?;

        if !self.check(TokenKind::Equal) {
            return Ok(Stmt::Expr(expr));
        }

        let eq_span = self.advance().span;
        if !matches!(expr, Expr::Ident(_) | Expr::Member { .. }) {
            self.error_at(
                "K2004",
                &format!("Invalid assignment target '{}'", expr),
                eq_span,
            );
            return Err(());
        }

        let value = self.parse_expression()?;
        let span = expr.span().merge(value.span());
        Ok(Stmt::Assign {
            target: expr,
            value,
            span,
        })
    }

    fn expect_statement_end(&mut self) -> Result<(), ()> {
        if self.match_token(TokenKind::Semicolon)
            || self.check(TokenKind::RightBrace)
            || self.is_at_end()
            || self.peek().newline_before
        {
            return Ok(());
        }

        let found = self.describe_current();
        self.error_at_current(
            "K2003",
            &format!("Expected a new line or ';' after statement, found {}", found),
        );
        Err(())
    }
}
