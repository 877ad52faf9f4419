//! Recursive descent expression parser.
//!
//! One method per precedence level, lowest first:
//! `or`, `and`, `not`, comparisons, `|`, `^`, `&`, shifts, `+ -`,
//! `* / %`, `**` (left associative), unary `- + ~`, primary.

mod operators;

use numex_diagnostic::CompileError;
use numex_ir::{BinaryOp, UnaryOp};
use numex_lexer::{lex, Span, Token, TokenKind};
use numex_stack::ensure_sufficient_stack;

use crate::{Expr, ExprKind};

/// Parse a complete expression. Errors carry a 1-based byte offset.
pub fn parse_expr(source: &str) -> Result<Expr, CompileError> {
    let tokens = lex(source).map_err(|e| CompileError::parse(e.offset + 1, e.message))?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
    };
    let expr = parser.parse_or()?;
    if !parser.check(&TokenKind::Eof) {
        return Err(parser.error_here(format!(
            "unexpected {} after expression",
            parser.current_kind().describe()
        )));
    }
    Ok(expr)
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser<'_> {
    #[inline]
    fn current(&self) -> &Token {
        // `lex` always ends the stream with `Eof`, which is never consumed.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    #[inline]
    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected {what}, found {}",
                self.current_kind().describe()
            )))
        }
    }

    fn error_here(&self, message: impl Into<String>) -> CompileError {
        CompileError::parse(self.current().span.start as usize + 1, message)
    }

    fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
        let span = Span::new(left.span.start, right.span.end);
        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    /// Parse `or` / `||` (lowest precedence).
    fn parse_or(&mut self) -> Result<Expr, CompileError> {
        ensure_sufficient_stack(|| {
            let mut left = self.parse_and()?;
            while self.check(&TokenKind::Or) {
                self.advance();
                let right = self.parse_and()?;
                left = Self::binary(BinaryOp::Or, left, right);
            }
            Ok(left)
        })
    }

    fn parse_and(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_not()?;
        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_not()?;
            left = Self::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, CompileError> {
        if self.check(&TokenKind::Not) {
            let start = self.advance().span.start;
            let operand = ensure_sufficient_stack(|| self.parse_not())?;
            let span = Span::new(start, operand.span.end);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_bit_or()?;
        while let Some(op) = self.match_comparison_op() {
            self.advance();
            let right = self.parse_bit_or()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_bit_or(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_bit_xor()?;
        while self.check(&TokenKind::Pipe) {
            self.advance();
            let right = self.parse_bit_xor()?;
            left = Self::binary(BinaryOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_bit_xor(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_bit_and()?;
        while self.check(&TokenKind::Caret) {
            self.advance();
            let right = self.parse_bit_and()?;
            left = Self::binary(BinaryOp::BitXor, left, right);
        }
        Ok(left)
    }

    fn parse_bit_and(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_shift()?;
        while self.check(&TokenKind::Amp) {
            self.advance();
            let right = self.parse_shift()?;
            left = Self::binary(BinaryOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.match_shift_op() {
            self.advance();
            let right = self.parse_additive()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_multiplicative()?;
        while let Some(op) = self.match_additive_op() {
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_power()?;
        while let Some(op) = self.match_multiplicative_op() {
            self.advance();
            let right = self.parse_power()?;
            left = Self::binary(op, left, right);
        }
        Ok(left)
    }

    /// `**` associates to the left: `2**3**2` is `(2**3)**2`.
    fn parse_power(&mut self) -> Result<Expr, CompileError> {
        let mut left = self.parse_unary()?;
        while self.check(&TokenKind::StarStar) {
            self.advance();
            let right = self.parse_unary()?;
            left = Self::binary(BinaryOp::Pow, left, right);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, CompileError> {
        if self.check(&TokenKind::Plus) {
            self.advance();
            return ensure_sufficient_stack(|| self.parse_unary());
        }
        if let Some(op) = self.match_unary_op() {
            let start = self.advance().span.start;
            let operand = ensure_sufficient_stack(|| self.parse_unary())?;
            let span = Span::new(start, operand.span.end);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Expr, CompileError> {
        let token = self.current().clone();
        match token.kind {
            TokenKind::Int(n) => {
                self.advance();
                Ok(Expr::new(ExprKind::Int(n), token.span))
            }
            TokenKind::Float(f) => {
                self.advance();
                Ok(Expr::new(ExprKind::Float(f), token.span))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::new(ExprKind::Str(s), token.span))
            }
            TokenKind::Ident => {
                self.advance();
                let name = self.source[token.span.range()].to_string();
                if self.check(&TokenKind::LParen) {
                    self.parse_call(name, token.span)
                } else {
                    Ok(Expr::new(ExprKind::Name(name), token.span))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_or()?;
                let close = self.expect(&TokenKind::RParen, "')'")?;
                Ok(Expr::new(inner.kind, Span::new(token.span.start, close.span.end)))
            }
            _ => Err(self.error_here(format!(
                "expected expression, found {}",
                token.kind.describe()
            ))),
        }
    }

    fn parse_call(&mut self, name: String, name_span: Span) -> Result<Expr, CompileError> {
        self.advance(); // (
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_or()?);
                if self.check(&TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                break;
            }
        }
        let close = self.expect(&TokenKind::RParen, "',' or ')'")?;
        Ok(Expr::new(
            ExprKind::Call {
                name,
                name_span,
                args,
            },
            Span::new(name_span.start, close.span.end),
        ))
    }
}

#[cfg(test)]
mod tests;
