//! Statements, conditions and expressions. Apart from resolving the target of
//! a `call`, these productions only check syntax.

use miette::Error;

use super::Parser;
use crate::{error::ErrorKind, lex::TokenKind, symtab::ObjectKind};

/// Tokens that may follow an expression, term or argument list.
fn ends_expression(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::To
            | TokenKind::Do
            | TokenKind::RParen
            | TokenKind::Comma
            | TokenKind::Eq
            | TokenKind::Neq
            | TokenKind::Le
            | TokenKind::Lt
            | TokenKind::Ge
            | TokenKind::Gt
            | TokenKind::RSel
            | TokenKind::Semicolon
            | TokenKind::End
            | TokenKind::Else
            | TokenKind::Then
    )
}

impl<'de> Parser<'de> {
    pub(super) fn parse_statements(&mut self) -> Result<(), Error> {
        self.parse_statement()?;
        while self.look_ahead.kind == TokenKind::Semicolon {
            self.eat(TokenKind::Semicolon)?;
            self.parse_statement()?;
        }
        Ok(())
    }

    fn parse_statement(&mut self) -> Result<(), Error> {
        match self.look_ahead.kind {
            TokenKind::Ident => self.parse_assign_st(),
            TokenKind::Call => self.parse_call_st(),
            TokenKind::Begin => self.parse_group_st(),
            TokenKind::If => self.parse_if_st(),
            TokenKind::While => self.parse_while_st(),
            TokenKind::For => self.parse_for_st(),
            // empty statement
            TokenKind::Semicolon | TokenKind::End | TokenKind::Else => Ok(()),
            _ => Err(self.error(ErrorKind::InvalidStatement)),
        }
    }

    fn parse_assign_st(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::Ident)?;
        self.parse_indexes()?;
        self.eat(TokenKind::Assign)?;
        self.parse_expression()
    }

    fn parse_call_st(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::Call)?;
        let name = self.eat(TokenKind::Ident)?;
        let callee = self.symtab.lookup(name.literal).map(|id| &self.symtab.object(id).kind);
        if !matches!(callee, Some(ObjectKind::Procedure { .. })) {
            return Err(self.error_at(ErrorKind::UndeclaredProcedure, &name));
        }
        self.parse_arguments()
    }

    fn parse_group_st(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::Begin)?;
        self.parse_statements()?;
        self.eat(TokenKind::End)?;
        Ok(())
    }

    fn parse_if_st(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::If)?;
        self.parse_condition()?;
        self.eat(TokenKind::Then)?;
        self.parse_statement()?;
        if self.look_ahead.kind == TokenKind::Else {
            self.eat(TokenKind::Else)?;
            self.parse_statement()?;
        }
        Ok(())
    }

    fn parse_while_st(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::While)?;
        self.parse_condition()?;
        self.eat(TokenKind::Do)?;
        self.parse_statement()
    }

    fn parse_for_st(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::For)?;
        self.eat(TokenKind::Ident)?;
        self.eat(TokenKind::Assign)?;
        self.parse_expression()?;
        self.eat(TokenKind::To)?;
        self.parse_expression()?;
        self.eat(TokenKind::Do)?;
        self.parse_statement()
    }

    fn parse_arguments(&mut self) -> Result<(), Error> {
        match self.look_ahead.kind {
            TokenKind::LParen => {
                self.eat(TokenKind::LParen)?;
                self.parse_expression()?;
                while self.look_ahead.kind == TokenKind::Comma {
                    self.eat(TokenKind::Comma)?;
                    self.parse_expression()?;
                }
                self.eat(TokenKind::RParen)?;
                Ok(())
            }
            TokenKind::Times | TokenKind::Slash | TokenKind::Plus | TokenKind::Minus => Ok(()),
            kind if ends_expression(kind) => Ok(()),
            _ => Err(self.error(ErrorKind::InvalidArguments)),
        }
    }

    fn parse_condition(&mut self) -> Result<(), Error> {
        self.parse_expression()?;
        match self.look_ahead.kind {
            TokenKind::Eq
            | TokenKind::Neq
            | TokenKind::Le
            | TokenKind::Lt
            | TokenKind::Ge
            | TokenKind::Gt => {
                self.scan()?;
            }
            _ => return Err(self.error(ErrorKind::InvalidComparator)),
        }
        self.parse_expression()
    }

    fn parse_expression(&mut self) -> Result<(), Error> {
        if matches!(self.look_ahead.kind, TokenKind::Plus | TokenKind::Minus) {
            self.scan()?;
        }
        self.parse_term()?;
        self.parse_expression3()
    }

    fn parse_expression3(&mut self) -> Result<(), Error> {
        loop {
            match self.look_ahead.kind {
                TokenKind::Plus | TokenKind::Minus => {
                    self.scan()?;
                    self.parse_term()?;
                }
                kind if ends_expression(kind) => return Ok(()),
                _ => return Err(self.error(ErrorKind::InvalidExpression)),
            }
        }
    }

    fn parse_term(&mut self) -> Result<(), Error> {
        self.parse_factor()?;
        loop {
            match self.look_ahead.kind {
                TokenKind::Times | TokenKind::Slash => {
                    self.scan()?;
                    self.parse_factor()?;
                }
                TokenKind::Plus | TokenKind::Minus => return Ok(()),
                kind if ends_expression(kind) => return Ok(()),
                _ => return Err(self.error(ErrorKind::InvalidTerm)),
            }
        }
    }

    fn parse_factor(&mut self) -> Result<(), Error> {
        match self.look_ahead.kind {
            TokenKind::Number(_) | TokenKind::CharConst(_) => {
                self.scan()?;
                Ok(())
            }
            TokenKind::Ident => {
                self.eat(TokenKind::Ident)?;
                match self.look_ahead.kind {
                    TokenKind::LParen => self.parse_arguments(),
                    TokenKind::LSel => self.parse_indexes(),
                    _ => Ok(()),
                }
            }
            TokenKind::LParen => {
                self.eat(TokenKind::LParen)?;
                self.parse_expression()?;
                self.eat(TokenKind::RParen)?;
                Ok(())
            }
            _ => Err(self.error(ErrorKind::InvalidFactor)),
        }
    }

    fn parse_indexes(&mut self) -> Result<(), Error> {
        while self.look_ahead.kind == TokenKind::LSel {
            self.eat(TokenKind::LSel)?;
            self.parse_expression()?;
            self.eat(TokenKind::RSel)?;
        }
        Ok(())
    }
}
