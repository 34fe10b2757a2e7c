//! Predictive recursive-descent parser.
//!
//! One token of lookahead, no backtracking. Declarations are turned into
//! symbol-table objects as they are recognised; every payload (constant value,
//! type) is fully built before its object is created and declared. The first
//! error ends the parse.

mod stmt;

use miette::Error;

use crate::{
    constant::ConstantValue,
    error::{ErrorKind, SemanticError, UnexpectedToken},
    lex::{Lexer, Token, TokenKind},
    symtab::{ObjectId, ObjectKind, PassingMode, SymbolError, SymbolTable},
    types::Type,
};

pub struct Parser<'de> {
    lexer: Lexer<'de>,
    look_ahead: Token<'de>,
    symtab: SymbolTable,
}

impl<'de> Parser<'de> {
    pub fn new(filename: Option<&'de str>, whole: &'de str) -> Result<Self, Error> {
        let mut lexer = Lexer::new(filename, whole);
        let look_ahead = lexer.next_token()?;
        Ok(Parser {
            lexer,
            look_ahead,
            symtab: SymbolTable::new(),
        })
    }

    /// Parse a whole program. The symbol table is handed back on success and
    /// cleaned here on failure.
    pub fn parse(mut self) -> Result<SymbolTable, Error> {
        match self.parse_program() {
            Ok(()) => Ok(self.symtab),
            Err(e) => {
                self.symtab.clean();
                Err(e)
            }
        }
    }

    fn scan(&mut self) -> Result<Token<'de>, Error> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.look_ahead, next))
    }

    fn eat(&mut self, expected: TokenKind) -> Result<Token<'de>, Error> {
        if self.look_ahead.kind == expected {
            self.scan()
        } else {
            Err(UnexpectedToken::new(expected, &self.look_ahead, self.lexer.named_source()).into())
        }
    }

    fn error_at(&self, kind: ErrorKind, token: &Token<'_>) -> Error {
        SemanticError::at(kind, token, self.lexer.named_source()).into()
    }

    fn error(&self, kind: ErrorKind) -> Error {
        self.error_at(kind, &self.look_ahead)
    }

    fn symbol_error(&self, error: SymbolError, token: &Token<'_>) -> Error {
        let kind = match error {
            SymbolError::Duplicate { .. } => ErrorKind::DuplicateIdentifier,
            SymbolError::ParameterOutsideRoutine { .. } => ErrorKind::InvalidParameter,
            SymbolError::NotNested { .. } | SymbolError::NoOpenScope => ErrorKind::InvalidScope,
        };
        self.error_at(kind, token)
    }

    fn declare(&mut self, id: ObjectId, name: &Token<'_>) -> Result<(), Error> {
        self.symtab
            .declare(id)
            .map_err(|e| self.symbol_error(e, name))
    }

    fn enter_block(&mut self, id: ObjectId, at: &Token<'_>) -> Result<(), Error> {
        let Some(scope) = self.symtab.object(id).scope() else {
            return Err(self.error_at(ErrorKind::InvalidScope, at));
        };
        self.symtab
            .enter_block(scope)
            .map_err(|e| self.symbol_error(e, at))
    }

    fn exit_block(&mut self) -> Result<(), Error> {
        self.symtab
            .exit_block()
            .map_err(|e| self.symbol_error(e, &self.look_ahead))
    }

    pub fn parse_program(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::Program)?;
        let name = self.eat(TokenKind::Ident)?;
        let program = self.symtab.create_program(name.literal);
        self.enter_block(program, &name)?;

        self.eat(TokenKind::Semicolon)?;
        self.parse_block()?;
        self.eat(TokenKind::Period)?;

        self.exit_block()
    }

    fn parse_block(&mut self) -> Result<(), Error> {
        if self.look_ahead.kind == TokenKind::Const {
            self.eat(TokenKind::Const)?;
            loop {
                self.parse_const_decl()?;
                if self.look_ahead.kind != TokenKind::Ident {
                    break;
                }
            }
        }

        if self.look_ahead.kind == TokenKind::Type {
            self.eat(TokenKind::Type)?;
            loop {
                self.parse_type_decl()?;
                if self.look_ahead.kind != TokenKind::Ident {
                    break;
                }
            }
        }

        if self.look_ahead.kind == TokenKind::Var {
            self.eat(TokenKind::Var)?;
            loop {
                self.parse_var_decl()?;
                if self.look_ahead.kind != TokenKind::Ident {
                    break;
                }
            }
        }

        self.parse_sub_decls()?;

        self.eat(TokenKind::Begin)?;
        self.parse_statements()?;
        self.eat(TokenKind::End)?;
        Ok(())
    }

    fn parse_const_decl(&mut self) -> Result<(), Error> {
        let name = self.eat(TokenKind::Ident)?;
        self.eat(TokenKind::Eq)?;
        let value = self.parse_constant()?;

        let constant = self.symtab.create_constant(name.literal, value);
        self.declare(constant, &name)?;

        self.eat(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_type_decl(&mut self) -> Result<(), Error> {
        let name = self.eat(TokenKind::Ident)?;
        self.eat(TokenKind::Eq)?;
        let actual = self.parse_type()?;

        let alias = self.symtab.create_type_alias(name.literal, actual);
        self.declare(alias, &name)?;

        self.eat(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_var_decl(&mut self) -> Result<(), Error> {
        let name = self.eat(TokenKind::Ident)?;
        self.eat(TokenKind::Colon)?;
        let ty = self.parse_type()?;

        let variable = self.symtab.create_variable(name.literal, ty);
        self.declare(variable, &name)?;

        self.eat(TokenKind::Semicolon)?;
        Ok(())
    }

    fn parse_sub_decls(&mut self) -> Result<(), Error> {
        loop {
            match self.look_ahead.kind {
                TokenKind::Function => self.parse_func_decl()?,
                TokenKind::Procedure => self.parse_proc_decl()?,
                _ => return Ok(()),
            }
        }
    }

    /// The function is declared in the enclosing scope before its own scope
    /// is entered, so the body can refer to it.
    fn parse_func_decl(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::Function)?;
        let name = self.eat(TokenKind::Ident)?;

        let function = self.symtab.create_function(name.literal);
        self.declare(function, &name)?;
        self.enter_block(function, &name)?;

        self.parse_params()?;
        self.eat(TokenKind::Colon)?;
        let return_type = self.parse_basic_type()?;
        self.symtab.set_return_type(function, return_type);

        self.eat(TokenKind::Semicolon)?;
        self.parse_block()?;
        self.eat(TokenKind::Semicolon)?;

        self.exit_block()
    }

    fn parse_proc_decl(&mut self) -> Result<(), Error> {
        self.eat(TokenKind::Procedure)?;
        let name = self.eat(TokenKind::Ident)?;

        let procedure = self.symtab.create_procedure(name.literal);
        self.declare(procedure, &name)?;
        self.enter_block(procedure, &name)?;

        self.parse_params()?;

        self.eat(TokenKind::Semicolon)?;
        self.parse_block()?;
        self.eat(TokenKind::Semicolon)?;

        self.exit_block()
    }

    fn parse_params(&mut self) -> Result<(), Error> {
        if self.look_ahead.kind == TokenKind::LParen {
            self.eat(TokenKind::LParen)?;
            self.parse_param()?;
            while self.look_ahead.kind == TokenKind::Semicolon {
                self.eat(TokenKind::Semicolon)?;
                self.parse_param()?;
            }
            self.eat(TokenKind::RParen)?;
        }
        Ok(())
    }

    fn parse_param(&mut self) -> Result<(), Error> {
        let mode = match self.look_ahead.kind {
            TokenKind::Ident => PassingMode::ByValue,
            TokenKind::Var => {
                self.eat(TokenKind::Var)?;
                PassingMode::ByReference
            }
            _ => return Err(self.error(ErrorKind::InvalidParameter)),
        };
        let name = self.eat(TokenKind::Ident)?;
        self.eat(TokenKind::Colon)?;
        let ty = self.parse_basic_type()?;

        let owner = self
            .symtab
            .current_scope()
            .and_then(|scope| self.symtab.scope(scope).owner)
            .ok_or_else(|| self.error_at(ErrorKind::InvalidParameter, &name))?;
        let param = self.symtab.create_parameter(name.literal, mode, ty, owner);
        self.declare(param, &name)
    }

    /// `Constant ::= '+' Constant2 | '-' Constant2 | CharLiteral | Constant2`
    pub fn parse_constant(&mut self) -> Result<ConstantValue, Error> {
        match self.look_ahead.kind {
            TokenKind::Plus => {
                self.eat(TokenKind::Plus)?;
                self.parse_constant2()
            }
            TokenKind::Minus => {
                let minus = self.eat(TokenKind::Minus)?;
                let value = self.parse_constant2()?;
                value
                    .negate()
                    .ok_or_else(|| self.error_at(ErrorKind::InvalidConstant, &minus))
            }
            TokenKind::CharConst(c) => {
                self.scan()?;
                Ok(ConstantValue::char(c))
            }
            _ => self.parse_constant2(),
        }
    }

    /// `Constant2 ::= IntegerLiteral | ConstantIdentifier`
    fn parse_constant2(&mut self) -> Result<ConstantValue, Error> {
        match self.look_ahead.kind {
            TokenKind::Number(n) => {
                self.scan()?;
                Ok(ConstantValue::int(n))
            }
            TokenKind::Ident => {
                let name = self.scan()?;
                let constant = self.symtab.lookup(name.literal).map(|id| &self.symtab.object(id).kind);
                match constant {
                    Some(ObjectKind::Constant { value }) => Ok(value.duplicate()),
                    _ => Err(self.error_at(ErrorKind::UndeclaredConstant, &name)),
                }
            }
            _ => Err(self.error(ErrorKind::InvalidConstant)),
        }
    }

    pub fn parse_type(&mut self) -> Result<Type, Error> {
        match self.look_ahead.kind {
            TokenKind::Integer => {
                self.scan()?;
                Ok(Type::int())
            }
            TokenKind::Char => {
                self.scan()?;
                Ok(Type::char())
            }
            TokenKind::Array => {
                self.eat(TokenKind::Array)?;
                self.eat(TokenKind::LSel)?;
                let TokenKind::Number(size) = self.look_ahead.kind else {
                    return Err(self.error(ErrorKind::InvalidType));
                };
                self.scan()?;
                self.eat(TokenKind::RSel)?;
                self.eat(TokenKind::Of)?;
                let element = self.parse_type()?;
                Ok(Type::array(size, element))
            }
            TokenKind::Ident => {
                let name = self.scan()?;
                let alias = self.symtab.lookup(name.literal).map(|id| &self.symtab.object(id).kind);
                match alias {
                    Some(ObjectKind::TypeAlias { actual }) => Ok(actual.duplicate()),
                    _ => Err(self.error_at(ErrorKind::UndeclaredType, &name)),
                }
            }
            _ => Err(self.error(ErrorKind::InvalidType)),
        }
    }

    pub fn parse_basic_type(&mut self) -> Result<Type, Error> {
        match self.look_ahead.kind {
            TokenKind::Integer => {
                self.scan()?;
                Ok(self.symtab.int_type().duplicate())
            }
            TokenKind::Char => {
                self.scan()?;
                Ok(self.symtab.char_type().duplicate())
            }
            _ => Err(self.error(ErrorKind::InvalidBasicType)),
        }
    }
}
