use std::fmt::Display;

use miette::{Error, NamedSource, SourceSpan};

use crate::error::{ErrorKind, Position, SemanticError};

pub const MAX_IDENT_LEN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'de> {
    pub kind: TokenKind,
    pub literal: &'de str,
    pub offset: usize,
    pub position: Position,
}

impl Token<'_> {
    pub fn span(&self) -> SourceSpan {
        SourceSpan::from((self.offset, self.literal.len()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Eof,
    Ident,
    Number(i32),
    CharConst(char),

    Program,
    Const,
    Type,
    Var,
    Integer,
    Char,
    Array,
    Of,
    Function,
    Procedure,
    Begin,
    End,
    Call,
    If,
    Then,
    Else,
    While,
    Do,
    For,
    To,

    Semicolon,
    Colon,
    Period,
    Comma,
    Assign,
    Eq,
    Neq,
    Lt,
    Le,
    Gt,
    Ge,
    Plus,
    Minus,
    Times,
    Slash,
    LParen,
    RParen,
    LSel,
    RSel,
}

impl TokenKind {
    fn keyword(word: &str) -> Option<TokenKind> {
        Some(match word.to_ascii_uppercase().as_str() {
            "PROGRAM" => TokenKind::Program,
            "CONST" => TokenKind::Const,
            "TYPE" => TokenKind::Type,
            "VAR" => TokenKind::Var,
            "INTEGER" => TokenKind::Integer,
            "CHAR" => TokenKind::Char,
            "ARRAY" => TokenKind::Array,
            "OF" => TokenKind::Of,
            "FUNCTION" => TokenKind::Function,
            "PROCEDURE" => TokenKind::Procedure,
            "BEGIN" => TokenKind::Begin,
            "END" => TokenKind::End,
            "CALL" => TokenKind::Call,
            "IF" => TokenKind::If,
            "THEN" => TokenKind::Then,
            "ELSE" => TokenKind::Else,
            "WHILE" => TokenKind::While,
            "DO" => TokenKind::Do,
            "FOR" => TokenKind::For,
            "TO" => TokenKind::To,
            _ => return None,
        })
    }

    /// Name used by `tokenize` output.
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Eof => "TK_EOF",
            TokenKind::Ident => "TK_IDENT",
            TokenKind::Number(_) => "TK_NUMBER",
            TokenKind::CharConst(_) => "TK_CHAR",
            TokenKind::Program => "KW_PROGRAM",
            TokenKind::Const => "KW_CONST",
            TokenKind::Type => "KW_TYPE",
            TokenKind::Var => "KW_VAR",
            TokenKind::Integer => "KW_INTEGER",
            TokenKind::Char => "KW_CHAR",
            TokenKind::Array => "KW_ARRAY",
            TokenKind::Of => "KW_OF",
            TokenKind::Function => "KW_FUNCTION",
            TokenKind::Procedure => "KW_PROCEDURE",
            TokenKind::Begin => "KW_BEGIN",
            TokenKind::End => "KW_END",
            TokenKind::Call => "KW_CALL",
            TokenKind::If => "KW_IF",
            TokenKind::Then => "KW_THEN",
            TokenKind::Else => "KW_ELSE",
            TokenKind::While => "KW_WHILE",
            TokenKind::Do => "KW_DO",
            TokenKind::For => "KW_FOR",
            TokenKind::To => "KW_TO",
            TokenKind::Semicolon => "SB_SEMICOLON",
            TokenKind::Colon => "SB_COLON",
            TokenKind::Period => "SB_PERIOD",
            TokenKind::Comma => "SB_COMMA",
            TokenKind::Assign => "SB_ASSIGN",
            TokenKind::Eq => "SB_EQ",
            TokenKind::Neq => "SB_NEQ",
            TokenKind::Lt => "SB_LT",
            TokenKind::Le => "SB_LE",
            TokenKind::Gt => "SB_GT",
            TokenKind::Ge => "SB_GE",
            TokenKind::Plus => "SB_PLUS",
            TokenKind::Minus => "SB_MINUS",
            TokenKind::Times => "SB_TIMES",
            TokenKind::Slash => "SB_SLASH",
            TokenKind::LParen => "SB_LPAR",
            TokenKind::RParen => "SB_RPAR",
            TokenKind::LSel => "SB_LSEL",
            TokenKind::RSel => "SB_RSEL",
        }
    }
}

// Human-readable form, used in diagnostics.
impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Eof => write!(f, "end of file"),
            TokenKind::Ident => write!(f, "an identifier"),
            TokenKind::Number(_) => write!(f, "a number"),
            TokenKind::CharConst(_) => write!(f, "a constant char"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Period => write!(f, "'.'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Assign => write!(f, "':='"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::Neq => write!(f, "'!='"),
            TokenKind::Lt => write!(f, "'<'"),
            TokenKind::Le => write!(f, "'<='"),
            TokenKind::Gt => write!(f, "'>'"),
            TokenKind::Ge => write!(f, "'>='"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Times => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LSel => write!(f, "'(.'"),
            TokenKind::RSel => write!(f, "'.)'"),
            keyword => write!(f, "keyword {}", &keyword.name()[3..]),
        }
    }
}

impl Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.kind.name();
        match self.kind {
            TokenKind::Ident => write!(f, "{}:{name}({})", self.position, self.literal),
            TokenKind::Number(n) => write!(f, "{}:{name}({n})", self.position),
            TokenKind::CharConst(c) => write!(f, "{}:{name}('{c}')", self.position),
            _ => write!(f, "{}:{name}", self.position),
        }
    }
}

pub struct Lexer<'de> {
    filename: Option<&'de str>,
    whole: &'de str,
    rest: &'de str,
    pub byte: usize,
    line: usize,
    line_start: usize,
}

impl<'de> Lexer<'de> {
    pub fn new(filename: Option<&'de str>, input: &'de str) -> Self {
        Lexer {
            filename,
            whole: input,
            rest: input,
            byte: 0,
            line: 1,
            line_start: 0,
        }
    }

    pub fn named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.filename.unwrap_or("<input>"), self.whole.to_string())
    }

    fn position_of(&self, offset: usize) -> Position {
        let column = self.whole[self.line_start..offset].chars().count() + 1;
        Position::new(self.line, column)
    }

    fn bump(&mut self, n: usize) {
        self.rest = &self.rest[n..];
        self.byte += n;
    }

    fn bump_counting_lines(&mut self, n: usize) {
        for (i, c) in self.rest[..n].char_indices() {
            if c == '\n' {
                self.line += 1;
                self.line_start = self.byte + i + 1;
            }
        }
        self.bump(n);
    }

    fn token(&self, kind: TokenKind, start: usize) -> Token<'de> {
        Token {
            kind,
            literal: &self.whole[start..self.byte],
            offset: start,
            position: self.position_of(start),
        }
    }

    fn error(&self, kind: ErrorKind, start: usize, len: usize) -> Error {
        SemanticError::new(kind, self.position_of(start), (start, len), self.named_source()).into()
    }

    /// Scan the next token. Once the input is exhausted every call yields `Eof`.
    pub fn next_token(&mut self) -> Result<Token<'de>, Error> {
        loop {
            let start = self.byte;
            let mut chars = self.rest.chars();
            let Some(c) = chars.next() else {
                return Ok(self.token(TokenKind::Eof, start));
            };
            let cur = self.rest;
            self.rest = chars.as_str();
            self.byte += c.len_utf8();

            enum Start {
                Ident,
                Number,
                CharConst,
                LParen,
                Period,
                IfEqualElse(TokenKind, TokenKind),
                Bang,
            }

            let started = match c {
                '+' => return Ok(self.token(TokenKind::Plus, start)),
                '-' => return Ok(self.token(TokenKind::Minus, start)),
                '*' => return Ok(self.token(TokenKind::Times, start)),
                '/' => return Ok(self.token(TokenKind::Slash, start)),
                '=' => return Ok(self.token(TokenKind::Eq, start)),
                ',' => return Ok(self.token(TokenKind::Comma, start)),
                ';' => return Ok(self.token(TokenKind::Semicolon, start)),
                ')' => return Ok(self.token(TokenKind::RParen, start)),
                '[' => return Ok(self.token(TokenKind::LSel, start)),
                ']' => return Ok(self.token(TokenKind::RSel, start)),
                '(' => Start::LParen,
                '.' => Start::Period,
                ':' => Start::IfEqualElse(TokenKind::Assign, TokenKind::Colon),
                '<' => Start::IfEqualElse(TokenKind::Le, TokenKind::Lt),
                '>' => Start::IfEqualElse(TokenKind::Ge, TokenKind::Gt),
                '!' => Start::Bang,
                '\'' => Start::CharConst,
                'a'..='z' | 'A'..='Z' => Start::Ident,
                '0'..='9' => Start::Number,
                '\n' => {
                    self.line += 1;
                    self.line_start = self.byte;
                    continue;
                }
                ' ' | '\r' | '\t' => continue,
                c => return Err(self.error(ErrorKind::InvalidSymbol, start, c.len_utf8())),
            };

            match started {
                Start::LParen => {
                    if self.rest.starts_with('*') {
                        self.bump(1);
                        match self.rest.find("*)") {
                            Some(end) => {
                                self.bump_counting_lines(end + 2);
                                continue;
                            }
                            None => return Err(self.error(ErrorKind::EndOfComment, start, 2)),
                        }
                    } else if self.rest.starts_with('.') {
                        self.bump(1);
                        return Ok(self.token(TokenKind::LSel, start));
                    } else {
                        return Ok(self.token(TokenKind::LParen, start));
                    }
                }
                Start::Period => {
                    if self.rest.starts_with(')') {
                        self.bump(1);
                        return Ok(self.token(TokenKind::RSel, start));
                    } else {
                        return Ok(self.token(TokenKind::Period, start));
                    }
                }
                Start::IfEqualElse(yes, no) => {
                    if self.rest.starts_with('=') {
                        self.bump(1);
                        return Ok(self.token(yes, start));
                    } else {
                        return Ok(self.token(no, start));
                    }
                }
                Start::Bang => {
                    if self.rest.starts_with('=') {
                        self.bump(1);
                        return Ok(self.token(TokenKind::Neq, start));
                    } else {
                        return Err(self.error(ErrorKind::InvalidSymbol, start, 1));
                    }
                }
                Start::CharConst => {
                    let mut inner = self.rest.chars();
                    match (inner.next(), inner.next()) {
                        (Some(ch), Some('\'')) if ch != '\n' => {
                            self.bump(ch.len_utf8() + 1);
                            return Ok(self.token(TokenKind::CharConst(ch), start));
                        }
                        _ => return Err(self.error(ErrorKind::InvalidCharConstant, start, 1)),
                    }
                }
                Start::Ident => {
                    let first_non_ident = cur
                        .find(|c: char| !c.is_ascii_alphanumeric())
                        .unwrap_or(cur.len());
                    let literal = &cur[..first_non_ident];
                    self.bump(literal.len() - c.len_utf8());

                    if let Some(kind) = TokenKind::keyword(literal) {
                        return Ok(self.token(kind, start));
                    }
                    if literal.len() > MAX_IDENT_LEN {
                        return Err(self.error(ErrorKind::IdentTooLong, start, literal.len()));
                    }
                    return Ok(self.token(TokenKind::Ident, start));
                }
                Start::Number => {
                    let first_non_digit = cur
                        .find(|c: char| !c.is_ascii_digit())
                        .unwrap_or(cur.len());
                    let literal = &cur[..first_non_digit];
                    self.bump(literal.len() - c.len_utf8());

                    return match literal.parse() {
                        Ok(n) => Ok(self.token(TokenKind::Number(n), start)),
                        Err(_) => Err(self.error(ErrorKind::NumberTooLong, start, literal.len())),
                    };
                }
            }
        }
    }
}

impl<'de> Iterator for Lexer<'de> {
    type Item = Result<Token<'de>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(Token {
                kind: TokenKind::Eof,
                ..
            }) => None,
            other => Some(other),
        }
    }
}
