use std::{fmt::Display, path::PathBuf};

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use crate::lex::{Token, TokenKind};

/// 1-based line and column of the first character of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Position { line, column }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.line, self.column)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("End of comment expected!")]
    EndOfComment,
    #[error("Identifier too long!")]
    IdentTooLong,
    #[error("Number too long!")]
    NumberTooLong,
    #[error("Invalid char constant!")]
    InvalidCharConstant,
    #[error("Invalid symbol!")]
    InvalidSymbol,
    #[error("Invalid constant!")]
    InvalidConstant,
    #[error("Invalid type!")]
    InvalidType,
    #[error("Invalid basic type!")]
    InvalidBasicType,
    #[error("Invalid parameter!")]
    InvalidParameter,
    #[error("Invalid statement!")]
    InvalidStatement,
    #[error("Invalid arguments!")]
    InvalidArguments,
    #[error("Invalid comparator!")]
    InvalidComparator,
    #[error("Invalid expression!")]
    InvalidExpression,
    #[error("Invalid term!")]
    InvalidTerm,
    #[error("Invalid factor!")]
    InvalidFactor,
    #[error("Undeclared constant!")]
    UndeclaredConstant,
    #[error("Undeclared type!")]
    UndeclaredType,
    #[error("Undeclared procedure!")]
    UndeclaredProcedure,
    #[error("Duplicate identifier!")]
    DuplicateIdentifier,
    #[error("Invalid scope nesting!")]
    InvalidScope,
}

/// A failure detected at a specific token, lexical or semantic.
#[derive(Error, Debug, Diagnostic)]
#[error("{position}: {kind}")]
pub struct SemanticError {
    pub kind: ErrorKind,
    pub position: Position,

    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    bad_bit: SourceSpan,
}

impl SemanticError {
    pub fn new(
        kind: ErrorKind,
        position: Position,
        bad_bit: impl Into<SourceSpan>,
        src: NamedSource<String>,
    ) -> Self {
        SemanticError {
            kind,
            position,
            src,
            bad_bit: bad_bit.into(),
        }
    }

    pub fn at(kind: ErrorKind, token: &Token<'_>, src: NamedSource<String>) -> Self {
        Self::new(kind, token.position, token.span(), src)
    }
}

/// The lookahead did not match the single token kind a production requires.
#[derive(Error, Debug, Diagnostic)]
#[error("{position}: Missing {expected}")]
#[diagnostic(help("expected `{expected}` but found `{found}`"))]
pub struct UnexpectedToken {
    pub expected: TokenKind,
    pub found: TokenKind,
    pub position: Position,

    #[source_code]
    src: NamedSource<String>,

    #[label("here")]
    bad_bit: SourceSpan,
}

impl UnexpectedToken {
    pub fn new(expected: TokenKind, token: &Token<'_>, src: NamedSource<String>) -> Self {
        UnexpectedToken {
            expected,
            found: token.kind,
            position: token.position,
            src,
            bad_bit: token.span(),
        }
    }
}

#[derive(Error, Debug, Diagnostic)]
#[error("reading `{}` failed", .path.display())]
#[diagnostic(code(kplc::io))]
pub struct SourceIoError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Pull the [`ErrorKind`] out of a compile error, if it carries one.
pub fn error_kind(error: &miette::Error) -> Option<ErrorKind> {
    error.downcast_ref::<SemanticError>().map(|e| e.kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_renders_line_dash_column() {
        assert_eq!(Position::new(3, 14).to_string(), "3-14");
    }

    #[test]
    fn semantic_error_message_carries_position_and_kind() {
        let err = SemanticError::new(
            ErrorKind::UndeclaredType,
            Position::new(2, 7),
            (10, 3),
            NamedSource::new("t.kpl", "x".repeat(20)),
        );
        assert_eq!(err.to_string(), "2-7: Undeclared type!");
    }
}
