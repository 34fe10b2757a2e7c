use std::{fs, path::Path};

use miette::{Error, NamedSource};
use tracing::info;

pub mod constant;
pub mod error;
pub mod lex;
pub mod parse;
pub mod print;
pub mod symtab;
pub mod types;

use error::Position;
pub use error::{ErrorKind, SemanticError, SourceIoError, UnexpectedToken};
pub use lex::Lexer;
pub use parse::Parser;
pub use print::DisplayObject;
pub use symtab::SymbolTable;

/// Parse `source` and return its fully resolved symbol table.
///
/// On failure the table is cleaned before the error is returned.
pub fn compile_source(filename: Option<&str>, source: &str) -> Result<SymbolTable, Error> {
    let symtab = Parser::new(filename, source)?.parse()?;
    info!(file = filename.unwrap_or("<input>"), "compiled");
    Ok(symtab)
}

/// Read the program text at `path`.
///
/// A file that cannot be read is a [`SourceIoError`]; one that is not valid
/// UTF-8 is an `InvalidSymbol` at the first byte that does not decode.
pub fn read_source(path: impl AsRef<Path>) -> Result<String, Error> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| SourceIoError {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|e| {
        let bad = e.utf8_error().valid_up_to();
        let bytes = e.into_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();

        let before = &text[..bad];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let position = Position::new(
            before.matches('\n').count() + 1,
            before[line_start..].chars().count() + 1,
        );
        let name = path.to_string_lossy().into_owned();
        SemanticError::new(
            ErrorKind::InvalidSymbol,
            position,
            (bad, char::REPLACEMENT_CHARACTER.len_utf8()),
            NamedSource::new(name, text),
        )
        .into()
    })
}

/// Read and compile the program at `path`.
pub fn compile(path: impl AsRef<Path>) -> Result<SymbolTable, Error> {
    let path = path.as_ref();
    let source = read_source(path)?;
    compile_source(path.to_str(), &source)
}
