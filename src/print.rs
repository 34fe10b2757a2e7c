use std::fmt::{self, Display};

use crate::symtab::{ObjectId, ObjectKind, PassingMode, SymbolTable};

const INDENT: usize = 4;

/// Renders an object and, for programs and routines, everything declared in
/// the scope it owns.
pub struct DisplayObject<'a>(pub &'a SymbolTable, pub ObjectId);

impl Display for DisplayObject<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_object(f, self.0, self.1, 0)
    }
}

fn write_object(
    f: &mut fmt::Formatter<'_>,
    symtab: &SymbolTable,
    id: ObjectId,
    indent: usize,
) -> fmt::Result {
    let object = symtab.object(id);
    write!(f, "{:indent$}", "")?;
    match &object.kind {
        ObjectKind::Program { .. } => write!(f, "Program {}", object.name)?,
        ObjectKind::Constant { value } => write!(f, "Const {} = {value}", object.name)?,
        ObjectKind::TypeAlias { actual } => write!(f, "Type {} = {actual}", object.name)?,
        ObjectKind::Variable { ty, .. } => write!(f, "Var {} : {ty}", object.name)?,
        ObjectKind::Function { return_type, .. } => {
            write!(f, "Function {}", object.name)?;
            if let Some(ty) = return_type {
                write!(f, " : {ty}")?;
            }
        }
        ObjectKind::Procedure { .. } => write!(f, "Procedure {}", object.name)?,
        ObjectKind::Parameter { mode, ty, .. } => match mode {
            PassingMode::ByValue => write!(f, "Param {} : {ty}", object.name)?,
            PassingMode::ByReference => write!(f, "Param VAR {} : {ty}", object.name)?,
        },
    }

    if let Some(scope) = object.scope() {
        for &child in symtab.scope(scope).objects() {
            writeln!(f)?;
            write_object(f, symtab, child, indent + INDENT)?;
        }
    }
    Ok(())
}
