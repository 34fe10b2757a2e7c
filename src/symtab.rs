//! Scope-structured symbol table.
//!
//! Objects and scopes live in two arenas owned by [`SymbolTable`] and are
//! addressed by typed ids. Ownership follows the declaration tree: a scope
//! owns the objects listed in it, the program and every routine own the scope
//! they introduce. `outer`, `owner` and a routine's parameter list are plain
//! ids and are never walked when the table is released.

use std::fmt;

use thiserror::Error;
use tracing::{debug, trace};

use crate::{constant::ConstantValue, types::Type};

macro_rules! define_id {
    ($name:ident) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
        pub struct $name(u32);

        impl $name {
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

define_id!(ObjectId);
define_id!(ScopeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassingMode {
    ByValue,
    ByReference,
}

#[derive(Debug)]
pub enum ObjectKind {
    Program {
        scope: ScopeId,
    },
    Constant {
        value: ConstantValue,
    },
    TypeAlias {
        actual: Type,
    },
    Variable {
        ty: Type,
    },
    Function {
        params: Vec<ObjectId>,
        /// Filled in once the header's return type has been parsed.
        return_type: Option<Type>,
        scope: ScopeId,
    },
    Procedure {
        params: Vec<ObjectId>,
        scope: ScopeId,
    },
    Parameter {
        mode: PassingMode,
        ty: Type,
        owner: ObjectId,
    },
}

#[derive(Debug)]
pub struct Object {
    pub name: String,
    pub kind: ObjectKind,
}

impl Object {
    /// The scope this object introduces, for programs and routines.
    pub fn scope(&self) -> Option<ScopeId> {
        match &self.kind {
            ObjectKind::Program { scope }
            | ObjectKind::Function { scope, .. }
            | ObjectKind::Procedure { scope, .. } => Some(*scope),
            _ => None,
        }
    }

    /// Parameters of a function or procedure in declaration order.
    pub fn params(&self) -> &[ObjectId] {
        match &self.kind {
            ObjectKind::Function { params, .. } | ObjectKind::Procedure { params, .. } => params,
            _ => &[],
        }
    }

    pub fn is_routine(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Function { .. } | ObjectKind::Procedure { .. }
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ObjectKind::Program { .. } => "Program",
            ObjectKind::Constant { .. } => "Const",
            ObjectKind::TypeAlias { .. } => "Type",
            ObjectKind::Variable { .. } => "Var",
            ObjectKind::Function { .. } => "Function",
            ObjectKind::Procedure { .. } => "Procedure",
            ObjectKind::Parameter { .. } => "Param",
        }
    }
}

#[derive(Debug)]
pub struct Scope {
    pub owner: Option<ObjectId>,
    pub outer: Option<ScopeId>,
    objects: Vec<ObjectId>,
}

impl Scope {
    /// Declared objects, in declaration order.
    pub fn objects(&self) -> &[ObjectId] {
        &self.objects
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    #[error("`{name}` is already declared in this scope")]
    Duplicate { name: String },
    #[error("{scope:?} is not nested in the current scope")]
    NotNested { scope: ScopeId },
    #[error("no scope is open")]
    NoOpenScope,
    #[error("parameter `{name}` is not declared inside a function or procedure")]
    ParameterOutsideRoutine { name: String },
}

/// Compile state for one run: the object/scope arenas, the predeclared
/// routines, the program root and the scope currently open.
#[derive(Debug)]
pub struct SymbolTable {
    objects: Vec<Object>,
    scopes: Vec<Scope>,
    globals: Vec<ObjectId>,
    program: Option<ObjectId>,
    current: Option<ScopeId>,
    int_type: Type,
    char_type: Type,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A fresh table with the predeclared routines in place and no scope open.
    pub fn new() -> Self {
        let mut symtab = SymbolTable {
            objects: Vec::new(),
            scopes: Vec::new(),
            globals: Vec::new(),
            program: None,
            current: None,
            int_type: Type::int(),
            char_type: Type::char(),
        };

        let char_type = symtab.char_type.duplicate();
        let int_type = symtab.int_type.duplicate();
        symtab.predeclare("READC", Some(char_type), None);
        symtab.predeclare("READI", Some(int_type), None);
        let int_type = symtab.int_type.duplicate();
        symtab.predeclare("WRITEI", None, Some(("i", int_type)));
        let char_type = symtab.char_type.duplicate();
        symtab.predeclare("WRITEC", None, Some(("ch", char_type)));
        symtab.predeclare("WRITELN", None, None);

        symtab
    }

    fn predeclare(&mut self, name: &str, return_type: Option<Type>, param: Option<(&str, Type)>) {
        let routine = match return_type {
            Some(ty) => {
                let function = self.create_function(name);
                self.set_return_type(function, ty);
                function
            }
            None => self.create_procedure(name),
        };
        if let (Some((param_name, ty)), Some(scope)) = (param, self.objects[routine.index()].scope())
        {
            let param = self.create_parameter(param_name, PassingMode::ByValue, ty, routine);
            self.scopes[scope.index()].objects.push(param);
            self.params_mut(routine).push(param);
        }
        self.globals.push(routine);
    }

    fn next_object_id(&self) -> ObjectId {
        ObjectId::from_raw(self.objects.len() as u32)
    }

    fn push_object(&mut self, name: &str, kind: ObjectKind) -> ObjectId {
        let id = self.next_object_id();
        self.objects.push(Object {
            name: name.to_string(),
            kind,
        });
        id
    }

    fn params_mut(&mut self, routine: ObjectId) -> &mut Vec<ObjectId> {
        match &mut self.objects[routine.index()].kind {
            ObjectKind::Function { params, .. } | ObjectKind::Procedure { params, .. } => params,
            _ => unreachable!("parameters are only attached to routines"),
        }
    }

    pub fn create_scope(&mut self, owner: Option<ObjectId>, outer: Option<ScopeId>) -> ScopeId {
        let id = ScopeId::from_raw(self.scopes.len() as u32);
        self.scopes.push(Scope {
            owner,
            outer,
            objects: Vec::new(),
        });
        id
    }

    /// Creates the program root together with its outermost scope.
    pub fn create_program(&mut self, name: &str) -> ObjectId {
        let id = self.next_object_id();
        let scope = self.create_scope(Some(id), None);
        self.push_object(name, ObjectKind::Program { scope });
        self.program = Some(id);
        id
    }

    pub fn create_constant(&mut self, name: &str, value: ConstantValue) -> ObjectId {
        self.push_object(name, ObjectKind::Constant { value })
    }

    pub fn create_type_alias(&mut self, name: &str, actual: Type) -> ObjectId {
        self.push_object(name, ObjectKind::TypeAlias { actual })
    }

    pub fn create_variable(&mut self, name: &str, ty: Type) -> ObjectId {
        self.push_object(name, ObjectKind::Variable { ty })
    }

    /// Creates a function whose scope is chained to the scope open right now.
    pub fn create_function(&mut self, name: &str) -> ObjectId {
        let id = self.next_object_id();
        let scope = self.create_scope(Some(id), self.current);
        self.push_object(
            name,
            ObjectKind::Function {
                params: Vec::new(),
                return_type: None,
                scope,
            },
        )
    }

    /// Creates a procedure whose scope is chained to the scope open right now.
    pub fn create_procedure(&mut self, name: &str) -> ObjectId {
        let id = self.next_object_id();
        let scope = self.create_scope(Some(id), self.current);
        self.push_object(
            name,
            ObjectKind::Procedure {
                params: Vec::new(),
                scope,
            },
        )
    }

    pub fn create_parameter(
        &mut self,
        name: &str,
        mode: PassingMode,
        ty: Type,
        owner: ObjectId,
    ) -> ObjectId {
        self.push_object(name, ObjectKind::Parameter { mode, ty, owner })
    }

    pub fn set_return_type(&mut self, function: ObjectId, ty: Type) {
        if let ObjectKind::Function { return_type, .. } = &mut self.objects[function.index()].kind {
            *return_type = Some(ty);
        }
    }

    /// Makes `scope` current. It must be a direct child of the current scope.
    pub fn enter_block(&mut self, scope: ScopeId) -> Result<(), SymbolError> {
        if self.scopes[scope.index()].outer != self.current {
            return Err(SymbolError::NotNested { scope });
        }
        debug!(?scope, "enter block");
        self.current = Some(scope);
        Ok(())
    }

    /// Closes the current scope, making its outer scope current.
    pub fn exit_block(&mut self) -> Result<(), SymbolError> {
        let scope = self.current.ok_or(SymbolError::NoOpenScope)?;
        debug!(?scope, "exit block");
        self.current = self.scopes[scope.index()].outer;
        Ok(())
    }

    /// Registers `id` in the current scope. A parameter is also appended to
    /// the parameter list of the routine that owns the current scope.
    pub fn declare(&mut self, id: ObjectId) -> Result<(), SymbolError> {
        let scope = self.current.ok_or(SymbolError::NoOpenScope)?;
        let object = &self.objects[id.index()];

        if self.find_in_scope(scope, &object.name).is_some() {
            return Err(SymbolError::Duplicate {
                name: object.name.clone(),
            });
        }
        trace!(name = %object.name, kind = object.kind_name(), ?scope, "declare");

        if let ObjectKind::Parameter { .. } = object.kind {
            let routine = self.scopes[scope.index()]
                .owner
                .filter(|owner| self.objects[owner.index()].is_routine())
                .ok_or_else(|| SymbolError::ParameterOutsideRoutine {
                    name: object.name.clone(),
                })?;
            self.params_mut(routine).push(id);
        }

        self.scopes[scope.index()].objects.push(id);
        Ok(())
    }

    /// Searches `scope` alone; the first object declared under `name` wins.
    pub fn find_in_scope(&self, scope: ScopeId, name: &str) -> Option<ObjectId> {
        self.scopes[scope.index()]
            .objects
            .iter()
            .copied()
            .find(|id| self.objects[id.index()].name == name)
    }

    /// Innermost-first search through the open scopes, then the predeclared
    /// routines. Names are case-sensitive.
    pub fn lookup(&self, name: &str) -> Option<ObjectId> {
        let mut scope = self.current;
        while let Some(id) = scope {
            if let Some(found) = self.find_in_scope(id, name) {
                return Some(found);
            }
            scope = self.scopes[id.index()].outer;
        }
        self.globals
            .iter()
            .copied()
            .find(|id| self.objects[id.index()].name == name)
    }

    pub fn object(&self, id: ObjectId) -> &Object {
        &self.objects[id.index()]
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn current_scope(&self) -> Option<ScopeId> {
        self.current
    }

    pub fn program(&self) -> Option<ObjectId> {
        self.program
    }

    pub fn int_type(&self) -> &Type {
        &self.int_type
    }

    pub fn char_type(&self) -> &Type {
        &self.char_type
    }

    /// Order in which [`clean`](Self::clean) releases objects: depth first
    /// along owning edges, children before the object that owns them, the
    /// program tree before the predeclared routines. Parameter lists are not
    /// followed.
    pub fn teardown_order(&self) -> Vec<ObjectId> {
        let mut released = Vec::new();
        if let Some(program) = self.program {
            self.release_object(program, &mut released);
        }
        for &global in &self.globals {
            self.release_object(global, &mut released);
        }
        released
    }

    fn release_object(&self, id: ObjectId, released: &mut Vec<ObjectId>) {
        if let Some(scope) = self.objects[id.index()].scope() {
            for &child in &self.scopes[scope.index()].objects {
                self.release_object(child, released);
            }
        }
        released.push(id);
    }

    /// Releases the whole table. Consuming `self` makes this a one-shot.
    ///
    /// Objects are dropped in [`teardown_order`](Self::teardown_order); any
    /// object that was created but never declared (a parse that failed between
    /// the two) is dropped afterwards. Returns the number released through
    /// owning edges.
    pub fn clean(self) -> usize {
        let order = self.teardown_order();
        let mut slots: Vec<Option<Object>> = self.objects.into_iter().map(Some).collect();

        let mut released = 0;
        for id in order {
            if let Some(object) = slots[id.index()].take() {
                trace!(name = %object.name, kind = object.kind_name(), "release");
                drop(object);
                released += 1;
            }
        }
        let orphaned = slots.iter().flatten().count();
        debug!(
            released,
            orphaned,
            scopes = self.scopes.len(),
            "clean symbol table"
        );
        released
    }
}
