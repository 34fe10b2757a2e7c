use std::io::Write;

use kplc::{
    DisplayObject, ErrorKind, SourceIoError, SymbolTable, UnexpectedToken, compile,
    compile_source,
    constant::ConstantValue,
    error::error_kind,
    lex::TokenKind,
    symtab::{ObjectId, ObjectKind, PassingMode},
    types::Type,
};

fn program_objects(symtab: &SymbolTable) -> Vec<ObjectId> {
    let program = symtab.program().expect("program object");
    let scope = symtab.object(program).scope().expect("program scope");
    symtab.scope(scope).objects().to_vec()
}

fn find(symtab: &SymbolTable, ids: &[ObjectId], name: &str) -> ObjectId {
    *ids.iter()
        .find(|&&id| symtab.object(id).name == name)
        .unwrap_or_else(|| panic!("`{name}` is not declared"))
}

fn failure(src: &str) -> ErrorKind {
    let err = compile_source(None, src).expect_err("program should be rejected");
    error_kind(&err).unwrap_or_else(|| panic!("no error kind in {err:?}"))
}

#[test]
fn constant_and_variable_in_program_scope() {
    let symtab =
        compile_source(None, "program P; const c = 3; var x: Integer; begin x := c end.").unwrap();

    let objects = program_objects(&symtab);
    assert_eq!(objects.len(), 2);
    assert!(matches!(
        &symtab.object(objects[0]).kind,
        ObjectKind::Constant { value: ConstantValue::Int(3) }
    ));
    assert_eq!(symtab.object(objects[0]).name, "c");
    assert!(matches!(
        &symtab.object(objects[1]).kind,
        ObjectKind::Variable { ty: Type::Int, .. }
    ));
    assert_eq!(symtab.object(objects[1]).name, "x");
    assert_eq!(symtab.current_scope(), None);
}

#[test]
fn declarations_keep_source_order_and_resolve_aliases() {
    let src = "
        program Sample;
        const n = 10; m = -n; ch = 'z';
        type row = array(. 10 .) of integer;
             grid = array(. 4 .) of row;
        var g : grid; r : row; k : char;
        begin
          g(.1.)(.2.) := m;
          k := ch
        end.";
    let symtab = compile_source(Some("sample.kpl"), src).unwrap();
    let objects = program_objects(&symtab);
    let names: Vec<_> = objects
        .iter()
        .map(|&id| symtab.object(id).name.as_str())
        .collect();
    assert_eq!(names, ["n", "m", "ch", "row", "grid", "g", "r", "k"]);

    let m = find(&symtab, &objects, "m");
    assert!(matches!(
        symtab.object(m).kind,
        ObjectKind::Constant { value: ConstantValue::Int(-10) }
    ));

    let g = find(&symtab, &objects, "g");
    let ObjectKind::Variable { ty, .. } = &symtab.object(g).kind else {
        panic!("g is a variable");
    };
    assert_eq!(*ty, Type::array(4, Type::array(10, Type::int())));
}

#[test]
fn routine_is_visible_inside_its_own_body() {
    let src = "
        program Rec;
        procedure Countdown(n: integer);
        begin
          if n > 0 then call Countdown(n - 1)
        end;
        begin call Countdown(3) end.";
    let symtab = compile_source(None, src).unwrap();
    let objects = program_objects(&symtab);
    let countdown = find(&symtab, &objects, "Countdown");
    assert!(matches!(
        symtab.object(countdown).kind,
        ObjectKind::Procedure { .. }
    ));
}

#[test]
fn parameters_are_both_scoped_and_listed_on_the_routine() {
    let src = "
        program Params;
        function Sum(a: integer; var b: integer; c: char): integer;
        var t : integer;
        begin
          t := a + b;
          Sum := t
        end;
        begin end.";
    let symtab = compile_source(None, src).unwrap();
    let sum = find(&symtab, &program_objects(&symtab), "Sum");
    let function = symtab.object(sum);
    assert!(matches!(
        &function.kind,
        ObjectKind::Function { return_type: Some(Type::Int), .. }
    ));

    let scope = function.scope().unwrap();
    let scoped = symtab.scope(scope).objects();
    assert_eq!(scoped.len(), 4);
    assert_eq!(function.params(), &scoped[..3]);

    let modes: Vec<_> = function
        .params()
        .iter()
        .map(|&p| match &symtab.object(p).kind {
            ObjectKind::Parameter { mode, owner, .. } => {
                assert_eq!(*owner, sum);
                *mode
            }
            other => panic!("not a parameter: {other:?}"),
        })
        .collect();
    assert_eq!(
        modes,
        [
            PassingMode::ByValue,
            PassingMode::ByReference,
            PassingMode::ByValue
        ]
    );
}

#[test]
fn nested_routine_shadows_outer_names() {
    let src = "
        program Shadow;
        const x = 1;
        procedure Inner;
        const x = 'q';
        type t = array(. 2 .) of integer;
        var y : t;
        begin end;
        begin end.";
    let symtab = compile_source(None, src).unwrap();
    let objects = program_objects(&symtab);
    let inner = find(&symtab, &objects, "Inner");
    let inner_scope = symtab.object(inner).scope().unwrap();
    assert_eq!(
        symtab.scope(inner_scope).outer,
        symtab.object(symtab.program().unwrap()).scope()
    );

    let inner_x = symtab.find_in_scope(inner_scope, "x").unwrap();
    assert!(matches!(
        symtab.object(inner_x).kind,
        ObjectKind::Constant { value: ConstantValue::Char('q') }
    ));
    let outer_x = find(&symtab, &objects, "x");
    assert_ne!(inner_x, outer_x);
}

#[test]
fn predeclared_procedures_can_be_called() {
    let src = "
        program Io;
        var n : integer; c : char;
        begin
          n := READI;
          c := READC;
          call WRITEI(n * 2);
          call WRITEC(c);
          call WRITELN
        end.";
    assert!(compile_source(None, src).is_ok());
}

#[test]
fn calling_a_function_or_unknown_name_is_rejected() {
    assert_eq!(
        failure("program P; begin call READI end."),
        ErrorKind::UndeclaredProcedure
    );
    assert_eq!(
        failure("program P; begin call Missing(1) end."),
        ErrorKind::UndeclaredProcedure
    );
}

#[test]
fn semantic_errors() {
    assert_eq!(
        failure("program P; const c = -'a'; begin end."),
        ErrorKind::InvalidConstant
    );
    assert_eq!(
        failure("program P; const c = d; begin end."),
        ErrorKind::UndeclaredConstant
    );
    assert_eq!(
        failure("program P; const c = READI; begin end."),
        ErrorKind::UndeclaredConstant
    );
    assert_eq!(
        failure("program P; procedure Q; const c = Q; begin end; begin end."),
        ErrorKind::UndeclaredConstant
    );
    assert_eq!(
        failure("program P; type t = READI; begin end."),
        ErrorKind::UndeclaredType
    );
    assert_eq!(
        failure("program P; var v : vector; begin end."),
        ErrorKind::UndeclaredType
    );
    assert_eq!(
        failure("program P; var x : integer; x : char; begin end."),
        ErrorKind::DuplicateIdentifier
    );
    assert_eq!(
        failure("program P; procedure Q(a: integer; a: char); begin end; begin end."),
        ErrorKind::DuplicateIdentifier
    );
}

#[test]
fn grammar_errors() {
    assert_eq!(
        failure("program P; function F(a: array(. 2 .) of integer): integer; begin end; begin end."),
        ErrorKind::InvalidBasicType
    );
    assert_eq!(
        failure("program P; procedure Q(1); begin end; begin end."),
        ErrorKind::InvalidParameter
    );
    assert_eq!(failure("program P; begin := end."), ErrorKind::InvalidStatement);
    assert_eq!(
        failure("program P; var a : integer; begin if a then a := 1 end."),
        ErrorKind::InvalidComparator
    );
    assert_eq!(
        failure("program P; var a : integer; begin a := ; end."),
        ErrorKind::InvalidFactor
    );
    assert_eq!(
        failure("program P; var a : integer; begin a := 1 2 end."),
        ErrorKind::InvalidTerm
    );
    assert_eq!(failure("program P; type t = ; begin end."), ErrorKind::InvalidType);
}

#[test]
fn error_carries_the_offending_position() {
    let src = "program P;\nvar v : integer;\n    w : missing;\nbegin end.";
    let err = compile_source(None, src).unwrap_err();
    let semantic = err.downcast_ref::<kplc::SemanticError>().unwrap();
    assert_eq!(semantic.kind, ErrorKind::UndeclaredType);
    assert_eq!((semantic.position.line, semantic.position.column), (3, 9));
}

#[test]
fn missing_terminator_is_an_unexpected_token() {
    let err = compile_source(None, "program P; begin end").unwrap_err();
    let unexpected = err.downcast_ref::<UnexpectedToken>().unwrap();
    assert_eq!(unexpected.expected, TokenKind::Period);
    assert_eq!(unexpected.found, TokenKind::Eof);
}

#[test]
fn resolved_tree_prints_every_scope() {
    let src = "
        program Show;
        const c = 3;
        function F(var k: char): integer;
        begin end;
        begin end.";
    let symtab = compile_source(None, src).unwrap();
    let rendered = DisplayObject(&symtab, symtab.program().unwrap()).to_string();
    assert_eq!(
        rendered,
        "Program Show\n    Const c = 3\n    Function F : Int\n        Param VAR k : Char"
    );
}

#[test]
fn compile_reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "program Disk; var x : char; begin x := 'a' end.").unwrap();
    let symtab = compile(file.path()).unwrap();
    assert_eq!(program_objects(&symtab).len(), 1);
    // program, x, and the predeclared routines with their parameters
    assert_eq!(symtab.clean(), 9);
}

#[test]
fn unreadable_source_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = compile(dir.path().join("absent.kpl")).unwrap_err();
    assert!(err.downcast_ref::<SourceIoError>().is_some());
    assert_eq!(error_kind(&err), None);
}

#[test]
fn undecodable_source_is_an_invalid_symbol() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"program P;\n  var \xff : char; begin end.")
        .unwrap();
    let err = compile(file.path()).unwrap_err();
    assert!(err.downcast_ref::<SourceIoError>().is_none());
    let semantic = err.downcast_ref::<kplc::SemanticError>().unwrap();
    assert_eq!(semantic.kind, ErrorKind::InvalidSymbol);
    assert_eq!((semantic.position.line, semantic.position.column), (2, 7));
}
