use kaleido_core::ast::{Expr, FunctionDef, Prototype};
use kaleido_core::ir::Interpreter;
use kaleido_core::ir::lower::{CodegenContext, lower_function, lower_prototype};
use kaleido_core::ir::op::InstrKind;
use kaleido_core::{CodegenOptions, LowerErrorKind, MemorySink};

fn context() -> (CodegenContext, MemorySink) {
    let sink = MemorySink::new();
    let ctx = CodegenContext::new().with_diagnostics(sink.clone());
    (ctx, sink)
}

fn add_def(name: &str) -> FunctionDef {
    FunctionDef::new(
        Prototype::new(name, ["a", "b"]),
        Expr::binary('+', Expr::variable("a"), Expr::variable("b")),
    )
}

#[test]
fn definition_produces_entry_block_and_return() {
    let (mut ctx, sink) = context();
    let id = lower_function(&add_def("add"), &mut ctx).expect("lowered");
    let func = ctx.module().function(id).unwrap();
    assert_eq!(func.blocks().len(), 1);
    assert_eq!(func.blocks()[0].label, "entry");
    assert!(func.blocks()[0].is_terminated());
    assert!(sink.is_empty());
    assert!(ctx.builder().cursor().is_none());
}

#[test]
fn redefinition_keeps_original_callable() {
    let (mut ctx, sink) = context();
    let first = lower_function(&add_def("add"), &mut ctx).expect("lowered");
    let other = FunctionDef::new(
        Prototype::new("add", ["a", "b"]),
        Expr::binary('*', Expr::variable("a"), Expr::variable("b")),
    );
    let err = lower_function(&other, &mut ctx).unwrap_err();
    assert_eq!(err.kind(), LowerErrorKind::Redefinition);
    assert_eq!(sink.len(), 1);

    assert_eq!(ctx.module().lookup_function("add"), Some(first));
    let mut interp = Interpreter::new(ctx.module());
    assert_eq!(interp.call_by_name("add", &[2.0, 5.0]), Ok(7.0));
}

#[test]
fn lowering_the_same_definition_twice_is_a_redefinition() {
    let (mut ctx, _) = context();
    let def = add_def("twice");
    lower_function(&def, &mut ctx).expect("first lowering");
    let err = lower_function(&def, &mut ctx).unwrap_err();
    assert_eq!(err.kind(), LowerErrorKind::Redefinition);
    assert_eq!(ctx.module().len(), 1);
}

#[test]
fn extern_after_definition_is_a_redefinition() {
    let (mut ctx, _) = context();
    lower_function(&add_def("add"), &mut ctx).expect("lowered");
    let err = lower_prototype(&Prototype::new("add", ["a", "b"]), &mut ctx).unwrap_err();
    assert_eq!(err.kind(), LowerErrorKind::Redefinition);
}

#[test]
fn declaration_with_different_arity_conflicts() {
    let (mut ctx, _) = context();
    lower_prototype(&Prototype::new("f", ["x"]), &mut ctx).unwrap();
    let err = lower_prototype(&Prototype::new("f", ["x", "y"]), &mut ctx).unwrap_err();
    assert_eq!(err.kind(), LowerErrorKind::ArityConflict);

    let err = lower_function(&add_def("f"), &mut ctx).unwrap_err();
    assert_eq!(err.kind(), LowerErrorKind::ArityConflict);
    assert_eq!(ctx.module().function_by_name("f").unwrap().arity(), 1);
}

#[test]
fn compatible_declaration_is_reused_by_definition() {
    let (mut ctx, _) = context();
    let declared = lower_prototype(&Prototype::new("add", ["x", "y"]), &mut ctx).unwrap();
    let again = lower_prototype(&Prototype::new("add", ["p", "q"]), &mut ctx).unwrap();
    assert_eq!(declared, again);

    let defined = lower_function(&add_def("add"), &mut ctx).expect("lowered");
    assert_eq!(declared, defined);
    assert_eq!(ctx.module().len(), 1);
    let func = ctx.module().function(defined).unwrap();
    assert!(func.has_body());
    assert_eq!(func.params, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn forward_declaration_allows_calls_before_definition() {
    let (mut ctx, _) = context();
    lower_prototype(&Prototype::new("later", ["x"]), &mut ctx).unwrap();
    let caller = FunctionDef::new(
        Prototype::new("caller", ["x"]),
        Expr::call("later", vec![Expr::variable("x")]),
    );
    lower_function(&caller, &mut ctx).expect("caller lowered");
    let later = FunctionDef::new(
        Prototype::new("later", ["x"]),
        Expr::binary('*', Expr::variable("x"), Expr::number(3.0)),
    );
    lower_function(&later, &mut ctx).expect("callee lowered");

    let mut interp = Interpreter::new(ctx.module());
    assert_eq!(interp.call_by_name("caller", &[4.0]), Ok(12.0));
}

#[test]
fn duplicate_parameters_are_rejected() {
    let (mut ctx, sink) = context();
    let def = FunctionDef::new(Prototype::new("dup", ["x", "x"]), Expr::variable("x"));
    let err = lower_function(&def, &mut ctx).unwrap_err();
    assert_eq!(err.kind(), LowerErrorKind::DuplicateParameter);
    assert!(ctx.module().is_empty());
    assert_eq!(sink.len(), 1);

    let err = lower_prototype(&Prototype::new("dup", ["y", "y"]), &mut ctx).unwrap_err();
    assert_eq!(err.kind(), LowerErrorKind::DuplicateParameter);
}

#[test]
fn failed_definition_frees_the_name() {
    let (mut ctx, _) = context();
    let bad = FunctionDef::new(Prototype::new("f", ["x"]), Expr::variable("y"));
    assert!(lower_function(&bad, &mut ctx).is_err());
    assert!(ctx.module().lookup_function("f").is_none());
    assert!(ctx.named_values().is_empty());

    let good = FunctionDef::new(Prototype::new("f", ["y"]), Expr::variable("y"));
    let id = lower_function(&good, &mut ctx).expect("corrected definition");
    assert!(ctx.module().function(id).unwrap().has_body());
}

#[test]
fn failure_inside_conditional_discards_whole_function() {
    let (mut ctx, _) = context();
    let body = Expr::if_then_else(
        Expr::variable("x"),
        Expr::binary('+', Expr::variable("x"), Expr::number(1.0)),
        Expr::variable("nope"),
    );
    let def = FunctionDef::new(Prototype::new("f", ["x"]), body);
    let err = lower_function(&def, &mut ctx).unwrap_err();
    assert_eq!(err.kind(), LowerErrorKind::UnknownVariable);
    assert!(ctx.module().is_empty());
}

#[test]
fn environment_does_not_leak_between_functions() {
    let (mut ctx, _) = context();
    lower_function(&add_def("add"), &mut ctx).expect("lowered");
    let uses_a = FunctionDef::new(Prototype::new("g", Vec::<String>::new()), Expr::variable("a"));
    let err = lower_function(&uses_a, &mut ctx).unwrap_err();
    assert_eq!(err.kind(), LowerErrorKind::UnknownVariable);
}

#[test]
fn optimization_runs_over_each_definition() {
    let (mut ctx, _) = context();
    let def = FunctionDef::new(
        Prototype::new("k", ["x"]),
        Expr::binary(
            '+',
            Expr::binary('*', Expr::number(2.0), Expr::number(3.0)),
            Expr::variable("x"),
        ),
    );
    let id = lower_function(&def, &mut ctx).expect("lowered");
    let func = ctx.module().function(id).unwrap();
    assert_eq!(func.instr_count(), 1);
    match &func.blocks()[0].instrs[0].kind {
        InstrKind::Bin { lhs, .. } => assert_eq!(lhs.as_const(), Some(6.0)),
        other => panic!("expected fadd, got {:?}", other),
    }

    let mut plain = CodegenContext::with_options(CodegenOptions::default().with_optimize(false));
    let id = lower_function(&def, &mut plain).expect("lowered");
    assert_eq!(plain.module().function(id).unwrap().instr_count(), 2);
}
