use kaleido_core::ast::{Expr, FunctionDef, Prototype};
use kaleido_core::ir::Interpreter;
use kaleido_core::ir::lower::{CodegenContext, lower_function};
use kaleido_core::ir::op::{InstrKind, Terminator};
use kaleido_core::ir::value::Value;
use kaleido_core::ir::verify_function;
use kaleido_core::CodegenOptions;

fn unoptimized() -> CodegenContext {
    CodegenContext::with_options(CodegenOptions::default().with_optimize(false))
}

fn id_def() -> FunctionDef {
    // id(x) = if x < 10 then 1 else 0
    FunctionDef::new(
        Prototype::new("id", ["x"]),
        Expr::if_then_else(
            Expr::binary('<', Expr::variable("x"), Expr::number(10.0)),
            Expr::number(1.0),
            Expr::number(0.0),
        ),
    )
}

fn constant_conditional(cond: f64) -> FunctionDef {
    FunctionDef::new(
        Prototype::new("pick", Vec::<String>::new()),
        Expr::if_then_else(Expr::number(cond), Expr::number(10.0), Expr::number(20.0)),
    )
}

#[test]
fn conditional_builds_then_else_merge_with_phi() {
    let mut ctx = unoptimized();
    let id = lower_function(&id_def(), &mut ctx).expect("lowered");
    let func = ctx.module().function(id).unwrap();

    let labels: Vec<&str> = func.blocks().iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["entry", "then", "else", "ifcont"]);

    let entry = &func.blocks()[0];
    let (then_id, else_id) = match entry.term.as_ref() {
        Some(Terminator::CondBr { then_block, else_block, .. }) => (*then_block, *else_block),
        other => panic!("entry should end in a conditional branch, got {:?}", other),
    };
    assert_eq!(then_id, func.blocks()[1].id);
    assert_eq!(else_id, func.blocks()[2].id);

    let merge = &func.blocks()[3];
    assert_eq!(merge.phi_count(), 1);
    match &merge.instrs[0].kind {
        InstrKind::Phi { incoming, .. } => assert_eq!(
            incoming,
            &vec![(Value::Const(1.0), then_id), (Value::Const(0.0), else_id)]
        ),
        other => panic!("expected phi, got {:?}", other),
    }
    assert!(verify_function(ctx.module(), func).is_ok());
}

#[test]
fn comparison_scenario_selects_by_argument() {
    let mut ctx = CodegenContext::new();
    lower_function(&id_def(), &mut ctx).expect("lowered");
    let mut interp = Interpreter::new(ctx.module());
    assert_eq!(interp.call_by_name("id", &[5.0]), Ok(1.0));
    assert_eq!(interp.call_by_name("id", &[20.0]), Ok(0.0));
    assert_eq!(interp.call_by_name("id", &[10.0]), Ok(0.0));
}

#[test]
fn zero_condition_takes_else_branch() {
    let mut ctx = unoptimized();
    lower_function(&constant_conditional(0.0), &mut ctx).expect("lowered");
    let mut interp = Interpreter::new(ctx.module());
    assert_eq!(interp.call_by_name("pick", &[]), Ok(20.0));
}

#[test]
fn nonzero_condition_takes_then_branch() {
    let mut ctx = unoptimized();
    lower_function(&constant_conditional(1.0), &mut ctx).expect("lowered");
    let mut interp = Interpreter::new(ctx.module());
    assert_eq!(interp.call_by_name("pick", &[]), Ok(10.0));
}

#[test]
fn constant_conditional_folds_to_branch_value() {
    for (cond, expected) in [(0.0, 20.0), (1.0, 10.0), (-3.5, 10.0)] {
        let mut ctx = CodegenContext::new();
        let id = lower_function(&constant_conditional(cond), &mut ctx).expect("lowered");
        let func = ctx.module().function(id).unwrap();
        assert_eq!(func.blocks().len(), 1, "condition {}", cond);
        assert_eq!(
            func.blocks()[0].term,
            Some(Terminator::Ret {
                value: Value::Const(expected)
            })
        );
    }
}

#[test]
fn nested_conditional_wires_phi_to_inner_merge() {
    let mut ctx = unoptimized();
    // sign(x) = if x < 0 then 0 - 1 else (if 0 < x then 1 else 0)
    let body = Expr::if_then_else(
        Expr::binary('<', Expr::variable("x"), Expr::number(0.0)),
        Expr::binary('-', Expr::number(0.0), Expr::number(1.0)),
        Expr::if_then_else(
            Expr::binary('<', Expr::number(0.0), Expr::variable("x")),
            Expr::number(1.0),
            Expr::number(0.0),
        ),
    );
    let id = lower_function(&FunctionDef::new(Prototype::new("sign", ["x"]), body), &mut ctx).expect("lowered");
    let func = ctx.module().function(id).unwrap();
    assert!(verify_function(ctx.module(), func).is_ok());

    // the outer phi's else edge comes from the inner merge block, not "else"
    let merges: Vec<_> = func.blocks().iter().filter(|b| b.label == "ifcont").collect();
    assert_eq!(merges.len(), 2);
    let (outer_merge, inner_merge) = (merges[0], merges[1].id);
    match &outer_merge.instrs[0].kind {
        InstrKind::Phi { incoming, .. } => assert_eq!(incoming[1].1, inner_merge),
        other => panic!("expected phi, got {:?}", other),
    }

    let mut interp = Interpreter::new(ctx.module());
    assert_eq!(interp.call_by_name("sign", &[-4.0]), Ok(-1.0));
    assert_eq!(interp.call_by_name("sign", &[4.0]), Ok(1.0));
    assert_eq!(interp.call_by_name("sign", &[0.0]), Ok(0.0));
}

#[test]
fn conditional_in_arithmetic_continues_in_merge_block() {
    let mut ctx = CodegenContext::new();
    let body = Expr::binary(
        '+',
        Expr::if_then_else(Expr::variable("x"), Expr::number(1.0), Expr::number(2.0)),
        Expr::number(100.0),
    );
    lower_function(&FunctionDef::new(Prototype::new("f", ["x"]), body), &mut ctx).expect("lowered");
    let mut interp = Interpreter::new(ctx.module());
    assert_eq!(interp.call_by_name("f", &[1.0]), Ok(101.0));
    assert_eq!(interp.call_by_name("f", &[0.0]), Ok(102.0));
}
