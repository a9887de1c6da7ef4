//! file: core/src/ir/lower/lower_expr.rs
//! description: expression lowering.
//!
//! Each expression lowers to a `Lowered` pair: the resulting value and the
//! block the cursor was left in. Conditionals rely on the block half to wire
//! the merge phi to the blocks that actually fall through, which may be
//! nested blocks rather than the branch blocks created for them.
//!
use crate::ast::Expr;
use crate::error::{LowerErrorKind, LowerResult};
use crate::ir::op::{BinOpKind, CmpPred};
use crate::ir::value::{BlockId, Type, Value};

use super::CodegenContext;

/// The value an expression produced and the block the cursor ended in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lowered {
    pub value: Value,
    pub block: BlockId,
}

impl Expr {
    pub fn lower(&self, ctx: &mut CodegenContext) -> LowerResult<Lowered> {
        lower_expr(self, ctx)
    }
}

pub fn lower_expr(expr: &Expr, ctx: &mut CodegenContext) -> LowerResult<Lowered> {
    match expr {
        Expr::Number { value } => lower_number(*value, ctx),
        Expr::Variable { name } => lower_variable(name, ctx),
        Expr::Binary { op, lhs, rhs } => lower_binary(*op, lhs, rhs, ctx),
        Expr::Call { callee, args } => lower_call(callee, args, ctx),
        Expr::If {
            cond,
            then_branch,
            else_branch,
        } => lower_if(cond, then_branch, else_branch, ctx),
    }
}

fn here(ctx: &mut CodegenContext, value: Value) -> LowerResult<Lowered> {
    let (_, block) = ctx.insertion_point()?;
    Ok(Lowered { value, block })
}

fn lower_number(value: f64, ctx: &mut CodegenContext) -> LowerResult<Lowered> {
    let value = ctx.builder.const_f64(value);
    here(ctx, value)
}

fn lower_variable(name: &str, ctx: &mut CodegenContext) -> LowerResult<Lowered> {
    match ctx.named_values.lookup(name) {
        Some(value) => here(ctx, value),
        None => Err(ctx.fail(
            LowerErrorKind::UnknownVariable,
            format!("Unknown variable name '{}'", name),
        )),
    }
}

fn lower_binary(op: char, lhs: &Expr, rhs: &Expr, ctx: &mut CodegenContext) -> LowerResult<Lowered> {
    let l = lower_expr(lhs, ctx)?;
    let r = lower_expr(rhs, ctx)?;
    let value = match op {
        '+' => ctx.with_builder(|b| b.build_binop(BinOpKind::Add, l.value, r.value))?,
        '-' => ctx.with_builder(|b| b.build_binop(BinOpKind::Sub, l.value, r.value))?,
        '*' => ctx.with_builder(|b| b.build_binop(BinOpKind::Mul, l.value, r.value))?,
        '<' => ctx.with_builder(|b| b.build_compare_and_promote(l.value, r.value))?,
        other => {
            return Err(ctx.fail(
                LowerErrorKind::UnknownOperator,
                format!("invalid binary operator '{}'", other),
            ));
        }
    };
    here(ctx, value)
}

fn lower_call(callee: &str, args: &[Expr], ctx: &mut CodegenContext) -> LowerResult<Lowered> {
    let Some(func) = ctx.module().lookup_function(callee) else {
        return Err(ctx.fail(
            LowerErrorKind::UnknownFunction,
            format!("Unknown function referenced '{}'", callee),
        ));
    };
    let expected = ctx.module().function(func).map(|f| f.arity()).unwrap_or_default();
    if expected != args.len() {
        return Err(ctx.fail(
            LowerErrorKind::ArityMismatch,
            format!(
                "Incorrect # arguments passed to '{}': expected {}, got {}",
                callee,
                expected,
                args.len()
            ),
        ));
    }

    let mut values = Vec::with_capacity(args.len());
    for arg in args.iter() {
        values.push(lower_expr(arg, ctx)?.value);
    }
    let value = ctx.with_builder(|b| b.build_call(func, values))?;
    here(ctx, value)
}

fn lower_if(cond: &Expr, then_branch: &Expr, else_branch: &Expr, ctx: &mut CodegenContext) -> LowerResult<Lowered> {
    let cond = lower_expr(cond, ctx)?;
    let pred = ctx.with_builder(|b| b.build_fcmp(CmpPred::One, cond.value, Value::Const(0.0)))?;
    let (func, origin) = ctx.insertion_point()?;

    let then_block = ctx.with_builder(|b| b.append_basic_block(func, "then"))?;
    let else_block = ctx.with_builder(|b| b.append_basic_block(func, "else"))?;
    let merge_block = ctx.with_builder(|b| b.append_basic_block(func, "ifcont"))?;

    // Bindings made inside one branch must not leak into the other or past
    // the merge.
    let scope = ctx.named_values.snapshot();

    ctx.builder.position_at_end(func, then_block);
    let then_result = lower_expr(then_branch, ctx);
    ctx.named_values.restore(scope.clone());
    let then_end = then_result?;

    ctx.builder.position_at_end(func, else_block);
    let else_result = lower_expr(else_branch, ctx);
    ctx.named_values.restore(scope);
    let else_end = else_result?;

    ctx.builder.position_at_end(func, merge_block);
    let phi = ctx.with_builder(|b| {
        b.build_phi(
            Type::Double,
            vec![(then_end.value, then_end.block), (else_end.value, else_end.block)],
        )
    })?;

    ctx.builder.position_at_end(func, then_end.block);
    ctx.with_builder(|b| b.build_br(merge_block))?;
    ctx.builder.position_at_end(func, else_end.block);
    ctx.with_builder(|b| b.build_br(merge_block))?;
    ctx.builder.position_at_end(func, origin);
    ctx.with_builder(|b| b.build_cond_br(pred, then_block, else_block))?;

    ctx.builder.position_at_end(func, merge_block);
    log::trace!("lowered conditional into {} / {} / {}", then_block, else_block, merge_block);
    Ok(Lowered {
        value: phi,
        block: merge_block,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::MemorySink;
    use crate::ir::op::InstrKind;

    fn context_in_fn(params: &[&str]) -> (CodegenContext, MemorySink) {
        let sink = MemorySink::new();
        let mut ctx = CodegenContext::new().with_diagnostics(sink.clone());
        let names: Vec<String> = params.iter().map(|p| p.to_string()).collect();
        let func = ctx.module_mut().declare_function("test", names).expect("fresh name");
        let entry = ctx.builder_mut().append_basic_block(func, "entry").expect("block");
        ctx.builder_mut().position_at_end(func, entry);
        for (i, p) in params.iter().enumerate() {
            ctx.named_values_mut().bind(p, Value::Arg(i as u32));
        }
        (ctx, sink)
    }

    #[test]
    fn number_is_a_constant() {
        let (mut ctx, _) = context_in_fn(&[]);
        let lowered = Expr::number(4.5).lower(&mut ctx).expect("lowered");
        assert_eq!(lowered.value, Value::Const(4.5));
    }

    #[test]
    fn unknown_variable_reports_once() {
        let (mut ctx, sink) = context_in_fn(&[]);
        let err = Expr::variable("y").lower(&mut ctx).unwrap_err();
        assert_eq!(err.kind(), LowerErrorKind::UnknownVariable);
        assert_eq!(sink.len(), 1);
        assert_eq!(ctx.module().function_by_name("test").unwrap().instr_count(), 0);
    }

    #[test]
    fn less_than_promotes_to_double() {
        let (mut ctx, _) = context_in_fn(&["a", "b"]);
        let expr = Expr::binary('<', Expr::variable("a"), Expr::variable("b"));
        let lowered = expr.lower(&mut ctx).expect("lowered");
        let func = ctx.module().function_by_name("test").unwrap();
        let id = lowered.value.as_inst().expect("instruction");
        assert!(matches!(func.instr(id).unwrap().kind, InstrKind::UiToFp { .. }));
        assert_eq!(func.instr_count(), 2);
    }

    #[test]
    fn operator_checked_after_operands() {
        let (mut ctx, _) = context_in_fn(&[]);
        let expr = Expr::binary('/', Expr::number(1.0), Expr::variable("missing"));
        let err = expr.lower(&mut ctx).unwrap_err();
        assert_eq!(err.kind(), LowerErrorKind::UnknownVariable);
    }

    #[test]
    fn conditional_leaves_cursor_in_merge() {
        let (mut ctx, _) = context_in_fn(&["x"]);
        let expr = Expr::if_then_else(Expr::variable("x"), Expr::number(1.0), Expr::number(2.0));
        let lowered = expr.lower(&mut ctx).expect("lowered");
        assert_eq!(ctx.builder().insert_block(), Some(lowered.block));
        let func = ctx.module().function_by_name("test").unwrap();
        let labels: Vec<&str> = func.blocks().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["entry", "then", "else", "ifcont"]);
    }
}
