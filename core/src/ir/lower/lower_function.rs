//! file: core/src/ir/lower/lower_function.rs
//! description: prototype and function definition lowering.
//!
//! A definition resets the named-value environment, lowers its signature,
//! lowers the body into a fresh "entry" block, returns the body value, then
//! verifies and optimizes the result. A definition that fails at any step is
//! removed again so its name stays free for a corrected attempt.
//!
use std::collections::HashSet;

use crate::ast::{FunctionDef, Prototype};
use crate::error::{LowerErrorKind, LowerResult};
use crate::ir::value::{FuncId, Value};
use crate::ir::verify::verify_function;

use super::CodegenContext;
use super::lower_expr::lower_expr;

impl Prototype {
    pub fn lower(&self, ctx: &mut CodegenContext) -> LowerResult<FuncId> {
        lower_prototype(self, ctx)
    }
}

impl FunctionDef {
    pub fn lower(&self, ctx: &mut CodegenContext) -> LowerResult<FuncId> {
        lower_function(self, ctx)
    }
}

/// Declare (or reuse a compatible declaration of) the prototype and bind its
/// parameters.
pub fn lower_prototype(proto: &Prototype, ctx: &mut CodegenContext) -> LowerResult<FuncId> {
    declare_signature(proto, ctx).map(|(id, _)| id)
}

/// Returns the function and, when an existing declaration was reused, the
/// parameter names it had before.
fn declare_signature(proto: &Prototype, ctx: &mut CodegenContext) -> LowerResult<(FuncId, Option<Vec<String>>)> {
    let existing = ctx.module().lookup_function(&proto.name).map(|id| {
        let (has_body, arity) = ctx
            .module()
            .function(id)
            .map(|f| (f.has_body(), f.arity()))
            .unwrap_or_default();
        (id, has_body, arity)
    });
    if let Some((_, true, _)) = existing {
        return Err(ctx.fail(
            LowerErrorKind::Redefinition,
            format!("redefinition of function '{}'", proto.name),
        ));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = proto.params.iter().find(|p| !seen.insert(p.as_str())) {
        return Err(ctx.fail(
            LowerErrorKind::DuplicateParameter,
            format!("duplicate parameter '{}' in prototype '{}'", dup, proto.name),
        ));
    }

    let (id, previous) = match existing {
        Some((id, _, arity)) => {
            if arity != proto.arity() {
                return Err(ctx.fail(
                    LowerErrorKind::ArityConflict,
                    format!(
                        "redefinition of function '{}' with different # args ({} vs {})",
                        proto.name,
                        arity,
                        proto.arity()
                    ),
                ));
            }
            let previous = ctx
                .module_mut()
                .function_mut(id)
                .map(|f| std::mem::replace(&mut f.params, proto.params.clone()))
                .unwrap_or_default();
            (id, Some(previous))
        }
        None => match ctx.module_mut().declare_function(&proto.name, proto.params.clone()) {
            Some(id) => (id, None),
            None => {
                return Err(ctx.fail(
                    LowerErrorKind::Redefinition,
                    format!("symbol '{}' is already taken", proto.name),
                ));
            }
        },
    };

    for (i, param) in proto.params.iter().enumerate() {
        ctx.named_values.bind(param, Value::Arg(i as u32));
    }
    Ok((id, previous))
}

pub fn lower_function(def: &FunctionDef, ctx: &mut CodegenContext) -> LowerResult<FuncId> {
    ctx.named_values.clear();
    let (func, previous) = declare_signature(&def.proto, ctx)?;

    match lower_body(func, def, ctx) {
        Ok(()) => {
            ctx.builder.clear_cursor();
            log::debug!(
                "lowered function '{}' ({} instructions)",
                def.proto.name,
                ctx.module().function(func).map(|f| f.instr_count()).unwrap_or_default()
            );
            Ok(func)
        }
        Err(err) => {
            discard(func, previous, ctx);
            Err(err)
        }
    }
}

fn lower_body(func: FuncId, def: &FunctionDef, ctx: &mut CodegenContext) -> LowerResult<()> {
    let entry = ctx.with_builder(|b| b.append_basic_block(func, "entry"))?;
    ctx.builder.position_at_end(func, entry);

    let body = lower_expr(&def.body, ctx)?;
    ctx.with_builder(|b| b.build_ret(body.value))?;

    if ctx.options.verify {
        check(func, ctx)?;
    }
    if ctx.options.optimize {
        if let Some(f) = ctx.builder.module_mut().function_mut(func) {
            ctx.passes.run(f);
        }
        if ctx.options.verify {
            check(func, ctx)?;
        }
    }
    Ok(())
}

fn check(func: FuncId, ctx: &mut CodegenContext) -> LowerResult<()> {
    let module = ctx.module();
    let result = match module.function(func) {
        Some(f) => verify_function(module, f).map_err(|e| e.to_string()),
        None => Err(format!("function {} vanished during lowering", func)),
    };
    result.map_err(|message| ctx.fail(LowerErrorKind::Verification, message))
}

/// Undo a failed definition. A declaration that existed beforehand keeps
/// existing, bodiless and with its own parameter names; a function created
/// for this definition is deleted.
fn discard(func: FuncId, previous: Option<Vec<String>>, ctx: &mut CodegenContext) {
    ctx.builder.clear_cursor();
    ctx.named_values.clear();
    match previous {
        Some(params) => {
            if let Some(f) = ctx.module_mut().function_mut(func) {
                f.clear_body();
                f.params = params;
            }
        }
        None => {
            ctx.module_mut().delete_function(func);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Expr;

    #[test]
    fn prototype_binds_parameters_in_order() {
        let mut ctx = CodegenContext::new();
        let id = Prototype::new("f", ["a", "b"]).lower(&mut ctx).expect("declared");
        assert_eq!(ctx.named_values().lookup("a"), Some(Value::Arg(0)));
        assert_eq!(ctx.named_values().lookup("b"), Some(Value::Arg(1)));
        assert!(!ctx.module().function(id).unwrap().has_body());
    }

    #[test]
    fn failed_definition_over_extern_keeps_declaration() {
        let mut ctx = CodegenContext::new();
        let id = Prototype::new("g", ["x"]).lower(&mut ctx).expect("declared");
        let bad = FunctionDef::new(Prototype::new("g", ["y"]), Expr::variable("nope"));
        assert!(bad.lower(&mut ctx).is_err());
        let func = ctx.module().function(id).expect("still declared");
        assert!(!func.has_body());
        assert_eq!(func.params, vec!["x".to_string()]);
        assert!(ctx.named_values().is_empty());
        assert!(ctx.builder().cursor().is_none());
    }

    #[test]
    fn redefinition_wins_over_duplicate_parameters() {
        let mut ctx = CodegenContext::new();
        let ok = FunctionDef::new(Prototype::new("h", ["a"]), Expr::variable("a"));
        ok.lower(&mut ctx).expect("defined");
        let again = FunctionDef::new(Prototype::new("h", ["a", "a"]), Expr::variable("a"));
        let err = again.lower(&mut ctx).unwrap_err();
        assert_eq!(err.kind(), LowerErrorKind::Redefinition);
        assert!(ctx.module().lookup_function("h").is_some());
    }
}
