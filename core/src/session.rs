//! file: core/src/session.rs
//! description: REPL-style processing of top-level items.
//!
//! Definitions and externs are lowered into the session's module and kept.
//! A top-level expression becomes the body of a zero-parameter function
//! named `__anon_expr`, which is evaluated (when evaluation is enabled) and
//! then removed so the next expression can reuse the name.
//!
use std::fmt;

use crate::ast::{FunctionDef, Item, Prototype};
use crate::error::{KaleidoErrorExt, SessionError};
use crate::ir::exec::Interpreter;
use crate::ir::lower::{CodegenContext, lower_function, lower_prototype};
use crate::ir::module::IrModule;

pub const ANON_EXPR_NAME: &str = "__anon_expr";

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Defined { name: String },
    Declared { name: String },
    Evaluated { value: f64 },
    /// A top-level expression lowered without running it.
    Discarded { ir: String },
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcome::Defined { name } => write!(f, "defined '{}'", name),
            ItemOutcome::Declared { name } => write!(f, "declared extern '{}'", name),
            ItemOutcome::Evaluated { value } => write!(f, "evaluated to {}", value),
            ItemOutcome::Discarded { .. } => write!(f, "lowered top-level expression"),
        }
    }
}

pub struct Session {
    ctx: CodegenContext,
    evaluate: bool,
}

impl Session {
    pub fn new(ctx: CodegenContext) -> Self {
        Session { ctx, evaluate: true }
    }

    /// Whether top-level expressions are executed after lowering.
    pub fn with_evaluation(mut self, evaluate: bool) -> Self {
        self.evaluate = evaluate;
        self
    }

    pub fn context(&self) -> &CodegenContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut CodegenContext {
        &mut self.ctx
    }

    pub fn module(&self) -> &IrModule {
        self.ctx.module()
    }

    pub fn into_module(self) -> IrModule {
        self.ctx.into_module()
    }

    pub fn handle_item(&mut self, item: &Item) -> Result<ItemOutcome, SessionError> {
        match item {
            Item::Function(def) => {
                lower_function(def, &mut self.ctx)?;
                Ok(ItemOutcome::Defined {
                    name: def.proto.name.clone(),
                })
            }
            Item::Extern(proto) => {
                lower_prototype(proto, &mut self.ctx)?;
                Ok(ItemOutcome::Declared {
                    name: proto.name.clone(),
                })
            }
            Item::Expr(expr) => {
                let def = FunctionDef::new(Prototype::new(ANON_EXPR_NAME, Vec::<String>::new()), expr.clone());
                let id = lower_function(&def, &mut self.ctx)?;

                let outcome = if self.evaluate {
                    let mut interp = Interpreter::with_options(self.ctx.module(), self.ctx.options());
                    let result = interp.call(id, &[]);
                    log::debug!("top-level expression ran {} steps", interp.steps());
                    result.map(|value| ItemOutcome::Evaluated { value })
                } else {
                    let ir = self
                        .ctx
                        .module()
                        .function(id)
                        .map(|f| f.to_string())
                        .unwrap_or_default();
                    Ok(ItemOutcome::Discarded { ir })
                };

                self.ctx.module_mut().delete_function(id);
                outcome.map_err(|err| {
                    self.ctx.emit_diagnostic(&err);
                    SessionError::from(err)
                })
            }
        }
    }

    /// Handle every item, continuing past failures. Failures were already
    /// reported through the diagnostic sink.
    pub fn handle_items(&mut self, items: &[Item]) -> Vec<Result<ItemOutcome, SessionError>> {
        items
            .iter()
            .map(|item| {
                let result = self.handle_item(item);
                if let Err(err) = &result {
                    log::debug!("item failed: {}", err.message());
                }
                result
            })
            .collect()
    }
}
