//! file: core/src/ir/lower/mod.rs
//! description: AST to SSA IR lowering.
//!
//! Entry points are `lower_function` for definitions and `lower_prototype`
//! for bare declarations. Both thread a `CodegenContext` holding the
//! builder, the named-value environment and the diagnostic sink.
//!
mod declare_builtins;
mod lower_expr;
mod lower_function;
mod lowering_context;
mod named_values;

pub use declare_builtins::declare_host_functions;
pub use lower_expr::{Lowered, lower_expr};
pub use lower_function::{lower_function, lower_prototype};
pub use lowering_context::CodegenContext;
pub use named_values::NamedValues;
