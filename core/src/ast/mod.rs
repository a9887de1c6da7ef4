//! file: core/src/ast/mod.rs
//! description: syntax tree consumed by lowering.
//!
//! The tree is built by an external parser (or deserialized from JSON) and
//! handed to `lower` as-is. Nodes own their children exclusively.
//!
pub mod expr;
pub mod item;

pub use expr::Expr;
pub use item::{FunctionDef, Item, Prototype};
