//! file: core/src/ir/lower/declare_builtins.rs
//! description: declare the host functions the interpreter provides.
//!
//! Emits bodiless declarations for `sin`, `cos`, `sqrt`, `putchard` and
//! `printd` so programs can call them without writing `extern` first. Names
//! that are already declared are left alone.
//!
use crate::ir::host::HOST_FUNCTIONS;

use super::CodegenContext;

/// Returns the names that were newly declared.
pub fn declare_host_functions(ctx: &mut CodegenContext) -> Vec<&'static str> {
    let mut declared = Vec::new();
    for (name, arity) in HOST_FUNCTIONS.iter() {
        if ctx.module().lookup_function(name).is_some() {
            continue;
        }
        let params = (0..*arity).map(|i| format!("x{}", i)).collect();
        if ctx.module_mut().declare_function(name, params).is_some() {
            declared.push(*name);
        }
    }
    log::debug!("declared host functions: {:?}", declared);
    declared
}
