//! file: core/src/ir/opt/dce.rs
//! description: dead-code-elimination optimizer pass.
//!
//! Removes pure instructions whose results are never used. Calls are kept
//! since the callee may have side effects.
use std::collections::HashSet;

use crate::ir::function::Function;
use crate::ir::value::ValueId;

use super::FunctionPass;

#[derive(Debug, Clone, Copy, Default)]
pub struct DeadCodeElim;

impl FunctionPass for DeadCodeElim {
    fn name(&self) -> &'static str {
        "dce"
    }

    fn run(&mut self, func: &mut Function) -> bool {
        let mut changed = false;
        loop {
            let used = used_values(func);
            let mut removed = 0usize;
            for block in func.blocks_mut().iter_mut() {
                let before = block.instrs.len();
                block.instrs.retain(|i| !i.kind.is_pure() || used.contains(&i.dest));
                removed += before - block.instrs.len();
            }
            if removed == 0 {
                break;
            }
            log::trace!("dce removed {} instruction(s) from '{}'", removed, func.name);
            changed = true;
        }
        changed
    }
}

fn used_values(func: &Function) -> HashSet<ValueId> {
    let mut used = HashSet::new();
    for block in func.blocks() {
        for instr in block.instrs.iter() {
            for operand in instr.kind.operands() {
                if let Some(id) = operand.as_inst() {
                    // a phi feeding only itself is still dead
                    if id != instr.dest {
                        used.insert(id);
                    }
                }
            }
        }
        if let Some(term) = &block.term {
            used.extend(term.operands().iter().filter_map(|v| v.as_inst()));
        }
    }
    used
}
