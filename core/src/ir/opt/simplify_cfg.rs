//! file: core/src/ir/opt/simplify_cfg.rs
//! description: control-flow simplification pass.
//!
//! - Conditional branches on a constant become unconditional branches.
//! - Blocks unreachable from entry are removed and their phi edges pruned.
//! - A block whose only predecessor jumps straight to it is merged into
//!   that predecessor; its phis collapse to their single incoming value.
use crate::ir::function::Function;
use crate::ir::op::{InstrKind, Terminator};
use crate::ir::value::{BlockId, Value};
use crate::ir::verify::reachable_blocks;

use super::FunctionPass;

#[derive(Debug, Clone, Copy, Default)]
pub struct SimplifyCfg;

impl FunctionPass for SimplifyCfg {
    fn name(&self) -> &'static str {
        "simplify-cfg"
    }

    fn run(&mut self, func: &mut Function) -> bool {
        let mut changed = fold_constant_branches(func);
        changed |= remove_unreachable(func);
        while merge_straight_line(func) {
            changed = true;
        }
        changed
    }
}

fn fold_constant_branches(func: &mut Function) -> bool {
    let mut changed = false;
    let ids: Vec<BlockId> = func.blocks().iter().map(|b| b.id).collect();
    for id in ids {
        let Some(block) = func.block(id) else { continue };
        let (target, dropped) = match &block.term {
            Some(Terminator::CondBr { cond: Value::Bool(taken), then_block, else_block }) => {
                if *taken {
                    (*then_block, *else_block)
                } else {
                    (*else_block, *then_block)
                }
            }
            Some(Terminator::CondBr { then_block, else_block, .. }) if then_block == else_block => {
                (*then_block, *then_block)
            }
            _ => continue,
        };
        if let Some(block) = func.block_mut(id) {
            block.term = Some(Terminator::Br { target });
        }
        if dropped != target {
            func.remove_phi_edges(dropped, id);
        }
        changed = true;
    }
    changed
}

fn remove_unreachable(func: &mut Function) -> bool {
    let reachable = reachable_blocks(func);
    let dead: Vec<BlockId> = func
        .blocks()
        .iter()
        .map(|b| b.id)
        .filter(|id| !reachable.contains(id))
        .collect();
    if dead.is_empty() {
        return false;
    }
    for id in dead {
        if let Some(block) = func.remove_block(id) {
            for succ in block.successors() {
                func.remove_phi_edges(succ, id);
            }
        }
    }
    true
}

fn merge_straight_line(func: &mut Function) -> bool {
    let preds = func.predecessors();
    let entry = func.entry();
    let mut candidate: Option<(BlockId, BlockId)> = None;
    for block in func.blocks() {
        if Some(block.id) == entry {
            continue;
        }
        let Some(block_preds) = preds.get(&block.id) else { continue };
        if block_preds.len() != 1 || block_preds[0] == block.id {
            continue;
        }
        let pred = block_preds[0];
        if let Some(Terminator::Br { target }) = func.block(pred).and_then(|p| p.term.as_ref()) {
            if *target == block.id {
                candidate = Some((pred, block.id));
                break;
            }
        }
    }

    let Some((pred, succ)) = candidate else {
        return false;
    };
    let Some(removed) = func.remove_block(succ) else {
        return false;
    };

    let mut replacements: Vec<(Value, Value)> = Vec::new();
    let mut moved = Vec::with_capacity(removed.instrs.len());
    for instr in removed.instrs {
        if let InstrKind::Phi { incoming, .. } = &instr.kind {
            if let Some((value, _)) = incoming.first() {
                replacements.push((Value::Inst(instr.dest), *value));
            }
            continue;
        }
        moved.push(instr);
    }
    let successors = removed.term.as_ref().map(|t| t.successors()).unwrap_or_default();
    if let Some(pred_block) = func.block_mut(pred) {
        pred_block.instrs.extend(moved);
        pred_block.term = removed.term;
    }
    for (from, to) in replacements {
        func.replace_all_uses(from, to);
    }
    for s in successors {
        func.retarget_phi_edges(s, succ, pred);
    }
    true
}
