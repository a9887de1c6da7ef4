//! file: core/src/ir/verify.rs
//! description: structural validation of finished functions.
//!
//! Checks terminators, branch targets, phi placement and edges, operand
//! types, call arity, and that every instruction result is dominated by its
//! definition. All problems are collected rather than stopping at the first.
//!
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::ir::function::Function;
use crate::ir::module::IrModule;
use crate::ir::op::{InstrKind, Terminator};
use crate::ir::value::{BlockId, Type, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyError {
    pub function: String,
    pub problems: Vec<String>,
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function '{}' is malformed: {}", self.function, self.problems.join("; "))
    }
}

impl std::error::Error for VerifyError {}

pub fn verify_module(module: &IrModule) -> Result<(), Vec<VerifyError>> {
    let errors: Vec<VerifyError> = module
        .functions()
        .filter_map(|f| verify_function(module, f).err())
        .collect();
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

pub fn verify_function(module: &IrModule, func: &Function) -> Result<(), VerifyError> {
    let mut problems: Vec<String> = Vec::new();
    if !func.has_body() {
        return Ok(());
    }

    let block_ids: HashSet<BlockId> = func.blocks().iter().map(|b| b.id).collect();
    let preds = func.predecessors();

    if let Some(entry) = func.entry() {
        if preds.get(&entry).is_some_and(|p| !p.is_empty()) {
            problems.push(format!("entry block {} has predecessors", entry));
        }
    }

    let mut defined = HashSet::new();
    for block in func.blocks() {
        for instr in block.instrs.iter() {
            if !defined.insert(instr.dest) {
                problems.push(format!("value {} is defined more than once", instr.dest));
            }
        }
    }

    let expect = |problems: &mut Vec<String>, value: Value, ty: Type, what: &str| match func.value_type(value) {
        Some(actual) if actual == ty => {}
        Some(actual) => problems.push(format!("{} {} has type {}, expected {}", what, value, actual, ty)),
        None => problems.push(format!("{} {} is not defined", what, value)),
    };

    for block in func.blocks() {
        let Some(term) = &block.term else {
            problems.push(format!("block {} ({}) has no terminator", block.id, block.label));
            continue;
        };
        for succ in term.successors() {
            if !block_ids.contains(&succ) {
                problems.push(format!("block {} branches to missing block {}", block.id, succ));
            }
        }
        match term {
            Terminator::Br { .. } => {}
            Terminator::CondBr { cond, .. } => expect(&mut problems, *cond, Type::Bool, "branch condition"),
            Terminator::Ret { value } => expect(&mut problems, *value, Type::Double, "return value"),
        }

        let phi_count = block.phi_count();
        let block_preds = preds.get(&block.id).cloned().unwrap_or_default();
        for (idx, instr) in block.instrs.iter().enumerate() {
            match &instr.kind {
                InstrKind::Phi { ty, incoming } => {
                    if idx >= phi_count {
                        problems.push(format!("phi {} is not at the start of {}", instr.dest, block.id));
                    }
                    let mut seen: Vec<BlockId> = Vec::new();
                    for (value, pred) in incoming.iter() {
                        expect(&mut problems, *value, *ty, "phi operand");
                        if !block_preds.contains(pred) {
                            problems.push(format!("phi {} names {} which is not a predecessor of {}", instr.dest, pred, block.id));
                        }
                        seen.push(*pred);
                    }
                    for pred in block_preds.iter() {
                        if !seen.contains(pred) {
                            problems.push(format!("phi {} has no entry for predecessor {}", instr.dest, pred));
                        }
                    }
                }
                InstrKind::Bin { lhs, rhs, .. } | InstrKind::FCmp { lhs, rhs, .. } => {
                    expect(&mut problems, *lhs, Type::Double, "operand");
                    expect(&mut problems, *rhs, Type::Double, "operand");
                }
                InstrKind::UiToFp { src } => expect(&mut problems, *src, Type::Bool, "operand"),
                InstrKind::Call { callee, name, args } => {
                    match module.function(*callee) {
                        Some(target) if target.arity() != args.len() => problems.push(format!(
                            "call to '{}' passes {} arguments, expected {}",
                            name,
                            args.len(),
                            target.arity()
                        )),
                        Some(_) => {}
                        None => problems.push(format!("call to missing function '{}'", name)),
                    }
                    for arg in args.iter() {
                        expect(&mut problems, *arg, Type::Double, "call argument");
                    }
                }
            }
        }
    }

    check_dominance(func, &mut problems);

    if problems.is_empty() {
        Ok(())
    } else {
        Err(VerifyError {
            function: func.name.clone(),
            problems,
        })
    }
}

/// Iterative dominator sets over the blocks reachable from entry.
pub fn dominators(func: &Function) -> HashMap<BlockId, HashSet<BlockId>> {
    let mut doms: HashMap<BlockId, HashSet<BlockId>> = HashMap::new();
    let Some(entry) = func.entry() else {
        return doms;
    };
    let reachable = reachable_blocks(func);
    let preds = func.predecessors();
    let order: Vec<BlockId> = func
        .blocks()
        .iter()
        .map(|b| b.id)
        .filter(|id| reachable.contains(id))
        .collect();

    for id in order.iter() {
        if *id == entry {
            doms.insert(*id, HashSet::from([entry]));
        } else {
            doms.insert(*id, reachable.clone());
        }
    }

    let mut changed = true;
    while changed {
        changed = false;
        for id in order.iter().filter(|id| **id != entry) {
            let mut new_set: Option<HashSet<BlockId>> = None;
            for pred in preds.get(id).into_iter().flatten() {
                let Some(pred_doms) = doms.get(pred) else { continue };
                new_set = Some(match new_set {
                    None => pred_doms.clone(),
                    Some(acc) => acc.intersection(pred_doms).copied().collect(),
                });
            }
            let mut new_set = new_set.unwrap_or_default();
            new_set.insert(*id);
            if doms.get(id) != Some(&new_set) {
                doms.insert(*id, new_set);
                changed = true;
            }
        }
    }
    doms
}

pub fn reachable_blocks(func: &Function) -> HashSet<BlockId> {
    let mut seen = HashSet::new();
    let Some(entry) = func.entry() else {
        return seen;
    };
    let mut stack = vec![entry];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(block) = func.block(id) {
            stack.extend(block.successors());
        }
    }
    seen
}

fn check_dominance(func: &Function, problems: &mut Vec<String>) {
    let doms = dominators(func);
    let dominates = |def_block: BlockId, use_block: BlockId| {
        doms.get(&use_block).is_some_and(|set| set.contains(&def_block))
    };

    for block in func.blocks() {
        if !doms.contains_key(&block.id) {
            continue;
        }
        for (idx, instr) in block.instrs.iter().enumerate() {
            if let InstrKind::Phi { incoming, .. } = &instr.kind {
                for (value, pred) in incoming.iter() {
                    let Some(id) = value.as_inst() else { continue };
                    if let Some((def_block, _)) = func.def_site(id) {
                        if doms.contains_key(pred) && !dominates(def_block, *pred) {
                            problems.push(format!("phi {} uses {} which does not dominate {}", instr.dest, id, pred));
                        }
                    }
                }
                continue;
            }
            for operand in instr.kind.operands() {
                let Some(id) = operand.as_inst() else { continue };
                match func.def_site(id) {
                    Some((def_block, def_idx)) if def_block == block.id => {
                        if def_idx >= idx {
                            problems.push(format!("{} is used by {} before it is defined", id, instr.dest));
                        }
                    }
                    Some((def_block, _)) => {
                        if !dominates(def_block, block.id) {
                            problems.push(format!("{} does not dominate its use in {}", id, instr.dest));
                        }
                    }
                    None => {}
                }
            }
        }
        if let Some(term) = &block.term {
            for operand in term.operands() {
                let Some(id) = operand.as_inst() else { continue };
                if let Some((def_block, _)) = func.def_site(id) {
                    if !dominates(def_block, block.id) {
                        problems.push(format!("{} does not dominate the terminator of {}", id, block.id));
                    }
                }
            }
        }
    }
}
