//! file: core/src/ir/opt/const_fold.rs
//! description: constant folding optimizer pass.
//!
//! Replaces instructions whose operands are all constants with the
//! constant they compute, and phis whose incoming values all agree with
//! that value. Runs to a fixpoint since each fold can expose another.
//!
use crate::ir::function::Function;
use crate::ir::op::InstrKind;
use crate::ir::value::{Value, ValueId};

use super::FunctionPass;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConstFold;

impl FunctionPass for ConstFold {
    fn name(&self) -> &'static str {
        "const-fold"
    }

    fn run(&mut self, func: &mut Function) -> bool {
        let mut changed = false;
        while let Some((dest, value)) = find_foldable(func) {
            for block in func.blocks_mut().iter_mut() {
                block.instrs.retain(|i| i.dest != dest);
            }
            func.replace_all_uses(Value::Inst(dest), value);
            changed = true;
        }
        changed
    }
}

fn find_foldable(func: &Function) -> Option<(ValueId, Value)> {
    for block in func.blocks() {
        for instr in block.instrs.iter() {
            if let Some(v) = fold(&instr.kind, Value::Inst(instr.dest)) {
                return Some((instr.dest, v));
            }
        }
    }
    None
}

fn fold(kind: &InstrKind, this: Value) -> Option<Value> {
    match kind {
        InstrKind::Bin { op, lhs, rhs } => match (lhs, rhs) {
            (Value::Const(a), Value::Const(b)) => Some(Value::Const(op.apply(*a, *b))),
            _ => None,
        },
        InstrKind::FCmp { pred, lhs, rhs } => match (lhs, rhs) {
            (Value::Const(a), Value::Const(b)) => Some(Value::Bool(pred.evaluate(*a, *b))),
            _ => None,
        },
        InstrKind::UiToFp { src: Value::Bool(b) } => Some(Value::Const(if *b { 1.0 } else { 0.0 })),
        InstrKind::UiToFp { .. } => None,
        InstrKind::Phi { incoming, .. } => {
            // Self references carry no new value around a loop.
            let mut distinct = incoming.iter().map(|(v, _)| *v).filter(|v| *v != this);
            let first = distinct.next()?;
            if distinct.all(|v| v == first) { Some(first) } else { None }
        }
        InstrKind::Call { .. } => None,
    }
}
