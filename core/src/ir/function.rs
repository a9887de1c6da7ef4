//! file: core/src/ir/function.rs
//! description: functions and basic blocks of the SSA IR.
//!
//! A `Function` owns its blocks in append order; the first block is the
//! entry. A function without blocks is a bodiless declaration. Values are
//! numbered per function and never reused, even after instructions are
//! removed by optimization.
//!
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use super::op::{Instr, InstrKind, Terminator};
use super::value::{BlockId, FuncId, Type, Value, ValueId};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: String,
    pub instrs: Vec<Instr>,
    pub term: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(id: BlockId, label: &str) -> Self {
        BasicBlock {
            id,
            label: label.to_string(),
            instrs: Vec::new(),
            term: None,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.term.is_some()
    }

    pub fn successors(&self) -> Vec<BlockId> {
        self.term.as_ref().map(|t| t.successors()).unwrap_or_default()
    }

    /// Number of leading phi instructions.
    pub fn phi_count(&self) -> usize {
        self.instrs.iter().take_while(|i| i.kind.is_phi()).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub id: FuncId,
    pub name: String,
    pub params: Vec<String>,
    blocks: Vec<BasicBlock>,
    next_value: u32,
    next_block: u32,
}

impl Function {
    pub fn new(id: FuncId, name: &str, params: Vec<String>) -> Self {
        Function {
            id,
            name: name.to_string(),
            params,
            blocks: Vec::new(),
            next_value: 0,
            next_block: 0,
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn has_body(&self) -> bool {
        !self.blocks.is_empty()
    }

    pub fn entry(&self) -> Option<BlockId> {
        self.blocks.first().map(|b| b.id)
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<BasicBlock> {
        &mut self.blocks
    }

    pub fn block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    pub fn append_block(&mut self, label: &str) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        self.blocks.push(BasicBlock::new(id, label));
        id
    }

    pub fn remove_block(&mut self, id: BlockId) -> Option<BasicBlock> {
        let pos = self.blocks.iter().position(|b| b.id == id)?;
        Some(self.blocks.remove(pos))
    }

    pub fn fresh_value(&mut self) -> ValueId {
        let id = ValueId(self.next_value);
        self.next_value += 1;
        id
    }

    /// Drop the body, turning the function back into a declaration.
    pub fn clear_body(&mut self) {
        self.blocks.clear();
        self.next_value = 0;
        self.next_block = 0;
    }

    pub fn instr_count(&self) -> usize {
        self.blocks.iter().map(|b| b.instrs.len()).sum()
    }

    /// Location of the instruction defining `id`: its block and index.
    pub fn def_site(&self, id: ValueId) -> Option<(BlockId, usize)> {
        for block in self.blocks.iter() {
            if let Some(idx) = block.instrs.iter().position(|i| i.dest == id) {
                return Some((block.id, idx));
            }
        }
        None
    }

    pub fn instr(&self, id: ValueId) -> Option<&Instr> {
        self.blocks.iter().flat_map(|b| b.instrs.iter()).find(|i| i.dest == id)
    }

    /// Type of an operand, or `None` for an out-of-range argument or an
    /// instruction that no longer exists.
    pub fn value_type(&self, value: Value) -> Option<Type> {
        match value {
            Value::Const(_) => Some(Type::Double),
            Value::Bool(_) => Some(Type::Bool),
            Value::Arg(i) if (i as usize) < self.params.len() => Some(Type::Double),
            Value::Arg(_) => None,
            Value::Inst(id) => self.instr(id).map(|i| i.kind.ty()),
        }
    }

    pub fn predecessors(&self) -> HashMap<BlockId, Vec<BlockId>> {
        let mut preds: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
        for block in self.blocks.iter() {
            preds.entry(block.id).or_default();
        }
        for block in self.blocks.iter() {
            for succ in block.successors() {
                preds.entry(succ).or_default().push(block.id);
            }
        }
        preds
    }

    /// Replace every use of `from` (instruction operands and terminators).
    pub fn replace_all_uses(&mut self, from: Value, to: Value) {
        for block in self.blocks.iter_mut() {
            for instr in block.instrs.iter_mut() {
                for operand in instr.kind.operands_mut() {
                    if *operand == from {
                        *operand = to;
                    }
                }
            }
            if let Some(term) = block.term.as_mut() {
                for operand in term.operands_mut() {
                    if *operand == from {
                        *operand = to;
                    }
                }
            }
        }
    }

    /// Rewrite phi incoming edges in `block` that name `from` as `to`.
    pub fn retarget_phi_edges(&mut self, block: BlockId, from: BlockId, to: BlockId) {
        if let Some(b) = self.block_mut(block) {
            for instr in b.instrs.iter_mut() {
                if let InstrKind::Phi { incoming, .. } = &mut instr.kind {
                    for (_, pred) in incoming.iter_mut() {
                        if *pred == from {
                            *pred = to;
                        }
                    }
                }
            }
        }
    }

    /// Drop phi incoming entries in `block` that arrive from `pred`.
    pub fn remove_phi_edges(&mut self, block: BlockId, pred: BlockId) {
        if let Some(b) = self.block_mut(block) {
            for instr in b.instrs.iter_mut() {
                if let InstrKind::Phi { incoming, .. } = &mut instr.kind {
                    incoming.retain(|(_, p)| *p != pred);
                }
            }
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params = (0..self.params.len())
            .map(|i| format!("double %arg{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let names = self.params.join(", ");
        if !self.has_body() {
            return writeln!(f, "declare double @{}({}) ; ({})", self.name, params, names);
        }
        writeln!(f, "define double @{}({}) {{ ; ({})", self.name, params, names)?;
        for block in self.blocks.iter() {
            writeln!(f, "{}: ; {}", block.id, block.label)?;
            for instr in block.instrs.iter() {
                writeln!(f, "  {}", instr)?;
            }
            match &block.term {
                Some(term) => writeln!(f, "  {}", term)?,
                None => writeln!(f, "  <unterminated>")?,
            }
        }
        writeln!(f, "}}")
    }
}
