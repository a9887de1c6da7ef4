//! file: core/src/ir/builder.rs
//! description: instruction builder with an insertion cursor.
//!
//! `IrBuilder` owns the `IrModule` and a cursor naming the block that new
//! instructions are appended to. Lowering moves the cursor freely; callers
//! must not assume it is unchanged after lowering a child expression.
//!
use crate::error::{LowerError, LowerErrorKind, LowerResult};
use crate::ir::function::Function;
use crate::ir::module::IrModule;
use crate::ir::op::{BinOpKind, CmpPred, Instr, InstrKind, Terminator};
use crate::ir::value::{BlockId, FuncId, Type, Value};

/// Current insertion point: the end of `block` in `func`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub func: FuncId,
    pub block: BlockId,
}

#[derive(Debug, Default)]
pub struct IrBuilder {
    module: IrModule,
    cursor: Option<Cursor>,
}

fn insert_point_error(message: String) -> LowerError {
    LowerError::new(LowerErrorKind::InvalidInsertPoint, message)
}

impl IrBuilder {
    pub fn new(module: IrModule) -> Self {
        IrBuilder { module, cursor: None }
    }

    pub fn module(&self) -> &IrModule {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut IrModule {
        &mut self.module
    }

    pub fn into_module(self) -> IrModule {
        self.module
    }

    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    pub fn insert_block(&self) -> Option<BlockId> {
        self.cursor.map(|c| c.block)
    }

    pub fn position_at_end(&mut self, func: FuncId, block: BlockId) {
        self.cursor = Some(Cursor { func, block });
    }

    pub fn clear_cursor(&mut self) {
        self.cursor = None;
    }

    pub fn const_f64(&self, value: f64) -> Value {
        Value::Const(value)
    }

    pub fn append_basic_block(&mut self, func: FuncId, label: &str) -> LowerResult<BlockId> {
        let f = self
            .module
            .function_mut(func)
            .ok_or_else(|| insert_point_error(format!("cannot append block to missing function {}", func)))?;
        let id = f.append_block(label);
        log::trace!("appended block {} ({}) to '{}'", id, label, f.name);
        Ok(id)
    }

    fn current_function_mut(&mut self) -> LowerResult<(&mut Function, BlockId)> {
        let cursor = self
            .cursor
            .ok_or_else(|| insert_point_error("no insertion point is set".to_string()))?;
        let func = self
            .module
            .function_mut(cursor.func)
            .ok_or_else(|| insert_point_error(format!("insertion function {} does not exist", cursor.func)))?;
        Ok((func, cursor.block))
    }

    /// Append an instruction at the cursor. Phi nodes go after the block's
    /// existing phis so they stay grouped at the block start.
    fn push(&mut self, kind: InstrKind) -> LowerResult<Value> {
        let (func, block_id) = self.current_function_mut()?;
        let dest = func.fresh_value();
        let block = func
            .block_mut(block_id)
            .ok_or_else(|| insert_point_error(format!("insertion block {} does not exist", block_id)))?;
        if block.is_terminated() {
            return Err(insert_point_error(format!(
                "block {} ({}) is already terminated",
                block.id, block.label
            )));
        }
        if kind.is_phi() {
            let at = block.phi_count();
            block.instrs.insert(at, Instr { dest, kind });
        } else {
            block.instrs.push(Instr { dest, kind });
        }
        Ok(Value::Inst(dest))
    }

    fn terminate(&mut self, term: Terminator) -> LowerResult<()> {
        let (func, block_id) = self.current_function_mut()?;
        let block = func
            .block_mut(block_id)
            .ok_or_else(|| insert_point_error(format!("insertion block {} does not exist", block_id)))?;
        if block.is_terminated() {
            return Err(insert_point_error(format!(
                "block {} ({}) is already terminated",
                block.id, block.label
            )));
        }
        block.term = Some(term);
        Ok(())
    }

    pub fn build_binop(&mut self, op: BinOpKind, lhs: Value, rhs: Value) -> LowerResult<Value> {
        self.push(InstrKind::Bin { op, lhs, rhs })
    }

    pub fn build_fcmp(&mut self, pred: CmpPred, lhs: Value, rhs: Value) -> LowerResult<Value> {
        self.push(InstrKind::FCmp { pred, lhs, rhs })
    }

    pub fn build_uitofp(&mut self, src: Value) -> LowerResult<Value> {
        self.push(InstrKind::UiToFp { src })
    }

    /// `lhs < rhs` as a double: 1.0 when true, 0.0 otherwise.
    pub fn build_compare_and_promote(&mut self, lhs: Value, rhs: Value) -> LowerResult<Value> {
        let flag = self.build_fcmp(CmpPred::Ult, lhs, rhs)?;
        self.build_uitofp(flag)
    }

    pub fn build_call(&mut self, callee: FuncId, args: Vec<Value>) -> LowerResult<Value> {
        let name = self
            .module
            .function(callee)
            .map(|f| f.name.clone())
            .ok_or_else(|| insert_point_error(format!("call to missing function {}", callee)))?;
        self.push(InstrKind::Call { callee, name, args })
    }

    pub fn build_phi(&mut self, ty: Type, incoming: Vec<(Value, BlockId)>) -> LowerResult<Value> {
        self.push(InstrKind::Phi { ty, incoming })
    }

    pub fn build_br(&mut self, target: BlockId) -> LowerResult<()> {
        self.terminate(Terminator::Br { target })
    }

    pub fn build_cond_br(&mut self, cond: Value, then_block: BlockId, else_block: BlockId) -> LowerResult<()> {
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        })
    }

    pub fn build_ret(&mut self, value: Value) -> LowerResult<()> {
        self.terminate(Terminator::Ret { value })
    }
}
