//! file: core/src/ir/exec.rs
//! description: reference interpreter for the SSA IR.
//!
//! Executes a function block by block. Phi nodes read the value that flowed
//! in from the previously executed block, all phis of a block at once.
//! Calls recurse up to `max_depth` frames and every executed instruction
//! counts against `max_steps`.
//!
use std::collections::HashMap;

use crate::config::CodegenOptions;
use crate::error::ExecError;
use crate::ir::function::Function;
use crate::ir::module::IrModule;
use crate::ir::op::{InstrKind, Terminator};
use crate::ir::value::{BlockId, FuncId, Value, ValueId};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Slot {
    Double(f64),
    Bool(bool),
}

pub struct Interpreter<'m> {
    module: &'m IrModule,
    max_depth: usize,
    max_steps: usize,
    steps: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m IrModule) -> Self {
        let defaults = CodegenOptions::default();
        Interpreter {
            module,
            max_depth: defaults.max_call_depth,
            max_steps: defaults.max_steps,
            steps: 0,
        }
    }

    pub fn with_options(module: &'m IrModule, options: &CodegenOptions) -> Self {
        Interpreter {
            module,
            max_depth: options.max_call_depth,
            max_steps: options.max_steps,
            steps: 0,
        }
    }

    /// Instructions executed so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn call_by_name(&mut self, name: &str, args: &[f64]) -> Result<f64, ExecError> {
        let id = self
            .module
            .lookup_function(name)
            .ok_or_else(|| ExecError::new(format!("unknown function '{}'", name)))?;
        self.call(id, args)
    }

    pub fn call(&mut self, func: FuncId, args: &[f64]) -> Result<f64, ExecError> {
        self.call_at_depth(func, args, 0)
    }

    fn call_at_depth(&mut self, id: FuncId, args: &[f64], depth: usize) -> Result<f64, ExecError> {
        if depth >= self.max_depth {
            return Err(ExecError::new(format!("call depth limit of {} exceeded", self.max_depth)));
        }
        let module = self.module;
        let func = module
            .function(id)
            .ok_or_else(|| ExecError::new(format!("call to missing function {}", id)))?;
        if func.arity() != args.len() {
            return Err(ExecError::new(format!(
                "'{}' expects {} arguments, got {}",
                func.name,
                func.arity(),
                args.len()
            )));
        }
        if !func.has_body() {
            return super::host::run_host_fn(&func.name, args).map_err(ExecError::new);
        }
        self.run_body(func, args, depth)
    }

    fn run_body(&mut self, func: &Function, args: &[f64], depth: usize) -> Result<f64, ExecError> {
        let mut slots: HashMap<ValueId, Slot> = HashMap::new();
        let mut prev: Option<BlockId> = None;
        let mut current = func
            .entry()
            .ok_or_else(|| ExecError::new(format!("'{}' has no entry block", func.name)))?;

        loop {
            let block = func
                .block(current)
                .ok_or_else(|| ExecError::new(format!("'{}' jumps to missing block {}", func.name, current)))?;

            let mut phi_values = Vec::new();
            for instr in block.instrs.iter().take_while(|i| i.kind.is_phi()) {
                if let InstrKind::Phi { incoming, .. } = &instr.kind {
                    let from = prev.ok_or_else(|| ExecError::new("phi reached without a predecessor"))?;
                    let (value, _) = incoming.iter().find(|(_, b)| *b == from).ok_or_else(|| {
                        ExecError::new(format!("phi {} has no entry for {}", instr.dest, from))
                    })?;
                    phi_values.push((instr.dest, read(&slots, args, *value)?));
                }
            }
            slots.extend(phi_values);

            for instr in block.instrs.iter().skip_while(|i| i.kind.is_phi()) {
                self.tick()?;
                let result = match &instr.kind {
                    InstrKind::Bin { op, lhs, rhs } => {
                        Slot::Double(op.apply(read_f64(&slots, args, *lhs)?, read_f64(&slots, args, *rhs)?))
                    }
                    InstrKind::FCmp { pred, lhs, rhs } => {
                        Slot::Bool(pred.evaluate(read_f64(&slots, args, *lhs)?, read_f64(&slots, args, *rhs)?))
                    }
                    InstrKind::UiToFp { src } => {
                        Slot::Double(if read_bool(&slots, args, *src)? { 1.0 } else { 0.0 })
                    }
                    InstrKind::Call { callee, args: call_args, .. } => {
                        let mut values = Vec::with_capacity(call_args.len());
                        for a in call_args.iter() {
                            values.push(read_f64(&slots, args, *a)?);
                        }
                        Slot::Double(self.call_at_depth(*callee, &values, depth + 1)?)
                    }
                    InstrKind::Phi { .. } => {
                        return Err(ExecError::new(format!("phi {} after non-phi instructions", instr.dest)));
                    }
                };
                slots.insert(instr.dest, result);
            }

            self.tick()?;
            match &block.term {
                Some(Terminator::Br { target }) => {
                    prev = Some(current);
                    current = *target;
                }
                Some(Terminator::CondBr { cond, then_block, else_block }) => {
                    prev = Some(current);
                    current = if read_bool(&slots, args, *cond)? { *then_block } else { *else_block };
                }
                Some(Terminator::Ret { value }) => return read_f64(&slots, args, *value),
                None => {
                    return Err(ExecError::new(format!(
                        "block {} of '{}' has no terminator",
                        block.id, func.name
                    )));
                }
            }
        }
    }

    fn tick(&mut self) -> Result<(), ExecError> {
        self.steps += 1;
        if self.steps > self.max_steps {
            return Err(ExecError::new(format!("step limit of {} exceeded", self.max_steps)));
        }
        Ok(())
    }
}

fn read(slots: &HashMap<ValueId, Slot>, args: &[f64], value: Value) -> Result<Slot, ExecError> {
    match value {
        Value::Const(v) => Ok(Slot::Double(v)),
        Value::Bool(b) => Ok(Slot::Bool(b)),
        Value::Arg(i) => args
            .get(i as usize)
            .map(|v| Slot::Double(*v))
            .ok_or_else(|| ExecError::new(format!("argument {} out of range", i))),
        Value::Inst(id) => slots
            .get(&id)
            .copied()
            .ok_or_else(|| ExecError::new(format!("value {} read before it was computed", id))),
    }
}

fn read_f64(slots: &HashMap<ValueId, Slot>, args: &[f64], value: Value) -> Result<f64, ExecError> {
    match read(slots, args, value)? {
        Slot::Double(v) => Ok(v),
        Slot::Bool(_) => Err(ExecError::new(format!("expected a double for {}", value))),
    }
}

fn read_bool(slots: &HashMap<ValueId, Slot>, args: &[f64], value: Value) -> Result<bool, ExecError> {
    match read(slots, args, value)? {
        Slot::Bool(b) => Ok(b),
        Slot::Double(_) => Err(ExecError::new(format!("expected a boolean for {}", value))),
    }
}
