use serde::Serialize;

use super::value::{BlockId, FuncId, Type, Value, ValueId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
}

impl BinOpKind {
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinOpKind::Add => a + b,
            BinOpKind::Sub => a - b,
            BinOpKind::Mul => a * b,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            BinOpKind::Add => "fadd",
            BinOpKind::Sub => "fsub",
            BinOpKind::Mul => "fmul",
        }
    }
}

/// Floating-point comparison predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CmpPred {
    /// Unordered or less than.
    Ult,
    /// Ordered and not equal.
    One,
}

impl CmpPred {
    pub fn evaluate(&self, a: f64, b: f64) -> bool {
        let unordered = a.is_nan() || b.is_nan();
        match self {
            CmpPred::Ult => unordered || a < b,
            CmpPred::One => !unordered && a != b,
        }
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            CmpPred::Ult => "ult",
            CmpPred::One => "one",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InstrKind {
    Bin { op: BinOpKind, lhs: Value, rhs: Value },
    FCmp { pred: CmpPred, lhs: Value, rhs: Value },
    UiToFp { src: Value },
    Call { callee: FuncId, name: String, args: Vec<Value> },
    Phi { ty: Type, incoming: Vec<(Value, BlockId)> },
}

impl InstrKind {
    pub fn ty(&self) -> Type {
        match self {
            InstrKind::FCmp { .. } => Type::Bool,
            InstrKind::Phi { ty, .. } => *ty,
            InstrKind::Bin { .. } | InstrKind::UiToFp { .. } | InstrKind::Call { .. } => Type::Double,
        }
    }

    pub fn operands(&self) -> Vec<Value> {
        match self {
            InstrKind::Bin { lhs, rhs, .. } | InstrKind::FCmp { lhs, rhs, .. } => vec![*lhs, *rhs],
            InstrKind::UiToFp { src } => vec![*src],
            InstrKind::Call { args, .. } => args.clone(),
            InstrKind::Phi { incoming, .. } => incoming.iter().map(|(v, _)| *v).collect(),
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match self {
            InstrKind::Bin { lhs, rhs, .. } | InstrKind::FCmp { lhs, rhs, .. } => vec![lhs, rhs],
            InstrKind::UiToFp { src } => vec![src],
            InstrKind::Call { args, .. } => args.iter_mut().collect(),
            InstrKind::Phi { incoming, .. } => incoming.iter_mut().map(|(v, _)| v).collect(),
        }
    }

    /// Pure instructions may be removed when their result is unused.
    pub fn is_pure(&self) -> bool {
        !matches!(self, InstrKind::Call { .. })
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, InstrKind::Phi { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instr {
    pub dest: ValueId,
    pub kind: InstrKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Terminator {
    Br { target: BlockId },
    CondBr { cond: Value, then_block: BlockId, else_block: BlockId },
    Ret { value: Value },
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Br { target } => vec![*target],
            Terminator::CondBr { then_block, else_block, .. } => {
                if then_block == else_block {
                    vec![*then_block]
                } else {
                    vec![*then_block, *else_block]
                }
            }
            Terminator::Ret { .. } => Vec::new(),
        }
    }

    pub fn operands(&self) -> Vec<Value> {
        match self {
            Terminator::Br { .. } => Vec::new(),
            Terminator::CondBr { cond, .. } => vec![*cond],
            Terminator::Ret { value } => vec![*value],
        }
    }

    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match self {
            Terminator::Br { .. } => Vec::new(),
            Terminator::CondBr { cond, .. } => vec![cond],
            Terminator::Ret { value } => vec![value],
        }
    }
}

fn join_values(values: &[Value]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

impl std::fmt::Display for Instr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            InstrKind::Bin { op, lhs, rhs } => {
                write!(f, "{} = {} double {}, {}", self.dest, op.mnemonic(), lhs, rhs)
            }
            InstrKind::FCmp { pred, lhs, rhs } => {
                write!(f, "{} = fcmp {} double {}, {}", self.dest, pred.mnemonic(), lhs, rhs)
            }
            InstrKind::UiToFp { src } => write!(f, "{} = uitofp i1 {} to double", self.dest, src),
            InstrKind::Call { name, args, .. } => {
                write!(f, "{} = call double @{}({})", self.dest, name, join_values(args))
            }
            InstrKind::Phi { ty, incoming } => {
                write!(f, "{} = phi {} ", self.dest, ty)?;
                for (i, (value, block)) in incoming.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "[ {}, {} ]", value, block)?;
                }
                Ok(())
            }
        }
    }
}

impl std::fmt::Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminator::Br { target } => write!(f, "br {}", target),
            Terminator::CondBr { cond, then_block, else_block } => {
                write!(f, "br i1 {}, {}, {}", cond, then_block, else_block)
            }
            Terminator::Ret { value } => write!(f, "ret double {}", value),
        }
    }
}
