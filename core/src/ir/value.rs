//! file: core/src/ir/value.rs
//! description: handles and operand values of the SSA IR.
//!
use serde::Serialize;
use std::fmt;

/// Result slot of one instruction inside a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ValueId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BlockId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FuncId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Type {
    Double,
    Bool,
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Double => write!(f, "double"),
            Type::Bool => write!(f, "i1"),
        }
    }
}

/// An operand. Constants and parameters are values without a defining
/// instruction; `Inst` refers to the result of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Value {
    Const(f64),
    Bool(bool),
    Arg(u32),
    Inst(ValueId),
}

impl Value {
    pub fn as_const(&self) -> Option<f64> {
        match self {
            Value::Const(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_inst(&self) -> Option<ValueId> {
        match self {
            Value::Inst(id) => Some(*id),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Value::Const(_) | Value::Bool(_))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Const(v) => write!(f, "{:?}", v),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Arg(i) => write!(f, "%arg{}", i),
            Value::Inst(id) => write!(f, "{}", id),
        }
    }
}
