use serde::{Deserialize, Serialize};
use std::fmt;

use super::expr::Expr;

/// A function signature: a name and its ordered parameter names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prototype {
    pub name: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl Prototype {
    pub fn new<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Prototype {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl fmt::Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub proto: Prototype,
    pub body: Expr,
}

impl FunctionDef {
    pub fn new(proto: Prototype, body: Expr) -> Self {
        FunctionDef { proto, body }
    }
}

impl fmt::Display for FunctionDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "def {} = {}", self.proto, self.body)
    }
}

/// One unit of top-level input, as a REPL driver would receive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum Item {
    Function(FunctionDef),
    Extern(Prototype),
    Expr(Expr),
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Function(def) => write!(f, "{}", def),
            Item::Extern(proto) => write!(f, "extern {}", proto),
            Item::Expr(expr) => write!(f, "{}", expr),
        }
    }
}
