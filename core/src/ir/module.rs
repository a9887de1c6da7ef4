use crate::ir::function::Function;
use crate::ir::value::FuncId;
use serde::Serialize;
use std::collections::HashMap;

/// The module-wide function table. Declarations persist across lowering
/// calls so later functions can call earlier (or forward-declared) ones.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IrModule {
    functions: Vec<Function>,
    #[serde(skip)]
    by_name: HashMap<String, FuncId>,
    #[serde(skip)]
    next_id: u32,
}

impl IrModule {
    pub fn new() -> Self {
        IrModule::default()
    }

    /// Declare a bodiless function. Returns `None` when the name is already
    /// taken; callers resolve redeclarations through `lookup_function` first.
    pub fn declare_function(&mut self, name: &str, params: Vec<String>) -> Option<FuncId> {
        if self.by_name.contains_key(name) {
            return None;
        }
        let id = FuncId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.functions.push(Function::new(id, name, params));
        self.by_name.insert(name.to_string(), id);
        log::trace!("declared function '{}' as {}", name, id);
        Some(id)
    }

    pub fn lookup_function(&self, name: &str) -> Option<FuncId> {
        self.by_name.get(name).copied()
    }

    pub fn function(&self, id: FuncId) -> Option<&Function> {
        self.functions.iter().find(|f| f.id == id)
    }

    pub fn function_mut(&mut self, id: FuncId) -> Option<&mut Function> {
        self.functions.iter_mut().find(|f| f.id == id)
    }

    pub fn function_by_name(&self, name: &str) -> Option<&Function> {
        self.lookup_function(name).and_then(|id| self.function(id))
    }

    /// Remove a function and free its name.
    pub fn delete_function(&mut self, id: FuncId) -> Option<Function> {
        let pos = self.functions.iter().position(|f| f.id == id)?;
        let func = self.functions.remove(pos);
        self.by_name.remove(&func.name);
        log::trace!("deleted function '{}' ({})", func.name, id);
        Some(func)
    }

    /// Functions in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl std::fmt::Display for IrModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, func) in self.functions.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", func)?;
        }
        Ok(())
    }
}
