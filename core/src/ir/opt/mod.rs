//! IR optimizer module: per-function passes and the pipeline that runs them.
use crate::ir::function::Function;

mod const_fold;
mod dce;
mod simplify_cfg;

pub use const_fold::ConstFold;
pub use dce::DeadCodeElim;
pub use simplify_cfg::SimplifyCfg;

/// A transformation over one function. Returns whether anything changed.
pub trait FunctionPass {
    fn name(&self) -> &'static str;
    fn run(&mut self, func: &mut Function) -> bool;
}

/// Ordered list of passes run over each successfully lowered function.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn FunctionPass>>,
}

impl PassManager {
    pub fn new() -> Self {
        PassManager::default()
    }

    /// Fold constants, simplify the CFG, fold again over the merged
    /// blocks, then drop dead instructions.
    pub fn default_pipeline() -> Self {
        PassManager::new()
            .with(ConstFold)
            .with(SimplifyCfg)
            .with(ConstFold)
            .with(DeadCodeElim)
    }

    pub fn with(mut self, pass: impl FunctionPass + 'static) -> Self {
        self.add(pass);
        self
    }

    pub fn add(&mut self, pass: impl FunctionPass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn run(&mut self, func: &mut Function) -> bool {
        let mut changed = false;
        for pass in self.passes.iter_mut() {
            let pass_changed = pass.run(func);
            log::debug!("pass '{}' on '{}': changed={}", pass.name(), func.name, pass_changed);
            changed |= pass_changed;
        }
        changed
    }
}

impl std::fmt::Debug for PassManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassManager").field("passes", &self.names()).finish()
    }
}
