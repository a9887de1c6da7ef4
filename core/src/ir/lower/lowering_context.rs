//! file: core/src/ir/lower/lowering_context.rs
//! description: state threaded through every lowering call.
//!
//! `CodegenContext` owns the builder (module plus cursor), the named-value
//! environment, the diagnostic sink, the optimization pipeline and the
//! options. Nothing here is global; independent contexts can lower
//! independent modules side by side.
//!
use crate::config::CodegenOptions;
use crate::diagnostics::{DiagnosticSink, LogSink};
use crate::error::{KaleidoErrorExt, LowerError, LowerErrorKind, LowerResult};
use crate::ir::builder::IrBuilder;
use crate::ir::module::IrModule;
use crate::ir::opt::PassManager;
use crate::ir::value::{BlockId, FuncId};

use super::named_values::NamedValues;

pub struct CodegenContext {
    pub(super) builder: IrBuilder,
    pub(super) named_values: NamedValues,
    pub(super) passes: PassManager,
    pub(super) options: CodegenOptions,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl Default for CodegenContext {
    fn default() -> Self {
        CodegenContext::new()
    }
}

impl CodegenContext {
    pub fn new() -> Self {
        CodegenContext::with_options(CodegenOptions::default())
    }

    pub fn with_options(options: CodegenOptions) -> Self {
        CodegenContext {
            builder: IrBuilder::new(IrModule::new()),
            named_values: NamedValues::new(),
            passes: PassManager::default_pipeline(),
            options,
            diagnostics: Box::new(LogSink),
        }
    }

    pub fn with_diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Box::new(sink);
        self
    }

    pub fn with_passes(mut self, passes: PassManager) -> Self {
        self.passes = passes;
        self
    }

    pub fn options(&self) -> &CodegenOptions {
        &self.options
    }

    pub fn module(&self) -> &IrModule {
        self.builder.module()
    }

    pub fn module_mut(&mut self) -> &mut IrModule {
        self.builder.module_mut()
    }

    pub fn into_module(self) -> IrModule {
        self.builder.into_module()
    }

    pub fn builder(&self) -> &IrBuilder {
        &self.builder
    }

    pub fn builder_mut(&mut self) -> &mut IrBuilder {
        &mut self.builder
    }

    pub fn named_values(&self) -> &NamedValues {
        &self.named_values
    }

    pub fn named_values_mut(&mut self) -> &mut NamedValues {
        &mut self.named_values
    }

    /// Write a message to the diagnostic channel.
    pub fn emit_diagnostic(&mut self, error: &dyn KaleidoErrorExt) {
        self.diagnostics.emit(error.level(), &error.issuer(), &error.message());
    }

    /// Create a lowering error and report it at the point of detection.
    pub(crate) fn fail(&mut self, kind: LowerErrorKind, message: String) -> LowerError {
        let err = LowerError::new(kind, message);
        self.emit_diagnostic(&err);
        err
    }

    /// Run a builder operation, reporting any error it returns.
    pub(crate) fn with_builder<T>(&mut self, op: impl FnOnce(&mut IrBuilder) -> LowerResult<T>) -> LowerResult<T> {
        let result = op(&mut self.builder);
        result.map_err(|err| {
            self.emit_diagnostic(&err);
            err
        })
    }

    pub(crate) fn insertion_point(&mut self) -> LowerResult<(FuncId, BlockId)> {
        match self.builder.cursor() {
            Some(cursor) => Ok((cursor.func, cursor.block)),
            None => Err(self.fail(LowerErrorKind::InvalidInsertPoint, "no insertion point is set".to_string())),
        }
    }
}
