pub mod ast;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod session;
pub mod source;

pub use ast::{Expr, FunctionDef, Item, Prototype};
pub use config::CodegenOptions;
pub use diagnostics::{Diagnostic, DiagnosticSink, LogSink, MemorySink};
pub use error::{ExecError, KaleidoErrorExt, Level, LowerError, LowerErrorKind, LowerResult, SessionError};
pub use ir::{CodegenContext, Interpreter, IrModule};
pub use session::{ItemOutcome, Session};
pub use source::{LoadError, load_items, parse_item, parse_items};

pub fn generate_error_report<E: KaleidoErrorExt + ?Sized>(error: &E) -> String {
    format!("KALEIDO | {} | {} | {}", error.level(), error.issuer(), error.message())
}

/// Lower a whole item list without executing anything. Stops at the first
/// failing item; earlier items stay in the module.
pub fn lower_items_to_ir(items: &[Item], options: CodegenOptions) -> Result<IrModule, SessionError> {
    let mut session = Session::new(CodegenContext::with_options(options)).with_evaluation(false);
    for item in items.iter() {
        session.handle_item(item)?;
    }
    Ok(session.into_module())
}
