pub mod builder;
pub mod exec;
pub mod function;
pub mod host;
pub mod lower;
pub mod module;
pub mod op;
pub mod opt;
pub mod value;
pub mod verify;

pub use self::builder::{Cursor, IrBuilder};
pub use self::exec::Interpreter;
pub use self::function::{BasicBlock, Function};
pub use self::lower::{CodegenContext, Lowered, NamedValues, lower_expr, lower_function, lower_prototype};
pub use self::module::IrModule;
pub use self::opt::{FunctionPass, PassManager};
pub use self::value::{BlockId, FuncId, Type, Value, ValueId};
pub use self::verify::{VerifyError, verify_function, verify_module};
