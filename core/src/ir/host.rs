//! file: core/src/ir/host.rs
//! description: built-in host functions for bodiless declarations.
//!
//! An `extern` declaration with no body resolves to one of these when the
//! interpreter calls it. Output helpers write to stderr and return 0.0.
//!
use std::io::Write;

/// Host functions and their arities.
pub const HOST_FUNCTIONS: &[(&str, usize)] = &[("sin", 1), ("cos", 1), ("sqrt", 1), ("putchard", 1), ("printd", 1)];

pub(crate) fn run_host_fn(name: &str, args: &[f64]) -> Result<f64, String> {
    let arg = |i: usize| {
        args.get(i)
            .copied()
            .ok_or_else(|| format!("host function '{}' expects argument {}", name, i))
    };
    match name {
        "sin" => Ok(arg(0)?.sin()),
        "cos" => Ok(arg(0)?.cos()),
        "sqrt" => Ok(arg(0)?.sqrt()),
        "putchard" => {
            let byte = arg(0)? as u8;
            let mut err = std::io::stderr();
            err.write_all(&[byte]).map_err(|e| e.to_string())?;
            Ok(0.0)
        }
        "printd" => {
            eprintln!("{:.6}", arg(0)?);
            Ok(0.0)
        }
        _ => Err(format!("no host implementation for external function '{}'", name)),
    }
}
