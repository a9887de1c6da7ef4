/// cli/src/output.rs
/// Output utilities for the CLI
/// description: styled diagnostics, item outcomes and the module statistics
/// table printed by `build --stats`.
use std::io::{self, Write};

use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL};
use console::Style;
use kaleido_core::{DiagnosticSink, IrModule, ItemOutcome, KaleidoErrorExt, Level};
use serde::Serialize;

/// Styles for different output elements
pub struct FormatStyle {
    pub title: Style,
    pub info: Style,
    pub warning: Style,
    pub error: Style,
    pub success: Style,
}

impl Default for FormatStyle {
    fn default() -> Self {
        FormatStyle {
            title: Style::new().bold().underlined(),
            info: Style::new().cyan(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            success: Style::new().green().bold(),
        }
    }
}

/// Writes styled lines into any `Write`.
pub struct Printer<T: Write> {
    out: T,
    formatting: FormatStyle,
}

impl<T: Write> Printer<T> {
    pub fn new(out: T) -> Self {
        Printer {
            out,
            formatting: FormatStyle::default(),
        }
    }

    pub fn line(&mut self, text: &str, style: Option<&Style>) -> io::Result<()> {
        match style {
            Some(s) => writeln!(self.out, "{}", s.apply_to(text)),
            None => writeln!(self.out, "{}", text),
        }
    }

    pub fn title(&mut self, text: &str) -> io::Result<()> {
        let style = self.formatting.title.clone();
        self.line(text, Some(&style))
    }

    pub fn info(&mut self, text: &str) -> io::Result<()> {
        let style = self.formatting.info.clone();
        self.line(text, Some(&style))
    }

    pub fn success(&mut self, text: &str) -> io::Result<()> {
        let style = self.formatting.success.clone();
        self.line(text, Some(&style))
    }

    /// Write an error as `level[issuer]: message`, colored by level.
    pub fn report(&mut self, error: &dyn KaleidoErrorExt) -> io::Result<()> {
        self.diagnostic(error.level(), &error.issuer(), &error.message())
    }

    pub fn diagnostic(&mut self, level: Level, issuer: &str, message: &str) -> io::Result<()> {
        let style = match level {
            Level::Info => self.formatting.info.clone(),
            Level::Warning => self.formatting.warning.clone(),
            Level::Error | Level::Critical => self.formatting.error.clone(),
        };
        let head = format!("{}[{}]", level.to_string().to_lowercase(), issuer);
        writeln!(self.out, "{}: {}", style.apply_to(head), message)
    }

    pub fn outcome(&mut self, outcome: &ItemOutcome) -> io::Result<()> {
        match outcome {
            ItemOutcome::Evaluated { value } => writeln!(self.out, "{}", value),
            ItemOutcome::Discarded { ir } => write!(self.out, "{}", ir),
            other => self.info(&other.to_string()),
        }
    }

    pub fn write(&mut self, args: std::fmt::Arguments) -> io::Result<()> {
        write!(self.out, "{}", args)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Diagnostic sink that prints each lowering or execution failure as it is
/// detected. The CLI installs it so failures are not reported a second time.
pub struct ReportSink<T: Write> {
    printer: Printer<T>,
}

impl<T: Write> ReportSink<T> {
    pub fn new(out: T) -> Self {
        ReportSink { printer: Printer::new(out) }
    }
}

impl<T: Write> DiagnosticSink for ReportSink<T> {
    fn emit(&mut self, level: Level, issuer: &str, message: &str) {
        if let Err(err) = self.printer.diagnostic(level, issuer, message) {
            log::warn!("cannot print diagnostic: {}", err);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionStats {
    pub name: String,
    pub params: usize,
    pub blocks: usize,
    pub instructions: usize,
    pub defined: bool,
}

pub fn collect_stats(module: &IrModule) -> Vec<FunctionStats> {
    module
        .functions()
        .map(|f| FunctionStats {
            name: f.name.clone(),
            params: f.arity(),
            blocks: f.blocks().len(),
            instructions: f.instr_count(),
            defined: f.has_body(),
        })
        .collect()
}

pub fn stats_table(stats: &[FunctionStats]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["function", "params", "blocks", "instructions", "kind"]);
    for s in stats.iter() {
        table.add_row(vec![
            Cell::new(&s.name),
            Cell::new(s.params),
            Cell::new(s.blocks),
            Cell::new(s.instructions),
            Cell::new(if s.defined { "define" } else { "declare" }),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaleido_core::{Expr, FunctionDef, Prototype};
    use kaleido_core::{CodegenContext, ir::lower_function, ir::lower_prototype};

    #[test]
    fn stats_cover_every_function() {
        let mut ctx = CodegenContext::new();
        lower_prototype(&Prototype::new("sin", ["x"]), &mut ctx).unwrap();
        let def = FunctionDef::new(Prototype::new("twice", ["x"]), Expr::binary('*', Expr::variable("x"), Expr::number(2.0)));
        lower_function(&def, &mut ctx).unwrap();
        let stats = collect_stats(ctx.module());
        assert_eq!(stats.len(), 2);
        assert!(!stats[0].defined);
        assert_eq!(stats[1].instructions, 1);
        let rendered = stats_table(&stats).to_string();
        assert!(rendered.contains("twice"));
    }

    #[test]
    fn report_includes_issuer() {
        let err = kaleido_core::ExecError::new("boom");
        let mut buf = Vec::new();
        Printer::new(&mut buf).report(&err).unwrap();
        let text = console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).to_string();
        assert_eq!(text.trim(), "error[kaleido.exec]: boom");
    }

    #[test]
    fn report_sink_prints_each_diagnostic() {
        let mut buf = Vec::new();
        {
            let mut sink = ReportSink::new(&mut buf);
            sink.emit(Level::Error, "kaleido.lower", "Unknown variable name 'nope'");
        }
        let text = console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).to_string();
        assert_eq!(text.lines().collect::<Vec<_>>(), vec!["error[kaleido.lower]: Unknown variable name 'nope'"]);
    }
}
