use clap::{Arg, ArgAction, ArgMatches, Command};
use kaleido_core::ir::lower::declare_host_functions;
use kaleido_core::{CodegenContext, CodegenOptions, ItemOutcome, KaleidoErrorExt, Level, Session, load_items, parse_item};
use std::io::{self, BufRead};
use std::path::PathBuf;

mod output;

use output::{Printer, ReportSink, collect_stats, stats_table};

fn main() {
    let cli = Command::new("kaleido")
        .version("0.1.0")
        .about("Lower Kaleidoscope ASTs to SSA IR and evaluate them");

    let cli = setup_cli(cli);
    let matches = cli.get_matches();
    init_logging(matches.get_count("verbose"));

    let mut stderr = Printer::new(io::stderr());
    if let Err(err) = dispatch_commands(&matches) {
        let _ = stderr.report(err.as_ref());
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .init();
}

/// Sets up the CLI with subcommands and arguments.
fn setup_cli(cli: Command) -> Command {
    cli.arg(
        Arg::new("verbose")
            .help("Increase log output (repeatable)")
            .short('v')
            .long("verbose")
            .action(ArgAction::Count)
            .global(true),
    )
    .arg(
        Arg::new("config")
            .help("JSON file with codegen options")
            .long("config")
            .value_parser(clap::value_parser!(PathBuf))
            .value_name("FILE")
            .global(true),
    )
    .subcommand(
        Command::new("build")
            .about("Lower a JSON item file and print the module")
            .arg(
                Arg::new("file")
                    .help("The item file to lower")
                    .required(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .index(1),
            )
            .arg(
                Arg::new("emit")
                    .help("Output format")
                    .long("emit")
                    .value_parser(["ir", "json"])
                    .default_value("ir")
                    .value_name("FORMAT"),
            )
            .arg(
                Arg::new("output")
                    .help("Specify the output file")
                    .short('o')
                    .long("output")
                    .value_parser(clap::value_parser!(PathBuf))
                    .value_name("FILE"),
            )
            .arg(
                Arg::new("no-opt")
                    .help("Skip the optimization pipeline")
                    .long("no-opt")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("no-verify")
                    .help("Skip structural verification")
                    .long("no-verify")
                    .action(ArgAction::SetTrue),
            )
            .arg(
                Arg::new("stats")
                    .help("Print a per-function summary")
                    .long("stats")
                    .action(ArgAction::SetTrue),
            ),
    )
    .subcommand(
        Command::new("run")
            .about("Lower a JSON item file and evaluate its top-level expressions")
            .arg(
                Arg::new("file")
                    .help("The item file to run")
                    .required(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .index(1),
            )
            .arg(
                Arg::new("no-opt")
                    .help("Skip the optimization pipeline")
                    .long("no-opt")
                    .action(ArgAction::SetTrue),
            ),
    )
    .subcommand(Command::new("repl").about("Read one JSON item per line from stdin"))
}

#[derive(Debug)]
struct CliError {
    message: String,
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl KaleidoErrorExt for CliError {
    fn level(&self) -> Level {
        Level::Error
    }

    fn message(&self) -> String {
        self.message.clone()
    }

    fn issuer(&self) -> String {
        "kaleido.cli".to_string()
    }
}

type CliResult = Result<(), Box<dyn KaleidoErrorExt>>;

fn cli_error(message: impl Into<String>) -> Box<dyn KaleidoErrorExt> {
    Box::new(CliError { message: message.into() })
}

fn load_options(matches: &ArgMatches) -> Result<CodegenOptions, Box<dyn KaleidoErrorExt>> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => CodegenOptions::load(path).map_err(|e| Box::new(e) as Box<dyn KaleidoErrorExt>),
        None => Ok(CodegenOptions::default()),
    }
}

/// Dispatches the command based on the parsed arguments.
fn dispatch_commands(matches: &ArgMatches) -> CliResult {
    let options = load_options(matches)?;
    match matches.subcommand() {
        Some(("build", sub_m)) => build(sub_m, options),
        Some(("run", sub_m)) => run(sub_m, options),
        Some(("repl", _)) => repl(options),
        _ => Err(cli_error("no valid subcommand was used, see --help")),
    }
}

fn build(sub_m: &ArgMatches, mut options: CodegenOptions) -> CliResult {
    let file = sub_m
        .get_one::<PathBuf>("file")
        .ok_or_else(|| cli_error("missing input file"))?;
    if sub_m.get_flag("no-opt") {
        options = options.with_optimize(false);
    }
    if sub_m.get_flag("no-verify") {
        options = options.with_verify(false);
    }
    let items = load_items(file).map_err(|e| Box::new(e) as Box<dyn KaleidoErrorExt>)?;

    let mut session = Session::new(codegen_context(options)).with_evaluation(false);
    let failures = session.handle_items(&items).iter().filter(|r| r.is_err()).count();
    let module = session.into_module();

    let emit = sub_m.get_one::<String>("emit").map(|s| s.as_str()).unwrap_or("ir");
    let text = match emit {
        "json" => {
            serde_json::to_string_pretty(&module).map_err(|e| cli_error(format!("cannot serialize module: {}", e)))?
        }
        _ => module.to_string(),
    };

    let mut stdout = Printer::new(io::stdout());
    match sub_m.get_one::<PathBuf>("output") {
        Some(path) => {
            std::fs::write(path, &text).map_err(|e| cli_error(format!("cannot write {:?}: {}", path, e)))?;
            stdout
                .success(&format!("wrote {}", path.display()))
                .map_err(|e| cli_error(e.to_string()))?;
        }
        None => stdout
            .write(format_args!("{}", text))
            .map_err(|e| cli_error(e.to_string()))?,
    }

    if sub_m.get_flag("stats") {
        let stats = collect_stats(&module);
        if emit == "json" {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| cli_error(format!("cannot serialize stats: {}", e)))?;
            stdout.write(format_args!("{}\n", json)).map_err(|e| cli_error(e.to_string()))?;
        } else {
            stdout.title("functions").map_err(|e| cli_error(e.to_string()))?;
            stdout
                .write(format_args!("{}\n", stats_table(&stats)))
                .map_err(|e| cli_error(e.to_string()))?;
        }
    }

    if failures > 0 {
        return Err(cli_error(format!("{} item(s) failed to lower", failures)));
    }
    Ok(())
}

fn run(sub_m: &ArgMatches, mut options: CodegenOptions) -> CliResult {
    let file = sub_m
        .get_one::<PathBuf>("file")
        .ok_or_else(|| cli_error("missing input file"))?;
    if sub_m.get_flag("no-opt") {
        options = options.with_optimize(false);
    }
    let items = load_items(file).map_err(|e| Box::new(e) as Box<dyn KaleidoErrorExt>)?;

    let mut ctx = codegen_context(options);
    declare_host_functions(&mut ctx);
    let mut session = Session::new(ctx);

    let mut stdout = Printer::new(io::stdout());
    let mut failures = 0;
    for item in items.iter() {
        match session.handle_item(item) {
            Ok(outcome @ ItemOutcome::Evaluated { .. }) => {
                stdout.outcome(&outcome).map_err(|e| cli_error(e.to_string()))?;
            }
            Ok(other) => log::info!("{}", other),
            Err(_) => failures += 1,
        }
    }

    if failures > 0 {
        return Err(cli_error(format!("{} item(s) failed", failures)));
    }
    Ok(())
}

fn repl(options: CodegenOptions) -> CliResult {
    let mut ctx = codegen_context(options);
    declare_host_functions(&mut ctx);
    let mut session = Session::new(ctx);

    let mut stdout = Printer::new(io::stdout());
    let mut stderr = Printer::new(io::stderr());
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|e| cli_error(format!("cannot read stdin: {}", e)))?;
        if line.trim().is_empty() {
            continue;
        }
        let item = match parse_item(&line) {
            Ok(item) => item,
            Err(err) => {
                let _ = stderr.report(&err);
                continue;
            }
        };
        // Failures were printed by the context's sink when detected.
        if let Ok(outcome) = session.handle_item(&item) {
            stdout.outcome(&outcome).map_err(|e| cli_error(e.to_string()))?;
        }
        let _ = stdout.flush();
    }
    Ok(())
}

/// Lowering context whose diagnostics are printed to stderr as they occur.
fn codegen_context(options: CodegenOptions) -> CodegenContext {
    CodegenContext::with_options(options).with_diagnostics(ReportSink::new(io::stderr()))
}
