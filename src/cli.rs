//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::compiler::CompiledStrategy;
use crate::domain::config_validation::{validate_data_config, validate_report_config};
use crate::domain::error::{CompileError, TradesigError};
use crate::domain::indicator::{IndicatorDef, IndicatorRegistry};
use crate::domain::strategy::StrategyDefinition;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(
    name = "tradesig",
    about = "Compile entry/exit trading rules into per-bar signals"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a strategy and show its parsed form and indicator schedule
    Check {
        /// INI file with a [strategy] section
        #[arg(short, long, conflicts_with = "dsl", required_unless_present = "dsl")]
        strategy: Option<PathBuf>,
        /// Plain text file holding ENTRY:/EXIT: rules
        #[arg(long)]
        dsl: Option<PathBuf>,
    },
    /// Evaluate a strategy over a CSV price file and write a signal report
    Signals {
        #[arg(short, long)]
        config: PathBuf,
        /// Separate strategy INI, overriding [strategy] in --config
        #[arg(short, long)]
        strategy: Option<PathBuf>,
        /// Price CSV, overriding [data] csv_path
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Report path, overriding [report] output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List available indicators
    Indicators,
}

pub fn run(cli: Cli) -> ExitCode {
    let registry = IndicatorRegistry::builtin();
    match cli.command {
        Command::Check { strategy, dsl } => run_check(strategy.as_ref(), dsl.as_ref(), &registry),
        Command::Signals {
            config,
            strategy,
            data,
            output,
        } => run_signals(
            &config,
            strategy.as_ref(),
            data.as_ref(),
            output.as_ref(),
            &registry,
        ),
        Command::Indicators => run_indicators(&registry),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| fail(&e))
}

fn fail(err: &TradesigError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn fail_compile(err: CompileError, source: &str) -> ExitCode {
    eprintln!("error: {}", err.display_with_context(source));
    (&TradesigError::from(err)).into()
}

/// Strategy from an INI `[strategy]` section or from a plain DSL file.
fn load_definition(
    strategy_path: Option<&PathBuf>,
    dsl_path: Option<&PathBuf>,
) -> Result<StrategyDefinition, ExitCode> {
    if let Some(path) = dsl_path {
        eprintln!("Reading rules from {}", path.display());
        let text = fs::read_to_string(path).map_err(|e| fail(&TradesigError::Io(e)))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unnamed".to_string());
        return Ok(StrategyDefinition::new(name, text));
    }

    let Some(path) = strategy_path else {
        let err = TradesigError::ConfigMissing {
            section: "strategy".into(),
            key: "rules".into(),
        };
        return Err(fail(&err));
    };
    eprintln!("Loading strategy from {}", path.display());
    let adapter = load_config(path)?;
    StrategyDefinition::from_config(&adapter).map_err(|e| fail(&e))
}

fn compile_definition(
    definition: &StrategyDefinition,
    registry: &IndicatorRegistry,
) -> Result<CompiledStrategy, ExitCode> {
    definition
        .compile(registry)
        .map_err(|e| fail_compile(e, &definition.source))
}

fn run_check(
    strategy_path: Option<&PathBuf>,
    dsl_path: Option<&PathBuf>,
    registry: &IndicatorRegistry,
) -> ExitCode {
    let definition = match load_definition(strategy_path, dsl_path) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let compiled = match compile_definition(&definition, registry) {
        Ok(c) => c,
        Err(code) => return code,
    };

    println!("Strategy: {}", definition.name);
    if !definition.description.is_empty() {
        println!("  {}", definition.description);
    }
    println!("\nRules (parsed):");
    for line in compiled.strategy.to_string().lines() {
        println!("  {}", line);
    }

    let fields: Vec<&str> = compiled
        .plan
        .fields()
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    println!("\nFields: {}", fields.join(", "));

    println!("\nIndicators to compute:");
    if compiled.plan.is_empty() {
        println!("  (none)");
    }
    for line in compiled.plan.to_string().lines() {
        println!("  {}", line);
    }

    eprintln!("\nStrategy is valid.");
    ExitCode::SUCCESS
}

fn run_signals(
    config_path: &PathBuf,
    strategy_path: Option<&PathBuf>,
    data_override: Option<&PathBuf>,
    output_override: Option<&PathBuf>,
    registry: &IndicatorRegistry,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if data_override.is_none() {
        if let Err(e) = validate_data_config(&adapter) {
            return fail(&e);
        }
    }
    if let Err(e) = validate_report_config(&adapter) {
        return fail(&e);
    }

    // Stage 2: Resolve and compile the strategy
    let definition = match strategy_path {
        Some(path) => load_definition(Some(path), None),
        None => StrategyDefinition::from_config(&adapter).map_err(|e| fail(&e)),
    };
    let definition = match definition {
        Ok(d) => d,
        Err(code) => return code,
    };
    eprintln!("Compiling strategy: {}", definition.name);
    let compiled = match compile_definition(&definition, registry) {
        Ok(c) => c,
        Err(code) => return code,
    };

    // Stage 3: Load price data
    let csv_path = match data_override {
        Some(p) => p.display().to_string(),
        None => adapter.get_string_or("data", "csv_path", ""),
    };
    let date_column = adapter.get_string_or("data", "date_column", "date");
    eprintln!("Loading prices from {}", csv_path);
    let frame = match CsvAdapter::new(date_column).load_frame(&csv_path) {
        Ok(f) => f,
        Err(e) => return fail(&e),
    };
    eprintln!("Loaded {} rows", frame.len());

    // Stage 4: Evaluate
    let signals = match compiled.evaluate(&frame, registry) {
        Ok(s) => s,
        Err(e) => return fail_compile(e, &definition.source),
    };
    eprintln!(
        "Entry signals: {}, exit signals: {}",
        signals.entry_count(),
        signals.exit_count()
    );

    // Stage 5: Write report
    let output = match output_override {
        Some(p) => p.display().to_string(),
        None => adapter.get_string_or("report", "output", "signals.csv"),
    };
    let include_indicators = adapter.get_bool("report", "include_indicators", true);
    let reporter = CsvReportAdapter::new(include_indicators);
    if let Err(e) = reporter.write(&frame, &signals, &definition, &output) {
        return fail(&e);
    }
    eprintln!("Report written to {}", output);
    ExitCode::SUCCESS
}

fn run_indicators(registry: &IndicatorRegistry) -> ExitCode {
    for def in registry.iter() {
        println!("{:<28} {}", signature(def), def.description);
    }
    ExitCode::SUCCESS
}

fn signature(def: &IndicatorDef) -> String {
    let params: Vec<String> = match def.params {
        0 => Vec::new(),
        1 => vec!["period".to_string()],
        n => (1..=n).map(|i| format!("p{}", i)).collect(),
    };
    let mut args = vec!["source".to_string()];
    args.extend(params);
    format!("{}({})", def.name, args.join(", "))
}
