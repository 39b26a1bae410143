//! fd-core: fault simulation, diagnosis and sensitivity CLI.
//!
//! Payloads go to stdout in the `--format` requested; logs and errors go to
//! stderr. The process exit code is one of [`ExitCode`].

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use fd_common::{format_error_human, Error, OutputFormat, StructuredError};
use fd_config::{ConfigSource, DiagnosisSettings, SensitivityMetricKind};
use fd_core::analysis::{analyze, SensitivityConfig};
use fd_core::exit_codes::ExitCode;
use fd_core::inference::diagnose;
use fd_core::logging::{
    event_names, generate_run_id, init_logging, run_span, LogConfig, LogFormat, LogLevel, Stage,
};
use fd_core::output::{format_payload, Envelope, Render};
use fd_core::pipeline::{self, LoadedCircuit, LoadedSettings};
use fd_core::render::to_dot_with_fault;
use fd_core::schema::{available_schemas, generate_all_schemas, generate_schema};
use fd_core::simulate::{exhaustive_inputs, parse_input_vector, Fault, SimulationReport};
use serde::Serialize;
use tracing::info;

/// Stuck-at fault simulation, Bayesian diagnosis and sensitivity analysis
#[derive(Parser)]
#[command(name = "fd-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Omit timestamps from human log lines
    #[arg(long, global = true)]
    no_log_time: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the circuit, optionally with a stuck-at fault
    Simulate(SimulateArgs),

    /// Rank single-fault hypotheses against observed input/output pairs
    Diagnose(DiagnoseArgs),

    /// Score every node by how visible its faults are
    Sensitivity(SensitivityArgs),

    /// Print the circuit as a Graphviz digraph
    Dot(DotArgs),

    /// Run simulation, diagnosis and sensitivity on the built-in circuit
    Demo,

    /// Validate circuit, settings and observation files
    Check(CheckArgs),

    /// Print JSON schemas for input files and reports
    Schema(SchemaArgs),
}

#[derive(Args, Debug)]
struct CircuitArg {
    /// Circuit description (JSON); the built-in demo circuit if omitted
    #[arg(long)]
    circuit: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SimulateArgs {
    #[command(flatten)]
    circuit: CircuitArg,

    /// Fault to inject, e.g. N1=0
    #[arg(long)]
    fault: Option<String>,

    /// Input vectors such as 0,1 or 01; every combination if omitted
    #[arg(long, num_args = 1..)]
    inputs: Vec<String>,
}

#[derive(Args, Debug)]
struct DiagnoseArgs {
    #[command(flatten)]
    circuit: CircuitArg,

    /// Observation file (JSON); required with a custom circuit
    #[arg(long)]
    observations: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(long)]
    settings: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SensitivityArgs {
    #[command(flatten)]
    circuit: CircuitArg,

    /// Settings file (JSON)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Metric: output or posterior (overrides settings)
    #[arg(long)]
    metric: Option<SensitivityMetricKind>,

    /// Test vectors; every combination if omitted
    #[arg(long, num_args = 1..)]
    inputs: Vec<String>,

    /// Score gates only
    #[arg(long)]
    skip_inputs: bool,
}

#[derive(Args, Debug)]
struct DotArgs {
    #[command(flatten)]
    circuit: CircuitArg,

    /// Highlight the nodes this fault changes, e.g. N1=1
    #[arg(long)]
    fault: Option<String>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    circuit: CircuitArg,

    #[arg(long)]
    settings: Option<PathBuf>,

    #[arg(long)]
    observations: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct SchemaArgs {
    /// Type to print
    type_name: Option<String>,

    /// List available types
    #[arg(long)]
    list: bool,

    /// Print every schema
    #[arg(long, conflicts_with = "type_name")]
    all: bool,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Simulate(_) => "simulate",
            Commands::Diagnose(_) => "diagnose",
            Commands::Sensitivity(_) => "sensitivity",
            Commands::Dot(_) => "dot",
            Commands::Demo => "demo",
            Commands::Check(_) => "check",
            Commands::Schema(_) => "schema",
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let use_color = !cli.global.no_color && std::io::stderr().is_terminal();

    let cli_level = (cli.global.quiet || cli.global.verbose > 0)
        .then(|| LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet));
    let log_config = LogConfig::from_env(cli_level, cli.global.log_format)
        .with_ansi(use_color)
        .with_timestamps(!cli.global.no_log_time);
    init_logging(&log_config);

    let run_id = generate_run_id();
    let command = cli.command.name();
    let span = run_span(&run_id, command);
    let _guard = span.enter();
    info!(event = event_names::RUN_STARTED, "starting");

    let ctx = Ctx {
        run_id: &run_id,
        command,
        format: cli.global.format,
    };
    let exit_code = match dispatch(&ctx, &cli.command) {
        Ok(code) => code,
        Err(err) => {
            report_error(&err, cli.global.format, use_color);
            ExitCode::from_error(&err)
        }
    };

    info!(event = event_names::RUN_FINISHED, exit_code = %exit_code, "finished");
    std::process::exit(exit_code.as_i32());
}

struct Ctx<'a> {
    run_id: &'a str,
    command: &'a str,
    format: OutputFormat,
}

impl Ctx<'_> {
    fn emit<T: Serialize + Render>(
        &self,
        result: &T,
        config: Option<&fd_config::ConfigSnapshot>,
    ) -> Result<(), Error> {
        let mut envelope = Envelope::new(self.run_id, self.command, result);
        if let Some(c) = config {
            envelope = envelope.with_config(c);
        }
        println!("{}", format_payload(&envelope, self.format)?);
        Ok(())
    }
}

fn dispatch(ctx: &Ctx<'_>, command: &Commands) -> Result<ExitCode, Error> {
    match command {
        Commands::Simulate(args) => run_simulate(ctx, args),
        Commands::Diagnose(args) => run_diagnose(ctx, args),
        Commands::Sensitivity(args) => run_sensitivity(ctx, args),
        Commands::Dot(args) => run_dot(args),
        Commands::Demo => run_demo(ctx),
        Commands::Check(args) => run_check(ctx, args),
        Commands::Schema(args) => run_schema(ctx, args),
    }
}

fn report_error(err: &Error, format: OutputFormat, use_color: bool) {
    match format {
        OutputFormat::Json => eprintln!("{}", StructuredError::from(err).to_json()),
        OutputFormat::Md | OutputFormat::Summary => eprintln!("{}", format_error_human(err, use_color)),
    }
}

fn input_vectors(loaded: &LoadedCircuit, texts: &[String]) -> Result<Vec<Vec<bool>>, Error> {
    if texts.is_empty() {
        return Ok(exhaustive_inputs(loaded.circuit.inputs().len())?);
    }
    Ok(texts
        .iter()
        .map(|t| parse_input_vector(&loaded.circuit, t))
        .collect::<Result<Vec<_>, _>>()?)
}

fn parse_fault(loaded: &LoadedCircuit, spec: Option<&str>) -> Result<Option<Fault>, Error> {
    Ok(spec.map(|s| Fault::parse(&loaded.circuit, s)).transpose()?)
}

fn run_simulate(ctx: &Ctx<'_>, args: &SimulateArgs) -> Result<ExitCode, Error> {
    let loaded = pipeline::load_circuit(args.circuit.circuit.as_deref())?;
    let fault = parse_fault(&loaded, args.fault.as_deref())?;
    let vectors = input_vectors(&loaded, &args.inputs)?;

    info!(stage = %Stage::Simulate, vectors = vectors.len(), "simulating");
    let report = SimulationReport::run(&loaded.circuit, fault, &vectors)?;
    ctx.emit(&report, None)?;

    Ok(if report.is_detected() {
        ExitCode::FaultDetected
    } else {
        ExitCode::Clean
    })
}

fn run_diagnose(ctx: &Ctx<'_>, args: &DiagnoseArgs) -> Result<ExitCode, Error> {
    let loaded = pipeline::load_circuit(args.circuit.circuit.as_deref())?;
    let settings = pipeline::load_settings(args.settings.as_deref())?;
    let observations = pipeline::load_observations(args.observations.as_deref(), &loaded)?;
    let model = settings.model()?;
    let hypotheses = pipeline::hypotheses_for(&loaded.circuit, &settings.settings)?;

    info!(
        stage = %Stage::Diagnose,
        hypotheses = hypotheses.len(),
        observations = observations.observations.len(),
        "diagnosing"
    );
    let report = diagnose(&loaded.circuit, hypotheses, model, &observations.observations)?;
    let snapshot = pipeline::snapshot(&loaded, &settings, Some(&observations));
    ctx.emit(&report, Some(&snapshot))?;
    Ok(ExitCode::Clean)
}

fn run_sensitivity(ctx: &Ctx<'_>, args: &SensitivityArgs) -> Result<ExitCode, Error> {
    let loaded = pipeline::load_circuit(args.circuit.circuit.as_deref())?;
    let settings = pipeline::load_settings(args.settings.as_deref())?;
    let model = settings.model()?;
    let hypotheses = pipeline::hypotheses_for(&loaded.circuit, &settings.settings)?;

    let mut config =
        SensitivityConfig::from_settings(&settings.settings).with_vectors(input_vectors(&loaded, &args.inputs)?);
    if let Some(metric) = args.metric {
        config.metric = metric;
    }
    if args.skip_inputs {
        config.include_inputs = false;
    }

    info!(stage = %Stage::Sensitivity, metric = %config.metric, "scoring nodes");
    let report = analyze(&loaded.circuit, &config, &hypotheses, model)?;
    let snapshot = pipeline::snapshot(&loaded, &settings, None);
    ctx.emit(&report, Some(&snapshot))?;
    Ok(ExitCode::Clean)
}

fn run_dot(args: &DotArgs) -> Result<ExitCode, Error> {
    let loaded = pipeline::load_circuit(args.circuit.circuit.as_deref())?;
    let fault = parse_fault(&loaded, args.fault.as_deref())?;
    let highlighted: Vec<_> = match fault {
        Some(f) => {
            let vectors = exhaustive_inputs(loaded.circuit.inputs().len())?;
            let report = SimulationReport::run(&loaded.circuit, Some(f), &vectors)?;
            report
                .affected_nodes
                .iter()
                .filter_map(|name| loaded.circuit.id(name))
                .collect()
        }
        None => Vec::new(),
    };
    info!(stage = %Stage::Render, highlighted = highlighted.len(), "rendering DOT");
    print!("{}", to_dot_with_fault(&loaded.circuit, &highlighted, fault));
    Ok(ExitCode::Clean)
}

fn run_demo(ctx: &Ctx<'_>) -> Result<ExitCode, Error> {
    let loaded = pipeline::load_circuit(None)?;
    let demo_settings = DiagnosisSettings::demo();
    let settings = LoadedSettings {
        json: Some(serde_json::to_string(&demo_settings)?),
        settings: demo_settings,
        path: None,
        source: ConfigSource::BuiltinDefault,
    };
    let observations = pipeline::load_observations(None, &loaded)?;

    let report = pipeline::run_demo()?;
    let snapshot = pipeline::snapshot(&loaded, &settings, Some(&observations));
    ctx.emit(&report, Some(&snapshot))?;
    Ok(ExitCode::Clean)
}

fn run_check(ctx: &Ctx<'_>, args: &CheckArgs) -> Result<ExitCode, Error> {
    info!(stage = %Stage::Load, "validating inputs");
    let report = pipeline::check(
        args.circuit.circuit.as_deref(),
        args.settings.as_deref(),
        args.observations.as_deref(),
    )?;
    ctx.emit(&report, None)?;
    Ok(ExitCode::Clean)
}

fn run_schema(ctx: &Ctx<'_>, args: &SchemaArgs) -> Result<ExitCode, Error> {
    let value = if args.all {
        serde_json::to_value(generate_all_schemas())?
    } else if let (Some(name), false) = (&args.type_name, args.list) {
        generate_schema(name)
            .ok_or_else(|| Error::Config(format!("unknown schema type '{}'; try --list", name)))?
    } else {
        if ctx.format != OutputFormat::Json {
            for (name, desc) in available_schemas() {
                println!("{:<20} {}", name, desc);
            }
            return Ok(ExitCode::Clean);
        }
        let list: Vec<_> = available_schemas()
            .into_iter()
            .map(|(name, description)| serde_json::json!({ "name": name, "description": description }))
            .collect();
        serde_json::Value::Array(list)
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(ExitCode::Clean)
}
