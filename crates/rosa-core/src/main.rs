//! Cluster Test Harness Core - sanitized output tooling
//!
//! The main entry point for rosa-core, handling:
//! - Redacting files or stdin before they are stored or shared
//! - Checking captured output for unredacted secrets
//! - Listing and verifying the redaction rules
//! - Running a command with sanitized output

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rosa_core::capture::CommandCapture;
use rosa_core::exit_codes::ExitCode;
use rosa_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel,
    Logger, Stage,
};
use rosa_core::{log_event, Result};
use rosa_redact::{
    PatternRegistry, RedactingWriter, RedactionReport, Redactor, SecretCategory, CANARY_SECRETS,
};
use serde::Serialize;

/// Cluster Test Harness Core - redact secrets from CLI output and logs
#[derive(Parser)]
#[command(name = "rosa-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Minimum log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log output format on stderr (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Redact files (or stdin) to stdout
    Redact(RedactArgs),
    /// Exit with status 1 if any input contains a recognized secret
    Check(CheckArgs),
    /// List the redaction rules in application order
    Rules(RulesArgs),
    /// Run a command and print its sanitized output
    Exec(ExecArgs),
}

#[derive(Args, Debug)]
struct RedactArgs {
    /// Input files; reads stdin when none are given or for "-"
    files: Vec<PathBuf>,

    /// Print per-rule match counts as JSON on stderr
    #[arg(long)]
    report: bool,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Input files; reads stdin when none are given or for "-"
    files: Vec<PathBuf>,

    /// Print findings as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct RulesArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = RulesFormat::Text)]
    format: RulesFormat,

    /// Check that every built-in canary secret is masked
    #[arg(long)]
    verify: bool,
}

#[derive(Args, Debug)]
struct ExecArgs {
    /// Program and arguments to run
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum RulesFormat {
    Text,
    Json,
}

/// Report for one input source.
#[derive(Serialize)]
struct SourceReport {
    source: String,
    #[serde(flatten)]
    report: RedactionReport,
}

#[derive(Serialize)]
struct RedactSummary {
    total: usize,
    sources: Vec<SourceReport>,
}

#[derive(Serialize)]
struct RuleInfo<'a> {
    name: &'a str,
    category: SecretCategory,
    pattern: &'a str,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version are reported through the error path too
            let code = if err.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = err.print();
            std::process::exit(code.as_i32());
        }
    };

    let verbosity = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    let log_config = LogConfig::from_env(cli.global.log_level.or(verbosity), cli.global.log_format);
    init_logging(&log_config);

    let ctx = LogContext::new(generate_run_id());
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_STARTED,
        Stage::Init,
        "starting",
        version = env!("CARGO_PKG_VERSION")
    );

    let result = match &cli.command {
        Commands::Redact(args) => run_redact(&ctx, args).map(ExitCode::as_i32),
        Commands::Check(args) => run_check(&ctx, args).map(ExitCode::as_i32),
        Commands::Rules(args) => run_rules(args).map(ExitCode::as_i32),
        Commands::Exec(args) => run_exec(&ctx, args),
    };

    let code = match result {
        Ok(code) => code,
        Err(err) => {
            let exit = err.exit_code();
            if exit == ExitCode::InternalError {
                log_event!(
                    ctx,
                    ERROR,
                    event_names::INTERNAL_ERROR,
                    Stage::Init,
                    err.to_string().as_str()
                );
            }
            eprintln!("rosa-core: {err}");
            exit.as_i32()
        }
    };

    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Init,
        "finished",
        exit_code = code
    );
    std::process::exit(code);
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_redact(ctx: &LogContext, args: &RedactArgs) -> Result<ExitCode> {
    let redactor = Redactor::global();
    let mut reports = Vec::new();

    for path in input_paths(&args.files) {
        let source = input_label(&path);
        log_event!(
            ctx,
            DEBUG,
            event_names::REDACT_INPUT,
            Stage::Redact,
            "redacting input",
            source = source.as_str()
        );

        let mut reader = open_input(&path)?;
        if args.report {
            let text = read_lossy(&mut reader)?;
            let report = redactor.redact_with_report(&text);
            io::stdout().lock().write_all(report.output.as_str().as_bytes())?;
            reports.push(SourceReport { source, report });
        } else {
            let mut writer = RedactingWriter::with_redactor(io::stdout().lock(), redactor);
            io::copy(&mut reader, &mut writer)?;
            writer.finish()?;
        }
    }

    if args.report {
        let summary = RedactSummary {
            total: reports.iter().map(|r| r.report.total()).sum(),
            sources: reports,
        };
        eprintln!("{}", serde_json::to_string_pretty(&summary)?);
    }

    log_event!(
        ctx,
        DEBUG,
        event_names::REDACT_FINISHED,
        Stage::Redact,
        "redaction finished"
    );
    Ok(ExitCode::Clean)
}

fn run_check(ctx: &LogContext, args: &CheckArgs) -> Result<ExitCode> {
    let redactor = Redactor::global();
    let mut findings = Vec::new();

    for path in input_paths(&args.files) {
        let source = input_label(&path);
        let text = read_lossy(&mut open_input(&path)?)?;
        let report = redactor.redact_with_report(&text);

        for hit in &report.hits {
            log_event!(
                ctx,
                WARN,
                event_names::CHECK_SECRET_FOUND,
                Stage::Check,
                "unredacted secret found",
                source = source.as_str(),
                rule = hit.rule.as_str(),
                count = hit.count
            );
        }
        if !report.hits.is_empty() {
            findings.push(SourceReport { source, report });
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&findings)?);
    } else {
        for finding in &findings {
            for hit in &finding.report.hits {
                println!(
                    "{}: {} [{}] x{}",
                    finding.source, hit.rule, hit.category, hit.count
                );
            }
        }
    }

    log_event!(
        ctx,
        INFO,
        event_names::CHECK_FINISHED,
        Stage::Check,
        "check finished",
        sources_with_secrets = findings.len()
    );

    if findings.is_empty() {
        Ok(ExitCode::Clean)
    } else {
        Ok(ExitCode::SecretsFound)
    }
}

fn run_rules(args: &RulesArgs) -> Result<ExitCode> {
    let registry = PatternRegistry::global();
    if args.verify {
        return Ok(verify_canaries(registry));
    }

    match args.format {
        RulesFormat::Text => {
            for rule in registry {
                println!(
                    "{:<38} {:<12} {}",
                    rule.name(),
                    rule.category().to_string(),
                    rule.pattern()
                );
            }
        }
        RulesFormat::Json => {
            let rules: Vec<RuleInfo<'_>> = registry
                .iter()
                .map(|rule| RuleInfo {
                    name: rule.name(),
                    category: rule.category(),
                    pattern: rule.pattern(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
    }
    Ok(ExitCode::Clean)
}

/// Run every canary through the registry; the canary text is never printed.
fn verify_canaries(registry: &PatternRegistry) -> ExitCode {
    let redactor = Redactor::new(registry);
    let mut leaked = 0;
    for (index, (input, secret)) in CANARY_SECRETS.iter().enumerate() {
        if redactor.redact(input).contains(secret) {
            tracing::error!(canary = index, "canary secret survived redaction");
            leaked += 1;
        }
    }
    println!(
        "{} canaries checked, {} leaked",
        CANARY_SECRETS.len(),
        leaked
    );
    if leaked == 0 {
        ExitCode::Clean
    } else {
        ExitCode::InternalError
    }
}

fn run_exec(ctx: &LogContext, args: &ExecArgs) -> Result<i32> {
    let Some((program, rest)) = args.command.split_first() else {
        return Ok(ExitCode::ArgsError.as_i32());
    };
    let capture = CommandCapture::new(program.as_str(), rest.iter().map(String::as_str));

    let mut logger = Logger::tracing();
    logger.info(format_args!("Running command: {}", capture.display_command()))?;

    let output = capture.run()?;
    io::stdout().write_all(output.stdout.as_str().as_bytes())?;
    io::stderr().write_all(output.stderr.as_str().as_bytes())?;

    match output.status {
        Some(status) => {
            log_event!(
                ctx,
                INFO,
                event_names::EXEC_FINISHED,
                Stage::Exec,
                "command finished",
                status = status
            );
            Ok(status)
        }
        None => {
            logger.error("command terminated by a signal")?;
            Ok(ExitCode::CommandFailed.as_i32())
        }
    }
}

// ============================================================================
// Input helpers
// ============================================================================

fn input_paths(files: &[PathBuf]) -> Vec<PathBuf> {
    if files.is_empty() {
        vec![PathBuf::from("-")]
    } else {
        files.to_vec()
    }
}

fn input_label(path: &Path) -> String {
    if path == Path::new("-") {
        "<stdin>".to_string()
    } else {
        path.display().to_string()
    }
}

fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if path == Path::new("-") {
        return Ok(Box::new(io::stdin().lock()));
    }
    File::open(path)
        .map(|file| Box::new(file) as Box<dyn Read>)
        .map_err(|err| io::Error::new(err.kind(), format!("{}: {}", path.display(), err)))
}

fn read_lossy(reader: &mut dyn Read) -> io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}
