use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use credstage::{MaterializeOptions, Materializer, ProcessEnv};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Decode a base64-encoded secret from the environment into a credential file,
/// then optionally hand off to the main server command.
#[derive(Parser)]
#[command(name = "credstage", version, about)]
struct Args {
    /// Environment variable holding the base64-encoded credential material
    variable: Option<String>,
    /// Path the decoded credential file is written to
    #[arg(default_value = "output.json")]
    output: PathBuf,
    /// Skip the JSON well-formedness check on the decoded payload
    #[arg(long)]
    skip_validation: bool,
    /// Print the success report as JSON instead of plain text
    #[arg(long)]
    json: bool,
    /// Command to launch once the credential file is in place
    #[arg(last = true, value_name = "COMMAND")]
    command: Vec<String>,
}

fn main() {
    init_telemetry();
    if let Err(err) = run(Args::parse()) {
        eprintln!("credstage: {err:#}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let Some(variable) = args.variable else {
        // The spec'd contract is exit code 1 for a missing variable name, so
        // the usage error is handled here instead of via a required positional.
        eprintln!("{}", Args::command().render_usage());
        anyhow::bail!("a variable name is required");
    };

    let options = MaterializeOptions {
        validate_json: !args.skip_validation,
    };
    let report = Materializer::with_options(ProcessEnv, options)
        .materialize(&variable, &args.output)
        .with_context(|| format!("failed to materialize `{variable}`"))?;

    if args.json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "materialized {} -> {} ({} bytes)",
            report.variable,
            report.path.display(),
            report.bytes_written
        );
    }

    if args.command.is_empty() {
        return Ok(());
    }
    hand_off(&args.command)
}

/// Spawns the server command with inherited stdio and environment and exits
/// with its status. Only reached after a successful materialization: a failed
/// gate never starts the application.
fn hand_off(command: &[String]) -> Result<()> {
    let (program, rest) = command
        .split_first()
        .expect("caller checked command is non-empty");
    tracing::info!(program, "handing off to server command");
    let status = process::Command::new(program)
        .args(rest)
        .status()
        .with_context(|| format!("failed to launch `{program}`"))?;
    process::exit(status.code().unwrap_or(1));
}

fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}
