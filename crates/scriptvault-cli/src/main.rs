mod commands;

use clap::{Parser, Subcommand};
use commands::{EXIT_FAILURE, EXIT_SETTINGS_ERROR, EXIT_STORE_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "scriptvault",
    version,
    about = "Promote, sign, and publish a catalog of user-contributed scripts"
)]
struct Cli {
    /// Catalog base directory containing scripts/, validated_scripts/, and sha_signatures/.
    #[arg(long, default_value = ".", global = true)]
    base: PathBuf,

    /// Settings file (defaults to settings.yaml inside the base directory).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Promote new scripts, sign every validated script, and write the manifest.
    Build,
    /// Copy staging scripts that are not yet validated.
    Promote,
    /// Check stored signatures against validated script content.
    Verify,
    /// Show the header metadata extracted from a script.
    Inspect {
        /// Path to the script file.
        script: PathBuf,
    },
    /// List the entries of the current manifest.
    Show,
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("SCRIPTVAULT_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let base = cli.base.as_path();
    let settings = cli.settings.as_deref();
    let json_output = cli.json;

    let result = match cli.command {
        Commands::Build => commands::build::run(base, settings, json_output),
        Commands::Promote => commands::promote::run(base, settings, json_output),
        Commands::Verify => commands::verify::run(base, json_output),
        Commands::Inspect { script } => commands::inspect::run(&script, json_output),
        Commands::Show => commands::show::run(base, settings, json_output),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("settings error:") {
                EXIT_SETTINGS_ERROR
            } else if msg.starts_with("store error:") || msg.starts_with("manifest error:") {
                EXIT_STORE_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
