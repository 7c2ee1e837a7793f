//! Troika - three-agent test-writing team runner
//!
//! Main entry point for the CLI application.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use troika::chat::{CancelToken, RunStatus};
use troika::core::Config;
use troika::runner::RunController;

/// Troika - three-agent test-writing team runner
#[derive(Parser, Debug)]
#[command(name = "troika")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the team on a task against a code directory
    Run {
        /// Task for the team to solve
        task: String,

        /// Path to the code repository the team should modify and execute
        code_dir: PathBuf,

        /// Optional file storing conversation tasks for subsequent runs
        #[arg(long)]
        log_file: Option<PathBuf>,

        /// Enable debug output
        #[arg(long, short = 'd')]
        debug: bool,
    },
    /// Print the effective configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = Config::load();

    match cli.command {
        Commands::Config { init } => {
            // Never echo or persist the credential
            let config = config.redacted();

            if init {
                return match config.save() {
                    Ok(()) => {
                        println!("Wrote {}", Config::config_file().display());
                        ExitCode::SUCCESS
                    }
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        ExitCode::FAILURE
                    }
                };
            }

            match toml::to_string_pretty(&config) {
                Ok(toml_str) => {
                    println!("# Effective configuration ({})", Config::config_file().display());
                    println!("{}", toml_str);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
        Commands::Run {
            task,
            code_dir,
            log_file,
            debug,
        } => {
            if debug {
                config.run.debug = true;
            }

            let cancel = CancelToken::new();
            let ctrl_c_cancel = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("\nCancellation requested, finishing up...");
                    ctrl_c_cancel.cancel();
                }
            });

            let controller = RunController::new(config, code_dir, log_file);
            match controller.run(&task, cancel).await {
                Ok(outcome) => match outcome.status {
                    RunStatus::Terminated => {
                        println!(
                            "Run complete: {} turns, {} messages.",
                            outcome.turns,
                            outcome.history.len()
                        );
                        ExitCode::SUCCESS
                    }
                    RunStatus::Cancelled => {
                        eprintln!("Run cancelled after {} turns.", outcome.turns);
                        ExitCode::FAILURE
                    }
                },
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}
