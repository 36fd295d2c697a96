mod commands;
mod observation;
mod store;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::eval::EvalArgs;

#[derive(Parser)]
#[command(name = "mrf")]
#[command(about = "Macro risk filter CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> profile -> local...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Evaluate one observation period and persist the new engine state
    Eval {
        /// Observation JSON file
        #[arg(long)]
        observation: PathBuf,

        /// Layered config paths in merge order (built-in defaults when omitted)
        #[arg(long = "config")]
        config_paths: Vec<String>,

        /// State file (else $MRF_STATE_PATH, else store.state_path, else mrf_state.json)
        #[arg(long)]
        state: Option<String>,

        /// Evaluate without writing the state file
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the decision as a JSON envelope
        #[arg(long, default_value_t = false)]
        json: bool,

        /// Fail (instead of warn) when config contains keys mrf does not read
        #[arg(long, default_value_t = false)]
        strict_config: bool,
    },

    /// Manual override: forces OFF_KILL on every cycle until cleared
    Override {
        #[command(subcommand)]
        cmd: OverrideCmd,
    },

    /// Persisted state utilities
    State {
        #[command(subcommand)]
        cmd: StateCmd,
    },
}

/// State location flags shared by the state-only commands.
#[derive(clap::Args)]
struct StateLocation {
    #[arg(long)]
    state: Option<String>,

    /// Config paths, only consulted for store.state_path
    #[arg(long = "config")]
    config_paths: Vec<String>,
}

#[derive(Subcommand)]
enum OverrideCmd {
    /// Engage the override. A reason is mandatory and shows up in kill reasons.
    Set {
        #[arg(long)]
        reason: String,

        #[command(flatten)]
        loc: StateLocation,
    },

    /// Clear the override (explicit operator action only)
    Clear {
        #[command(flatten)]
        loc: StateLocation,
    },

    /// Print override status
    Status {
        #[command(flatten)]
        loc: StateLocation,
    },
}

#[derive(Subcommand)]
enum StateCmd {
    /// Print persisted engine state
    Show {
        #[command(flatten)]
        loc: StateLocation,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    // Dev convenience: pick up MRF_STATE_PATH / RUST_LOG from .env.local if present.
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = mrf_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Eval {
            observation,
            config_paths,
            state,
            dry_run,
            json,
            strict_config,
        } => commands::eval::run_eval(EvalArgs {
            observation,
            config_paths,
            state,
            dry_run,
            json,
            strict_config,
        })?,

        Commands::Override { cmd } => match cmd {
            OverrideCmd::Set { reason, loc } => {
                commands::overrides::override_set(&state_path(&loc)?, &reason)?
            }
            OverrideCmd::Clear { loc } => commands::overrides::override_clear(&state_path(&loc)?)?,
            OverrideCmd::Status { loc } => {
                commands::overrides::override_status(&state_path(&loc)?)?
            }
        },

        Commands::State { cmd } => match cmd {
            StateCmd::Show { loc, json } => commands::state::state_show(&state_path(&loc)?, json)?,
        },
    }

    Ok(())
}

fn state_path(loc: &StateLocation) -> Result<PathBuf> {
    let loaded = commands::load_config(&loc.config_paths, false)?;
    Ok(commands::resolve_state_path(loc.state.as_deref(), &loaded))
}

/// Logs go to stderr so stdout stays `key=value` / JSON.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}
