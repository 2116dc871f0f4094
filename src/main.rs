//! Command-line entry point.
//!
//! Builds an [`ActionHost`] from configuration plus any manifests given on the
//! command line, then inspects it:
//!
//! - `resolve`: resolves a registry for a render context and prints JSON
//! - `list`: prints the registered action trees and loaded hooks
//! - `check`: loads manifests into a scratch host and reports problems
//!
//! Configuration comes from `--config <file>` or, without it, from
//! `ACTIONHOOKS_*` environment variables (e.g. `ACTIONHOOKS_TRACE_LEVEL`).
//! `--log-to-file` writes logs under `ACTIONHOOKS_DATA_DIR` (default
//! `~/.local/share/actionhooks`).

use actionhooks::observability::init_tracing;
use actionhooks::registry::RegistrySnapshot;
use actionhooks::{
    initialize, ActionError, ActionHost, ActionRegistry, Config, HookManifest, RegistryTarget, RenderContext, Result,
};
use clap::Parser;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const ENV_PREFIX: &str = "ACTIONHOOKS_";

#[derive(Parser)]
#[command(name = "actionhooks")]
#[command(version)]
#[command(about = "Inspect action registries and validate hook manifests")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Additional hook manifest to load (repeatable)
    #[arg(short, long = "manifest", global = true, value_name = "FILE")]
    manifests: Vec<PathBuf>,

    /// Start the review request registry empty
    #[arg(long, global = true)]
    no_defaults: bool,

    /// Log to the data directory instead of stderr when no log file is configured
    #[arg(long, global = true)]
    log_to_file: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default)]
enum Target {
    #[default]
    ReviewRequest,
    Header,
}

impl From<Target> for RegistryTarget {
    fn from(target: Target) -> Self {
        match target {
            Target::ReviewRequest => Self::ReviewRequest,
            Target::Header => Self::Header,
        }
    }
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Resolves the actions visible for a render context
    Resolve {
        /// Render context as JSON ("-" for stdin; default: anonymous detail page)
        #[arg(long, value_name = "FILE")]
        context: Option<PathBuf>,

        /// Registry to resolve
        #[arg(short, long, value_enum, default_value_t)]
        target: Target,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Lists registered actions and loaded hooks
    List {
        /// Only list this registry
        #[arg(short, long, value_enum)]
        target: Option<Target>,
    },

    /// Validates manifests by loading them into a scratch host
    Check {
        /// Manifests to check
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => {
            let vars: BTreeMap<String, String> = std::env::vars()
                .filter_map(|(key, value)| {
                    key.strip_prefix(ENV_PREFIX)
                        .map(|name| (name.to_ascii_lowercase(), value))
                })
                .collect();
            Config::from_map(&vars)
        }
    };

    config
        .manifests
        .extend(cli.manifests.iter().map(|path| path.display().to_string()));
    if cli.no_defaults {
        config.populate_defaults = false;
    }
    if cli.log_to_file {
        config = config.with_default_log_file();
    }

    Ok(config)
}

fn read_context(path: Option<&Path>) -> Result<RenderContext> {
    let contents = match path {
        None => return Ok(RenderContext::new("review-request-detail")),
        Some(path) if path.as_os_str() == "-" => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
        Some(path) => std::fs::read_to_string(path)?,
    };

    serde_json::from_str(&contents).map_err(|e| ActionError::Config(format!("invalid render context: {e}")))
}

fn resolve(host: &ActionHost, context: Option<&Path>, target: Target, pretty: bool) -> Result<()> {
    let ctx = read_context(context)?;
    let resolved: Vec<_> = host.registry(target.into()).resolve_for_context(&ctx).collect();

    let json = if pretty {
        serde_json::to_string_pretty(&resolved)
    } else {
        serde_json::to_string(&resolved)
    }
    .map_err(|e| ActionError::Config(format!("failed to encode output: {e}")))?;

    println!("{json}");
    Ok(())
}

fn print_action(snapshot: &RegistrySnapshot, action_id: &str, indent: usize) -> Result<()> {
    let Some(action) = snapshot.get(action_id) else {
        return Ok(());
    };
    let marker = if action.is_menu() { " [menu]" } else { "" };
    println!("{:indent$}{}{marker}  \"{}\"", "", action.action_id, action.label);

    if action.is_menu() {
        for child in snapshot.children(action_id)? {
            print_action(snapshot, child.action_id.as_str(), indent + 2)?;
        }
    }
    Ok(())
}

fn print_tree(registry: &ActionRegistry) -> Result<()> {
    let snapshot = registry.snapshot();
    println!("{} ({} actions)", registry.name(), snapshot.len());

    for root in snapshot.roots() {
        print_action(&snapshot, root.action_id.as_str(), 2)?;
    }
    Ok(())
}

fn list(host: &ActionHost, target: Option<Target>) -> Result<()> {
    let targets = match target {
        Some(target) => vec![target.into()],
        None => vec![RegistryTarget::ReviewRequest, RegistryTarget::Header],
    };

    for target in targets {
        print_tree(host.registry(target))?;
    }

    let hooks = host.hooks();
    println!("hooks ({})", hooks.len());
    for hook in hooks {
        let loaded_at = chrono::DateTime::from_timestamp(hook.loaded_at, 0)
            .map_or_else(|| hook.loaded_at.to_string(), |t| t.to_rfc3339());
        println!(
            "  {}  {:?}  {} actions  loaded {loaded_at}",
            hook.name, hook.kind, hook.actions
        );
    }
    Ok(())
}

/// Loads each manifest into its own scratch host. Returns the number of failures.
fn check(config: &Config, files: &[PathBuf]) -> usize {
    let mut failures = 0;

    for path in files {
        let outcome = HookManifest::load(path).and_then(|manifest| {
            let mut host = ActionHost::new(config)?;
            let loaded = host.load_manifest(manifest)?;
            host.shutdown()?;
            Ok(loaded)
        });

        match outcome {
            Ok(loaded) => println!("ok    {} ({loaded} hooks)", path.display()),
            Err(err) => {
                failures += 1;
                println!("error {}: {err}", path.display());
            }
        }
    }

    failures
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;
    init_tracing(&config);

    if let Commands::Check { files } = &cli.command {
        let scratch = Config {
            manifests: Vec::new(),
            ..config
        };
        let failures = check(&scratch, files);
        return Ok(if failures == 0 { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    let mut host = initialize(&config)?;

    match cli.command {
        Commands::Resolve { context, target, pretty } => resolve(&host, context.as_deref(), target, pretty)?,
        Commands::List { target } => list(&host, target)?,
        Commands::Check { .. } => {}
    }

    host.shutdown()?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
