//! # podman-secret
//!
//! Command-line driver for the Podman secret provider.
//!
//! Each subcommand runs one lifecycle operation. Desired configuration and
//! state documents are read from files (`-` for stdin); the resulting state
//! is written to stdout as JSON. Logs go to stderr.
//!
//! ## Usage
//!
//! ```bash
//! # Create a secret and keep the state it returns
//! podman-secret create --config secret.json > state.json
//!
//! # Converge on the configuration, creating or replacing as needed
//! podman-secret apply --config secret.json --state state.json
//!
//! # Adopt an existing secret
//! podman-secret import 3f7a9c0e8d1b4a5f6e2c7d90a
//!
//! # Remove it again, printing provider metrics to stderr afterwards
//! podman-secret delete --state state.json --emit-metrics
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use podman_secret_provider::constants::SECRET_SCHEMA_VERSION;
use podman_secret_provider::observability::logging::{self, LogFormat};
use podman_secret_provider::observability::metrics;
use podman_secret_provider::resource::plan;
use podman_secret_provider::schema;
use podman_secret_provider::{
    PodmanClient, PodmanProvider, ProviderConfig, ProviderContext, ProviderError, SecretConfig,
    SecretState,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_HASH"),
    ", built ",
    env!("BUILD_DATETIME"),
    ")"
);

/// Podman secret provider
#[derive(Parser)]
#[command(name = "podman-secret")]
#[command(version, long_version = LONG_VERSION, about = "Reconcile Podman secrets against a desired configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Podman API endpoint (unix:/path or tcp://host:port)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Timeout for a single podman API request, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Log level (ERROR, WARN, INFO, DEBUG, TRACE)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    log_format: Option<String>,

    /// Write provider metrics in the Prometheus text format to stderr after the command
    #[arg(long, global = true)]
    emit_metrics: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print provider metadata and schemas
    Schema {
        /// Print the JSON Schema of the state document instead
        #[arg(long)]
        json_schema: bool,
    },
    /// Create a secret from a configuration document
    Create {
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
    },
    /// Refresh a state document from podman
    Read {
        #[arg(long, value_name = "FILE")]
        state: PathBuf,
    },
    /// Re-apply a configuration to existing state without contacting podman
    Update {
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
        #[arg(long, value_name = "FILE")]
        state: PathBuf,
    },
    /// Remove the secret recorded in a state document
    Delete {
        #[arg(long, value_name = "FILE")]
        state: PathBuf,
    },
    /// Adopt an existing secret by its full id
    Import {
        #[arg(value_name = "ID")]
        id: String,
    },
    /// Show what apply would do
    Plan {
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },
    /// Create, keep or replace the secret so it matches the configuration
    Apply {
        #[arg(long, value_name = "FILE")]
        config: PathBuf,
        #[arg(long, value_name = "FILE")]
        state: Option<PathBuf>,
    },
    /// Rewrite a state document at the current schema version
    #[command(name = "upgrade-state")]
    UpgradeState {
        #[arg(long, value_name = "FILE")]
        state: PathBuf,
    },
}

/// Persisted state as exchanged with the host
#[derive(Debug, Serialize, Deserialize)]
struct StateDocument {
    #[serde(default)]
    schema_version: i64,
    state: Option<Value>,
}

impl StateDocument {
    fn current(state: Option<&SecretState>) -> Result<Self> {
        let state = state
            .map(serde_json::to_value)
            .transpose()
            .context("Failed to serialize secret state")?;
        Ok(Self {
            schema_version: SECRET_SCHEMA_VERSION,
            state,
        })
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        Ok(buffer)
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}

fn load_config(path: &Path) -> Result<SecretConfig> {
    let raw = read_input(path)?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse secret configuration {}", path.display()))
}

/// Load a state document, upgrading it to the current schema version
fn load_state(path: &Path) -> Result<Option<SecretState>> {
    let raw = read_input(path)?;
    let document: StateDocument = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse state document {}", path.display()))?;

    match document.state {
        None => Ok(None),
        Some(state) => schema::upgrade_secret_state(document.schema_version, state)
            .map(Some)
            .map_err(report),
    }
}

fn require_state(path: &Path) -> Result<SecretState> {
    match load_state(path)? {
        Some(state) => Ok(state),
        None => bail!("State document {} holds no secret", path.display()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn print_state(state: Option<&SecretState>) -> Result<()> {
    print_json(&StateDocument::current(state)?)
}

/// Emit the host diagnostic for a provider error and turn it into a CLI error
fn report(error: ProviderError) -> anyhow::Error {
    let diagnostic = error.to_diagnostic();
    if let Ok(line) = serde_json::to_string(&diagnostic) {
        eprintln!("{line}");
    }
    anyhow::Error::new(error)
}

/// Context for operations that never reach podman
fn offline_context(cli: &Cli) -> Result<ProviderContext<PodmanClient>> {
    PodmanProvider::default()
        .context(&provider_config(cli))
        .map_err(report)
}

async fn configure(cli: &Cli) -> Result<ProviderContext<PodmanClient>> {
    let config = provider_config(cli);
    PodmanProvider::default()
        .configure(&config)
        .await
        .map_err(report)
}

fn provider_config(cli: &Cli) -> ProviderConfig {
    let mut config = ProviderConfig::from_env();
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(timeout) = cli.timeout_secs {
        config.request_timeout_secs = timeout;
    }
    if let Some(level) = &cli.log_level {
        config.log_level.clone_from(level);
    }
    if let Some(format) = &cli.log_format {
        config.log_format.clone_from(format);
    }
    config
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = provider_config(&cli);

    let format: LogFormat = config.log_format.parse()?;
    logging::init_logging(&config.log_level, format).context("Failed to initialize logging")?;
    metrics::register_metrics().context("Failed to register metrics")?;

    debug!(command = command_name(&cli.command), "starting");
    let result = run(&cli).await;

    if cli.emit_metrics {
        eprint!(
            "{}",
            metrics::gather_text().context("Failed to render metrics")?
        );
    }
    result
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Schema { .. } => "schema",
        Commands::Create { .. } => "create",
        Commands::Read { .. } => "read",
        Commands::Update { .. } => "update",
        Commands::Delete { .. } => "delete",
        Commands::Import { .. } => "import",
        Commands::Plan { .. } => "plan",
        Commands::Apply { .. } => "apply",
        Commands::UpgradeState { .. } => "upgrade-state",
    }
}

async fn run(cli: &Cli) -> Result<()> {
    let provider = PodmanProvider::default();

    match &cli.command {
        Commands::Schema { json_schema } => {
            if *json_schema {
                print_json(&schema::secret_state_json_schema())
            } else {
                let resources: Vec<Value> = provider
                    .resources()
                    .into_iter()
                    .map(|type_name| {
                        json!({
                            "type_name": type_name,
                            "schema": schema::secret_resource_schema(),
                        })
                    })
                    .collect();
                print_json(&json!({
                    "metadata": provider.metadata(),
                    "provider": provider.schema(),
                    "resources": resources,
                }))
            }
        }
        Commands::Create { config } => {
            let desired = load_config(config)?;
            let context = configure(cli).await?;
            let state = context
                .secret_resource()
                .create(&desired)
                .await
                .map_err(report)?;
            print_state(Some(&state))
        }
        Commands::Read { state } => {
            let prior = require_state(state)?;
            let context = configure(cli).await?;
            let outcome = context.secret_resource().read(&prior).await.map_err(report)?;
            if outcome.is_absent() {
                info!(secret.id = %prior.id, "secret is gone, dropping it from state");
            }
            print_state(outcome.into_state().as_ref())
        }
        Commands::Update { config, state } => {
            let desired = load_config(config)?;
            let prior = require_state(state)?;
            let context = offline_context(cli)?;
            let state = context
                .secret_resource()
                .update(&desired, &prior)
                .map_err(report)?;
            print_state(Some(&state))
        }
        Commands::Delete { state } => {
            let prior = require_state(state)?;
            let context = configure(cli).await?;
            context.secret_resource().delete(&prior).await.map_err(report)?;
            print_state(None)
        }
        Commands::Import { id } => {
            let context = configure(cli).await?;
            let resource = context.secret_resource();
            let seeded = resource.import_state(id);
            let outcome = resource.read(&seeded).await.map_err(report)?;
            match outcome.into_state() {
                Some(state) => print_state(Some(&state)),
                None => bail!("No podman secret has id {id}"),
            }
        }
        Commands::Plan { config, state } => {
            let desired = load_config(config)?;
            let prior = state.as_deref().map(load_state).transpose()?.flatten();
            let observed = match prior {
                Some(prior) => {
                    let context = configure(cli).await?;
                    context
                        .secret_resource()
                        .read(&prior)
                        .await
                        .map_err(report)?
                        .into_state()
                }
                None => None,
            };
            print_json(&plan::plan(&desired, observed.as_ref()))
        }
        Commands::Apply { config, state } => {
            let desired = load_config(config)?;
            let prior = state.as_deref().map(load_state).transpose()?.flatten();
            let context = configure(cli).await?;
            let state = context
                .secret_resource()
                .apply(&desired, prior.as_ref())
                .await
                .map_err(report)?;
            print_state(Some(&state))
        }
        Commands::UpgradeState { state } => print_state(load_state(state)?.as_ref()),
    }
}
