use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pageinsights_telemetry::config::{load_overrides, ConfigPaths};
use pageinsights_telemetry::{
    redact, resolve, Bootstrapper, ConfigOverrides, ConsoleSdkFactory, EffectiveConfig,
    ExclusionSet, StaticPageContext,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pageinsights", version, about = "Page telemetry bootstrap harness")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the page bootstrap and print the telemetry it emits
    Init {
        /// Page context JSON (title, uri, web, user)
        #[arg(long)]
        context: PathBuf,
        /// Component properties JSON
        #[arg(long)]
        properties: Option<PathBuf>,
    },
    /// Show the effective telemetry configuration
    Config {
        #[arg(long)]
        properties: Option<PathBuf>,
        /// Output in JSON format instead of TOML
        #[arg(long)]
        json: bool,
    },
    /// List the dependency hosts excluded from tracking
    Exclusions {
        #[arg(long)]
        properties: Option<PathBuf>,
    },
    /// Print the correlation token for an identity
    Redact {
        identity: String,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn effective_config(properties: Option<&Path>) -> Result<EffectiveConfig> {
    let properties = properties.map(ConfigOverrides::from_json_file).transpose()?;
    let overrides = load_overrides(&ConfigPaths::discover(), properties)?;
    Ok(resolve(&EffectiveConfig::default(), &overrides))
}

async fn cmd_init(context: &Path, properties: Option<&Path>) -> Result<()> {
    let raw = fs::read_to_string(context)
        .with_context(|| format!("read page context {}", context.display()))?;
    let page = StaticPageContext::from_json(&raw).with_context(|| "parse page context")?;
    debug!(page = %page.uri, "loaded page context");

    let properties = properties.map(ConfigOverrides::from_json_file).transpose()?;
    let overrides = load_overrides(&ConfigPaths::discover(), properties)?;

    let mut bootstrapper =
        Bootstrapper::new(EffectiveConfig::default(), overrides, page, ConsoleSdkFactory);
    bootstrapper.on_init().await?;
    debug!(active = bootstrapper.is_active(), "page bootstrap finished");
    Ok(())
}

fn cmd_config(properties: Option<&Path>, json: bool) -> Result<()> {
    let config = effective_config(properties)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print!("{}", toml::to_string_pretty(&config)?);
    }
    Ok(())
}

fn cmd_exclusions(properties: Option<&Path>) -> Result<()> {
    let config = effective_config(properties)?;
    for host in ExclusionSet::parse(Some(config.excluded_dependency_targets.as_str())).iter() {
        println!("{}", host);
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Init { context, properties } => cmd_init(&context, properties.as_deref()).await?,
        Command::Config { properties, json } => cmd_config(properties.as_deref(), json)?,
        Command::Exclusions { properties } => cmd_exclusions(properties.as_deref())?,
        Command::Redact { identity } => {
            if let Some(token) = redact(Some(identity.as_str()), true) {
                println!("{}", token);
            }
        }
    }
    Ok(())
}
