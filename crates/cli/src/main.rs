//! NetworkState Command Line Interface
//!
//! Deploys a registry into a local data directory and submits signed calls
//! or reads against it.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use netstate_registry::NetworkStateRegistry;
use netstate_storage::SledStorage;
use netstate_types::{Address, Amount, RegistryCall, SignedCall, TerritoryId};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod keys;
mod settings;

use settings::CliConfig;

#[derive(Parser)]
#[command(name = "netstate")]
#[command(about = "NetworkState registry command line interface", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Data directory (overrides configuration)
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new signing key
    Keygen {
        /// Where to write the hex-encoded secret
        #[arg(long, value_name = "PATH")]
        out: PathBuf,
    },
    /// Deploy a new registry owned by the given key
    Deploy {
        #[arg(long, value_name = "PATH")]
        key: PathBuf,
    },
    /// Mint a territory (owner only)
    Mint {
        #[arg(long, value_name = "PATH")]
        key: PathBuf,
        /// Territory identifier
        #[arg(long)]
        id: u64,
        /// Human-readable name
        #[arg(long)]
        name: String,
        /// Price as a decimal amount, e.g. `1` or `0.25`
        #[arg(long)]
        price: String,
    },
    /// Join the community as the given key
    Join {
        #[arg(long, value_name = "PATH")]
        key: PathBuf,
    },
    /// Show a territory record
    Territory {
        id: u64,
    },
    /// Show a member record
    Member {
        address: String,
    },
    /// Show the registry owner and address
    Owner,
    /// List the event log
    Events,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = CliConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    init_logging(&config);

    match cli.command {
        Commands::Keygen { out } => {
            let key = keys::generate_key_file(&out)?;
            println!("{}", Address::from(&key.verifying_key()));
        }
        Commands::Deploy { key } => deploy(&config, &key)?,
        Commands::Mint {
            key,
            id,
            name,
            price,
        } => {
            let price = Amount::parse_units(&price)
                .with_context(|| format!("invalid price '{price}'"))?;
            let call = RegistryCall::MintTerritory {
                id: TerritoryId(id),
                name,
                price,
            };
            submit(&config, &key, call)?;
        }
        Commands::Join { key } => submit(&config, &key, RegistryCall::JoinCommunity)?,
        Commands::Territory { id } => {
            let registry = open_registry(&config)?;
            print_json(&registry.territory(TerritoryId(id)))?;
        }
        Commands::Member { address } => {
            let address: Address = address.parse().context("invalid member address")?;
            let registry = open_registry(&config)?;
            let member = registry.member(&address);
            print_json(&json!({
                "address": address,
                "exists": member.exists,
                "joined_at": member.joined_at,
            }))?;
        }
        Commands::Owner => {
            let registry = open_registry(&config)?;
            print_json(&registry.deployment())?;
        }
        Commands::Events => {
            let registry = open_registry(&config)?;
            print_json(&registry.events())?;
        }
    }

    Ok(())
}

fn init_logging(config: &CliConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "plain" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn open_storage(config: &CliConfig) -> Result<SledStorage> {
    SledStorage::new(&config.data_dir).with_context(|| {
        format!(
            "failed to open data directory {}",
            config.data_dir.display()
        )
    })
}

fn open_registry(config: &CliConfig) -> Result<NetworkStateRegistry> {
    let registry = NetworkStateRegistry::open(open_storage(config)?)?;
    Ok(registry)
}

fn deploy(config: &CliConfig, key_path: &Path) -> Result<()> {
    let key = keys::load_key_file(key_path)?;
    let deployer = Address::from(&key.verifying_key());

    info!("Starting deployment...");
    let registry = NetworkStateRegistry::deploy(deployer, open_storage(config)?)?;

    info!("Contract deployed, waiting for confirmation...");
    registry.flush()?;
    info!("Deployment confirmed.");

    println!("NetworkState deployed to: {}", registry.address());
    Ok(())
}

fn submit(config: &CliConfig, key_path: &Path, call: RegistryCall) -> Result<()> {
    let key = keys::load_key_file(key_path)?;
    let registry = open_registry(config)?;
    let signed = SignedCall::sign(&key, call);
    let name = signed.call.name();

    registry
        .submit(&signed)
        .with_context(|| format!("{name} rejected"))?;
    registry.flush()?;

    info!(call = name, sender = %signed.sender, "call applied");
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
