use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ocipol::config::Config;
use ocipol::oci::http::format_oci_error;
use ocipol::oci::ConfigSessionFactory;
use ocipol::policy::{load_policy_file, Policy};
use ocipol::resource::{get_all_resource_keys, get_resource};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Declarative resource policies for Oracle Cloud Infrastructure
#[derive(Parser, Debug)]
#[command(name = "ocipol", version, about, long_about = None)]
struct Args {
    /// Log level for debugging
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Write logs to a file instead of stderr (defaults to <config dir>/ocipol/ocipol.log)
    #[arg(long, global = true, num_args = 0..=1, value_name = "PATH")]
    log_file: Option<Option<PathBuf>>,

    /// Configuration file (defaults to <config dir>/ocipol/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run every policy in a policy file
    Run {
        /// Policy file (YAML or JSON)
        file: PathBuf,

        /// Compartment to enumerate resources in
        #[arg(short, long)]
        compartment: Option<String>,

        /// OCI region to use
        #[arg(short, long)]
        region: Option<String>,

        /// Service endpoint override
        #[arg(long)]
        endpoint: Option<String>,

        /// Evaluate filters and plan actions without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Resources processed concurrently per policy
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Check a policy file without calling OCI
    Validate {
        /// Policy file (YAML or JSON)
        file: PathBuf,
    },
    /// List supported resource types
    Resources,
    /// Show the effective configuration
    Config {
        /// Persist region and compartment to the config file
        #[arg(long)]
        save: bool,

        #[arg(short, long)]
        compartment: Option<String>,

        #[arg(short, long)]
        region: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

/// Default log file location
fn default_log_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ocipol").join("ocipol.log"))
}

fn setup_logging(
    level: LogLevel,
    log_file: Option<Option<PathBuf>>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.as_str().to_lowercase()));

    let log_file = match log_file {
        Some(Some(path)) => Some(path),
        Some(None) => default_log_path(),
        None => None,
    };

    let Some(log_path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
        return Ok(None);
    };

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ocipol started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.clone())?;

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load(),
    };

    match args.command {
        Command::Run {
            file,
            compartment,
            region,
            endpoint,
            dry_run,
            concurrency,
        } => {
            // CLI > config > environment > OCI config profile
            let mut config = config;
            if compartment.is_some() {
                config.compartment_id = compartment;
            }
            if region.is_some() {
                config.region = region;
            }
            if endpoint.is_some() {
                config.endpoint = endpoint;
            }
            if let Some(concurrency) = concurrency {
                config.concurrency = concurrency;
            }
            run_policies(&file, config, dry_run).await
        },
        Command::Validate { file } => validate_policies(&file),
        Command::Resources => {
            for key in get_all_resource_keys() {
                if let Some(def) = get_resource(key) {
                    println!("{:<24} {:<28} {}", key, def.update_action_name(), def.display_name);
                }
            }
            Ok(())
        },
        Command::Config {
            save,
            compartment,
            region,
        } => {
            let mut config = config;
            if compartment.is_some() {
                config.compartment_id = compartment;
            }
            if region.is_some() {
                config.region = region;
            }

            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "profile": config.profile(),
                    "region": config.effective_region(),
                    "compartment_id": config.effective_compartment(),
                    "endpoint": config.effective_endpoint(),
                    "config_file": Config::config_path(),
                }))?
            );

            if save {
                match &args.config {
                    Some(path) => config.save_to(path)?,
                    None => config.save()?,
                }
                tracing::info!("Configuration saved");
            }
            Ok(())
        },
    }
}

async fn run_policies(file: &Path, config: Config, dry_run: bool) -> Result<()> {
    let specs = load_policy_file(file).with_context(|| format!("Failed to load {:?}", file))?;
    let options = config.execution_options(dry_run);
    let factory = ConfigSessionFactory::new(config);

    let policies = Policy::load_all(&specs, &factory, "cli", options).map_err(|e| {
        let context = if e.is_construction_error() {
            format!("Invalid policy in {:?}", file)
        } else {
            format!("Could not set up the policies in {:?}", file)
        };
        anyhow::Error::new(e).context(context)
    })?;

    let mut failed = 0;
    for mut policy in policies {
        match policy.run().await {
            Ok(run) => {
                if !run.is_success() {
                    failed += 1;
                }
                println!("{}", serde_json::to_string_pretty(&run.summary())?);
            },
            Err(e) => {
                failed += 1;
                tracing::error!("policy {} failed: {}", policy.name(), e);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "policy": policy.name(),
                        "error": format_oci_error(&e),
                    }))?
                );
            },
        }
    }

    if failed > 0 {
        anyhow::bail!("{} policies did not complete cleanly", failed);
    }
    Ok(())
}

fn validate_policies(file: &Path) -> Result<()> {
    let specs = load_policy_file(file).with_context(|| format!("Failed to load {:?}", file))?;

    // A placeholder session: construction never reaches the network
    let session = ocipol::oci::SessionContext::new("us-ashburn-1", "ocid1.compartment.oc1..validate");
    for spec in &specs {
        let spec_value = serde_json::to_value(spec)?;
        Policy::load(&spec_value, session.clone(), Default::default())
            .with_context(|| format!("Invalid policy {}", spec.name))?;
        println!("{}: ok", spec.name);
    }

    println!("{} policies valid", specs.len());
    Ok(())
}
