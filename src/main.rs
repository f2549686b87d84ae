//! servectl - manage model deployments on a serving backend.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use servectl::backends::get_deploy_client;
use servectl::config::DeploymentConfig;
use servectl::logs::{init_logging, LogLevel, LogOptions};
use servectl::records::DeploymentRecord;

/// Marker token prefixing structured get/list output so downstream
/// tooling can split and parse it
const RECORD_MARKER: &str = "deploy:";

#[derive(Parser)]
#[command(name = "servectl")]
#[command(about = "Manage model deployments on a serving backend")]
#[command(version)]
struct Cli {
    /// Log level for diagnostics on stderr
    #[arg(long, global = true, default_value = "warn")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new deployment
    Create {
        /// Deployment target backend
        #[arg(short = 't', long, env = "SERVECTL_TARGET")]
        target: String,

        /// Deployment name, `name` or `name/version`
        #[arg(long)]
        name: String,

        /// Model artifact reference, relative to the backend's model store
        #[arg(short = 'm', long)]
        model_uri: String,

        /// Model packaging flavor
        #[arg(short = 'f', long)]
        flavor: Option<String>,

        /// Backend config override, repeatable
        #[arg(short = 'C', long = "config", value_name = "KEY=VALUE")]
        config: Vec<String>,
    },

    /// Update an existing deployment's configuration or artifact
    Update {
        #[arg(short = 't', long, env = "SERVECTL_TARGET")]
        target: String,

        /// Deployment name, `name` or `name/version`
        #[arg(long)]
        name: String,

        /// Replacement artifact for artifact-replacing updates
        #[arg(short = 'm', long)]
        model_uri: Option<String>,

        #[arg(short = 'f', long)]
        flavor: Option<String>,

        /// Backend config override, repeatable
        #[arg(short = 'C', long = "config", value_name = "KEY=VALUE")]
        config: Vec<String>,
    },

    /// Remove a version, or every version for a bare name
    Delete {
        #[arg(short = 't', long, env = "SERVECTL_TARGET")]
        target: String,

        #[arg(long)]
        name: String,
    },

    /// List all live deployments
    List {
        #[arg(short = 't', long, env = "SERVECTL_TARGET")]
        target: String,
    },

    /// Show one deployment, or all versions with `name/all`
    Get {
        #[arg(short = 't', long, env = "SERVECTL_TARGET")]
        target: String,

        #[arg(long)]
        name: String,
    },

    /// Send a JSON payload to a deployment's inference endpoint
    Predict {
        #[arg(short = 't', long, env = "SERVECTL_TARGET")]
        target: String,

        #[arg(long)]
        name: String,

        /// File holding the JSON inference payload
        #[arg(long)]
        input_path: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_options = LogOptions {
        log_level: cli.log_level.clone(),
        ..Default::default()
    };
    if let Err(e) = init_logging(log_options) {
        eprintln!("Failed to initialize logging: {e}");
    }

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Create {
            target,
            name,
            model_uri,
            flavor,
            config,
        } => {
            let config = DeploymentConfig::parse(&config)?;
            let client = get_deploy_client(&target)?;
            let record = client
                .create_deployment(&name, &model_uri, flavor.as_deref(), &config)
                .await?;
            println!("{}", render_created(flavor.as_deref(), &record));
        }
        Commands::Update {
            target,
            name,
            model_uri,
            flavor,
            config,
        } => {
            let config = DeploymentConfig::parse(&config)?;
            let client = get_deploy_client(&target)?;
            client
                .update_deployment(&name, model_uri.as_deref(), flavor.as_deref(), &config)
                .await?;
            println!("{}", render_updated(&name, flavor.as_deref()));
        }
        Commands::Delete { target, name } => {
            let client = get_deploy_client(&target)?;
            client.delete_deployment(&name).await?;
            println!("{}", render_deleted(&name));
        }
        Commands::List { target } => {
            let client = get_deploy_client(&target)?;
            let records = client.list_deployments().await?;
            println!("{}", render_records(&records)?);
        }
        Commands::Get { target, name } => {
            let client = get_deploy_client(&target)?;
            let records = client.get_deployment(&name).await?;
            println!("{}", render_records(&records)?);
        }
        Commands::Predict {
            target,
            name,
            input_path,
        } => {
            let raw = std::fs::read_to_string(&input_path)?;
            let input: serde_json::Value = serde_json::from_str(&raw)?;
            let client = get_deploy_client(&target)?;
            let result = client.predict(&name, &input).await?;
            println!("{}", result.body);
        }
    }
    Ok(())
}

fn flavor_marker(flavor: Option<&str>) -> &str {
    flavor.unwrap_or("None")
}

fn render_created(flavor: Option<&str>, record: &DeploymentRecord) -> String {
    format!(
        "{} deployment {}/{} is created",
        flavor_marker(flavor),
        record.model_name,
        record.model_version
    )
}

fn render_updated(name: &str, flavor: Option<&str>) -> String {
    format!(
        "Deployment {} is updated (with flavor {})",
        name,
        flavor_marker(flavor)
    )
}

fn render_deleted(name: &str) -> String {
    format!("Deployment {} is deleted", name)
}

fn render_records(records: &[DeploymentRecord]) -> Result<String, serde_json::Error> {
    Ok(format!(
        "{} {}",
        RECORD_MARKER,
        serde_json::to_string(records)?
    ))
}
