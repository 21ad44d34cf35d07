use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use surveyor::config::Config;
use surveyor::dashboard::list_surveys;
use surveyor::logging;
use surveyor::rest::{self, dto::CatalogResponse, ApiDoc, ApiState};

#[derive(Parser)]
#[command(name = "surveyor")]
#[command(about = "Survey authoring and anonymous response service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the REST API server
    Serve {
        /// Port to listen on (default: server.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Address to bind (default: server.host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Print the OpenAPI document
    Openapi {
        /// Emit YAML instead of JSON
        #[arg(long)]
        yaml: bool,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config,

    /// Print the built-in form reference data as JSON
    Catalog,

    /// List published surveys of an organization
    Surveys {
        /// Organization name (case-insensitive)
        organization: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;
    let logging_handle = logging::init_logging(&config, cli.debug)?;
    if let Some(path) = &logging_handle.log_file_path {
        tracing::debug!(path = %path.display(), "logging to file");
    }

    match cli.command {
        Commands::Serve { port, host } => cmd_serve(config, host, port).await?,
        Commands::Openapi { yaml, output } => cmd_openapi(yaml, output)?,
        Commands::Config => print!("{}", config.to_toml()?),
        Commands::Catalog => {
            println!("{}", serde_json::to_string_pretty(&CatalogResponse::build())?);
        }
        Commands::Surveys { organization } => cmd_surveys(config, &organization).await?,
    }

    Ok(())
}

async fn cmd_serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);
    tracing::info!(
        %host,
        port,
        public_origin = %config.server.public_origin,
        "starting surveyor"
    );

    let state = ApiState::from_config(config)?;
    rest::serve(state, &host, port).await
}

fn cmd_openapi(yaml: bool, output: Option<PathBuf>) -> Result<()> {
    let rendered = if yaml {
        ApiDoc::yaml().context("Failed to render OpenAPI YAML")?
    } else {
        ApiDoc::json().context("Failed to render OpenAPI JSON")?
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

async fn cmd_surveys(config: Config, organization: &str) -> Result<()> {
    let store = surveyor::store::from_config(&config.storage)
        .context("Failed to open survey storage")?;
    let entries = list_surveys(
        store.as_ref(),
        organization,
        &config.server.public_origin,
        Utc::now().date_naive(),
    )
    .await?;

    if entries.is_empty() {
        println!("No published surveys for '{}'", organization);
        return Ok(());
    }

    println!("{:<36} {:<8} {:>9}  {}", "ID", "STATUS", "RESPONSES", "NAME");
    for entry in entries {
        let status = serde_json::to_value(entry.status)?;
        println!(
            "{:<36} {:<8} {:>9}  {}",
            entry.id,
            status.as_str().unwrap_or_default(),
            entry.response_count,
            entry.name
        );
        println!("    {}", entry.link);
    }
    Ok(())
}
