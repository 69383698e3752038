//! hal-cli: browse a HAL+JSON service from the command line.
//!
//! ```text
//! hal-cli --url http://localhost:8080 get /parents/1
//! hal-cli list /parents
//! hal-cli follow /parents/1 children
//! hal-cli post /parents '{"name":"Homer"}'
//! ```
//!
//! Relative URIs resolve against the configured location.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use hal_client::config::{load_config, ClientConfig, Configuration};
use hal_client::error::ClientError;
use hal_client::hal::{resolve_href, Resource};
use hal_client::observability::logging::init_logging;
use hal_client::observability::metrics::describe_metrics;
use hal_client::remote::{ReqwestTransport, RestOperations};
use hal_client::Entity;

#[derive(Parser)]
#[command(name = "hal-cli")]
#[command(about = "Browse a HAL+JSON REST service", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Service location; overrides `client.location`
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one resource
    Get { uri: String },
    /// Fetch every member of a collection
    List { uri: String },
    /// Fetch a resource, then follow links by relation name
    Follow {
        uri: String,
        #[arg(required = true)]
        rels: Vec<String>,
    },
    /// Create a resource and print its location
    Post { uri: String, body: String },
}

/// Untyped resource content.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct Document(Map<String, Value>);

impl Entity for Document {
    const KIND: &'static str = "Document";
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(url) = &cli.url {
        settings.client.location = url.clone();
    }
    init_logging(&settings.observability)?;
    describe_metrics();

    let transport = ReqwestTransport::new(&settings.timeouts)?;
    let configuration = Arc::new(Configuration::from_config(&settings)?);
    let ops = RestOperations::new(Arc::new(transport), configuration.clone());
    let base = configuration.base_uri().clone();

    tracing::debug!(location = %base, "hal-cli starting");

    match cli.command {
        Commands::Get { uri } => {
            let uri = resolve_href(&uri, &base)?;
            let resource = fetch(&ops, &uri).await?;
            print_json(&resource.to_hal()?)?;
        }
        Commands::List { uri } => {
            let uri = resolve_href(&uri, &base)?;
            let members = ops
                .get_resources::<Document>(&uri)
                .await?
                .iter()
                .map(Resource::to_hal)
                .collect::<Result<Vec<_>, _>>()?;
            print_json(&Value::Array(members))?;
        }
        Commands::Follow { uri, rels } => {
            let mut uri = resolve_href(&uri, &base)?;
            let mut resource = fetch(&ops, &uri).await?;
            for rel in &rels {
                let link = resource
                    .links()
                    .get(rel)
                    .ok_or_else(|| ClientError::no_such_link(rel))?;
                uri = resolve_href(&link.expand(), &base)?;
                tracing::debug!(rel = %rel, uri = %uri, "Following link");
                resource = fetch(&ops, &uri).await?;
            }
            print_json(&resource.to_hal()?)?;
        }
        Commands::Post { uri, body } => {
            let uri = resolve_href(&uri, &base)?;
            let body: Value = serde_json::from_str(&body)?;
            let location = ops.post_for_location(&uri, &body).await?;
            println!("{}", location);
        }
    }

    Ok(())
}

async fn fetch(ops: &RestOperations, uri: &Url) -> Result<Resource<Document>, ClientError> {
    ops.get_resource::<Document>(uri)
        .await?
        .ok_or_else(|| ClientError::protocol(format!("{} not found", uri)))
}

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
