use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use http_services::services::{placeholder_descriptors, PLACEHOLDER_BASE_URL};
use http_services::{
    placeholder_registry, ApiError, GroupRule, HttpServices, PostService, ServiceRegistry,
    ServicesConfig, TodoService,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Query the JSON placeholder API through grouped service clients")]
struct Opts {
    /// TOML file declaring groups, rules and bindings
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Point every group at this base URL
    #[arg(long, short = 'u')]
    base_url: Option<String>,

    #[command(subcommand)]
    resource: Resource,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Resource {
    Todos {
        #[command(subcommand)]
        action: Action,
    },
    Posts {
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Action {
    /// List every record
    List,
    /// Fetch one record by id
    Get { id: u32 },
    /// List the records owned by a user
    ByUser { user_id: u32 },
    /// Delete one record by id
    Delete { id: u32 },
}

fn registry(opts: &Opts) -> Result<ServiceRegistry, ApiError> {
    let mut registry = match &opts.config {
        Some(path) => {
            let config = ServicesConfig::load(path)?;
            let mut registry = ServiceRegistry::new();
            config.configure(&mut registry, placeholder_descriptors()?)?;
            registry
        }
        None => placeholder_registry(PLACEHOLDER_BASE_URL)?,
    };
    if let Some(base_url) = &opts.base_url {
        registry.apply_rule(&GroupRule::for_groups("*").base_url(base_url))?;
    }
    Ok(registry)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value).map_err(|e| ApiError::SerializationError(e.to_string()))
}

fn run(opts: &Opts, services: &HttpServices) -> Result<String, ApiError> {
    match &opts.resource {
        Resource::Todos { action } => {
            let todos = TodoService::resolve(services)?;
            match action {
                Action::List => to_json(&todos.find_all()?),
                Action::Get { id } => to_json(&todos.find_by_id(*id)?),
                Action::ByUser { user_id } => to_json(&todos.find_by_user(*user_id)?),
                Action::Delete { id } => todos.delete(*id).map(|()| format!("deleted todo {id}")),
            }
        }
        Resource::Posts { action } => {
            let posts = PostService::resolve(services)?;
            match action {
                Action::List => to_json(&posts.find_all()?),
                Action::Get { id } => to_json(&posts.find_by_id(*id)?),
                Action::ByUser { user_id } => to_json(&posts.find_by_user(*user_id)?),
                Action::Delete { id } => posts.delete(*id).map(|()| format!("deleted post {id}")),
            }
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();
    let result = registry(&opts)
        .and_then(ServiceRegistry::build)
        .and_then(|services| run(&opts, &services));

    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(%err, "request failed");
            ExitCode::FAILURE
        }
    }
}
