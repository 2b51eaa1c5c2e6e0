use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pnc-console")]
#[command(about = "Browse PNC build system lists with URL-synchronized paging, sorting and filtering")]
#[command(version)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Bearer token forwarded to the REST API
    #[arg(long, global = true, env = "PNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one page of a resource list
    List(ListArgs),
    /// Show the parameters a component reads from a query string
    Params {
        /// Query string, with or without the leading '?'
        search: String,
        /// Component whose parameters to extract (global scope when omitted)
        #[arg(long)]
        component: Option<String>,
        /// Print only this parameter's value
        #[arg(long)]
        key: Option<String>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// builds, products, projects, build-configs, group-configs or artifacts
    pub resource: String,
    /// Starting query string, as found in a console URL
    #[arg(long, default_value = "")]
    pub search: String,
    /// Filter expression, e.g. 'status==SUCCESS;name=like=%pnc%'
    #[arg(long)]
    pub query: Option<String>,
    /// Sort as 'attribute', 'attribute:asc', 'attribute:desc' or 'none'
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub page_size: Option<u32>,
    /// Namespace for the list's URL parameters
    #[arg(long)]
    pub component: Option<String>,
    /// Total attempts for transient failures (timeouts, 5xx)
    #[arg(long, default_value = "1")]
    pub retries: u32,
    /// JSON-lines file of push messages to apply to the fetched page
    #[arg(long)]
    pub updates: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set a value on the active profile
    Set {
        /// url, timeout_seconds or page_size
        key: String,
        value: String,
    },
}
