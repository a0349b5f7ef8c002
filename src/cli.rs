use clap::{Args, Parser, Subcommand};

use crate::model::Transport;

#[derive(Parser)]
#[command(
    name = "api-fest",
    version,
    about = "One user store, four wire protocols: REST, GraphQL, JSON-RPC and tRPC"
)]
pub struct Cli {
    /// Path to api-fest.toml config file
    #[arg(long, default_value = "api-fest.toml", env = "API_FEST_CONFIG")]
    pub config: String,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the backend with all four protocol routers
    Serve {
        /// Address to bind, overriding server.listen
        #[arg(long)]
        listen: Option<String>,
    },
    /// List users over the selected transport
    List(ClientArgs),
    /// Create a user, then list all users
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[command(flatten)]
        client: ClientArgs,
    },
    /// Create a random preset user, then list all users
    Demo(ClientArgs),
}

#[derive(Args, Clone)]
pub struct ClientArgs {
    /// rest, graphql, jsonrpc or trpc (defaults to client.transport)
    #[arg(long, short)]
    pub transport: Option<Transport>,

    /// Backend base URL, overriding client.base_url
    #[arg(long)]
    pub base_url: Option<String>,

    /// Send tRPC calls through the batching link
    #[arg(long)]
    pub batch: bool,

    /// Print traces as JSON instead of panels
    #[arg(long)]
    pub json: bool,
}
