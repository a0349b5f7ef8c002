use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;

use api_fest::cli::{Cli, ClientArgs, Command};
use api_fest::client::{build_http_client, Adapter, AdapterSelector, ApiError};
use api_fest::config::ApiFestConfig;
use api_fest::metrics::Metrics;
use api_fest::model::{random_preset, CreateUserInput, Trace, Transport};
use api_fest::render::{render_trace, render_users};
use api_fest::server::{run_server, AppState};
use api_fest::store::UserStore;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = api_fest::config::load_config_lenient(&cli.config)?;

    let log_level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.server.log_level);
    api_fest::logging::init(log_level);

    match cli.command {
        Command::Serve { listen } => serve(&config, listen).await,
        Command::List(args) => {
            let session = Session::open(&config, &args)?;
            session.list().await
        }
        Command::Create {
            name,
            email,
            client,
        } => {
            let session = Session::open(&config, &client)?;
            session.create(CreateUserInput::new(name, email)).await
        }
        Command::Demo(args) => {
            let session = Session::open(&config, &args)?;
            let input = random_preset();
            tracing::info!(name = %input.name, email = %input.email, "Picked preset user");
            session.create(input).await
        }
    }
}

async fn serve(config: &ApiFestConfig, listen: Option<String>) -> anyhow::Result<()> {
    let addr = listen.unwrap_or_else(|| config.server.listen.clone());

    let metrics = if config.server.metrics_enabled {
        Some(Arc::new(
            Metrics::new().context("Failed to register metrics")?,
        ))
    } else {
        None
    };
    let state = AppState::new(Arc::new(UserStore::new()), metrics);

    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
        }
        token.cancel();
    });

    tracing::info!(listen = %addr, "api-fest backend starting");
    run_server(&addr, state, cancel).await
}

/// One client session: the selected adapter and how to print results.
struct Session {
    selector: AdapterSelector,
    transport: Transport,
    json: bool,
}

impl Session {
    fn open(config: &ApiFestConfig, args: &ClientArgs) -> anyhow::Result<Self> {
        let base_url = args
            .base_url
            .clone()
            .unwrap_or_else(|| config.client.base_url.clone());
        let transport = match args.transport {
            Some(t) => t,
            None => config.client.transport()?,
        };
        let client = build_http_client(Duration::from_secs(config.client.timeout_secs))
            .context("Failed to build HTTP client")?;
        let selector =
            AdapterSelector::new(client, &base_url, args.batch || config.client.trpc_batch);

        tracing::debug!(transport = %transport, base_url = %base_url, "Client session ready");
        Ok(Self {
            selector,
            transport,
            json: args.json,
        })
    }

    fn adapter(&self) -> &Adapter {
        self.selector.select(self.transport)
    }

    async fn list(&self) -> anyhow::Result<()> {
        match self.adapter().list_users().await {
            Ok(result) => {
                self.print_trace(&result.trace)?;
                if !self.json {
                    print!("{}", render_users(&result.data));
                }
                Ok(())
            }
            Err(e) => self.fail(e),
        }
    }

    async fn create(&self, input: CreateUserInput) -> anyhow::Result<()> {
        match self.adapter().create_user(&input).await {
            Ok(result) => {
                self.print_trace(&result.trace)?;
                if !self.json {
                    println!("Created user #{} ({})", result.data.id, result.data.name);
                }
            }
            Err(e) => return self.fail(e),
        }
        self.list().await
    }

    fn print_trace(&self, trace: &Trace) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(trace)?);
        } else {
            print!("{}", render_trace(Some(trace)));
        }
        Ok(())
    }

    fn fail(&self, error: ApiError) -> anyhow::Result<()> {
        self.print_trace(error.trace())?;
        Err(error.into())
    }
}
