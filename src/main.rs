use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use record_manager::config::{self, ApiConfig, ConfigError, Timeouts};
use record_manager::console;
use record_manager::controller::Controller;
use record_manager::fake_store::{self, FakeStore};
use record_manager::net::api::{ApiError, HttpRecordApi};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("could not build HTTP client: {0}")]
    Client(#[from] ApiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "record-manager", about = "Manage records in a remote REST collection")]
struct Cli {
    /// Collection URL; records live at `{base_url}/{id}`.
    #[arg(long, env = "RECORD_MANAGER_BASE_URL", default_value = config::DEFAULT_BASE_URL, global = true)]
    base_url: String,

    #[arg(long, env = "RECORD_MANAGER_REQUEST_TIMEOUT_SECS", default_value_t = config::DEFAULT_REQUEST_TIMEOUT_SECS, global = true)]
    request_timeout_secs: u64,

    #[arg(long, env = "RECORD_MANAGER_CONNECT_TIMEOUT_SECS", default_value_t = config::DEFAULT_CONNECT_TIMEOUT_SECS, global = true)]
    connect_timeout_secs: u64,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive console (default).
    Run,
    /// Serve an in-memory record store at `/records` for local use.
    FakeStore {
        #[arg(long, env = "RECORD_MANAGER_FAKE_PORT", default_value_t = 3000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let timeouts = Timeouts { request_secs: cli.request_timeout_secs, connect_secs: cli.connect_timeout_secs };
            let config = ApiConfig::new(&cli.base_url, timeouts)?;
            tracing::info!(base_url = %config.base_url, "record manager starting");
            let api = HttpRecordApi::new(config)?;
            console::run(Controller::new(api), BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;
        }
        Command::FakeStore { port } => {
            let listener = tokio::net::TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port))).await?;
            eprintln!("fake record store at http://127.0.0.1:{port}{}", fake_store::COLLECTION_PATH);
            fake_store::serve(listener, FakeStore::new()).await?;
        }
    }
    Ok(())
}
