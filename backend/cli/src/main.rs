mod bootstrap;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use orderdesk_channels::{ChannelAdapter, TelegramAdapter};
use orderdesk_config::ValidationReport;
use orderdesk_core::{OrderMachine, OrderService, SessionReaper};

use bootstrap::Runtime;

#[derive(Parser)]
#[command(name = "orderdesk")]
#[command(about = "OrderDesk: conversational order intake bot")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $ORDERDESK_CONFIG_DIR/config.yaml or ~/.orderdesk/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the bot
    Serve,
    /// Validate the config and print it with secrets masked
    CheckConfig,
    /// Print the catalog as customers will see it
    Catalog,
    /// Write a starter config file
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = cli
        .config
        .unwrap_or_else(|| orderdesk_config::config_file_path(&orderdesk_config::config_dir()));

    match cli.command {
        Commands::Serve => serve(&path).await,
        Commands::CheckConfig => check_config(&path).await,
        Commands::Catalog => print_catalog(&path).await,
        Commands::Init { force } => {
            orderdesk_config::write_config(&bootstrap::starter_config(), &path, force).await?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

async fn serve(path: &Path) -> Result<()> {
    let raw = orderdesk_config::load_config(path).await?;

    // Logging comes up before validation so config warnings are visible.
    orderdesk_logging::init_logger(&bootstrap::logger_config(&raw))?;

    let config = orderdesk_config::prepare(raw, &orderdesk_config::process_env())
        .context("OrderDesk cannot start")?;
    let token = config
        .bot_token()
        .context("telegram.botToken missing after validation")?
        .to_string();
    let operator = config
        .operator_chat_id()
        .context("operator.chatId missing after validation")?;

    let runtime = Runtime::from_config(&config)?;
    info!(
        items = runtime.catalog.len(),
        idle_ttl_secs = ?config.idle_ttl_secs(),
        operator,
        "Starting OrderDesk"
    );

    if let Some(interval) = bootstrap::reap_interval(&config) {
        tokio::spawn(SessionReaper::new(runtime.store.clone(), interval).run());
    }

    let adapter = TelegramAdapter::new(token).with_drop_pending_updates(config.drop_pending_updates());
    let machine = OrderMachine::new(runtime.catalog.clone(), runtime.store.clone());
    let service = Arc::new(OrderService::new(
        machine,
        Arc::new(adapter.sink()),
        Arc::new(adapter.notifier(operator)),
    ));

    info!(adapter = adapter.name(), "Bot is starting");
    adapter.start(service).await
}

async fn check_config(path: &Path) -> Result<()> {
    let raw = orderdesk_config::load_config(path).await?;
    let env = orderdesk_config::process_env();

    let config = orderdesk_config::resolve(raw, &env)?;

    let (shown, masked) = bootstrap::masked_view(&config)?;
    println!("{}", serde_json::to_string_pretty(&shown)?);
    if !masked.is_empty() {
        println!("masked: {}", masked.join(", "));
    }

    let report = orderdesk_config::validate(&config);
    print_report(&report);

    // Catalog construction catches anything validation let through.
    bootstrap::build_catalog(&config)?;

    if report.is_valid() {
        println!("Config OK: {}", path.display());
        Ok(())
    } else {
        anyhow::bail!("{} config error(s)", report.errors.len())
    }
}

fn print_report(report: &ValidationReport) {
    for warning in &report.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for error in &report.errors {
        println!("error:   {}: {}", error.path, error.message);
    }
}

async fn print_catalog(path: &Path) -> Result<()> {
    let config = orderdesk_config::load_config(path).await?;
    let catalog = bootstrap::build_catalog(&config)?;
    for entry in catalog.list() {
        println!("{:<20} {}", entry.id, entry.option_label());
    }
    Ok(())
}
