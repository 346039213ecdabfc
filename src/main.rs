mod config;
mod controller;
mod deferred;
mod domain;
mod error;
mod input;
mod notify;
mod remote;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use config::{config_file, init_local_taskin, save_config, Config};
use controller::{LifecycleSettings, TaskController};
use notify::LocalNotifier;
use remote::HttpTaskStore;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskin")]
#[command(about = "A task list with due-date reminders, backed by a REST task server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .taskin directory with a default config.toml
    Init,
    /// Fetch and print the task list
    List,
    /// List highlights, or delete one
    Highlights {
        /// Id of the highlight to delete
        #[arg(short, long)]
        delete: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Init) = cli.command {
        return init();
    }

    let config = config::resolve()?;
    init_tracing(&config.log_level);
    let store = HttpTaskStore::new(&config).context("Failed to build HTTP client")?;

    match cli.command {
        Some(Commands::List) => {
            let controller = TaskController::with_settings(
                Arc::new(store),
                Arc::new(LocalNotifier::new()),
                LifecycleSettings::from(&config),
            );
            controller
                .refresh()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("fetch tasks")))?;
            println!("{}", input::render_tasks(&controller.tasks(), Utc::now()));
            Ok(())
        }
        Some(Commands::Highlights { delete }) => highlights(&store, delete).await,
        Some(Commands::Init) | None => run_session(&config, store).await,
    }
}

fn init() -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let taskin_dir = init_local_taskin(&cwd)?;
    save_config(config_file(&taskin_dir), &Config::default())?;
    println!("Initialized taskin directory: {}", taskin_dir.display());
    println!();
    println!("Edit {} to point at your task server.", config_file(&taskin_dir).display());
    Ok(())
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn highlights(store: &HttpTaskStore, delete: Option<String>) -> Result<()> {
    if let Some(id) = delete {
        store
            .delete_highlight(&id)
            .await
            .with_context(|| format!("Failed to delete highlight {}", id))?;
        println!("Deleted highlight {}", id);
        return Ok(());
    }

    let highlights = store.list_highlights().await.context("Failed to fetch highlights")?;
    if highlights.is_empty() {
        println!("No highlights.");
    }
    for h in highlights {
        println!("{}  {}  {}", h.id, h.task_description, h.image_path);
    }
    Ok(())
}

async fn run_session(config: &Config, store: HttpTaskStore) -> Result<()> {
    notify::desktop::init_presentation(config.presentation);
    info!(api = %config.api_base_url, "starting session");

    let platform = Arc::new(LocalNotifier::new());
    let controller = TaskController::with_settings(
        Arc::new(store),
        Arc::clone(&platform),
        LifecycleSettings::from(config),
    );

    match controller.refresh().await {
        Ok(()) => println!("{}", input::render_tasks(&controller.tasks(), Utc::now())),
        Err(e) => eprintln!("{}", e.user_message("fetch tasks")),
    }
    println!("Type 'help' for commands.");

    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };
    let ended = input::run_session(&controller, BufReader::new(tokio::io::stdin()), interrupt).await;
    match &ended {
        Ok(end) => info!(?end, "session ended"),
        Err(e) => warn!(error = %e, "session ended on stdin error"),
    }

    let pending = controller.pending_deletes();
    if !pending.is_empty() {
        warn!(count = pending.len(), "exiting with deferred deletes pending, they will not run");
    }
    controller.shutdown();
    info!(count = platform.pending_count(), "cancelling outstanding reminders");
    platform.shutdown();
    ended.context("Failed to read stdin")?;
    Ok(())
}
