mod config;
mod serve_cmd;
#[cfg(test)]
mod test_util;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sqlx::SqlitePool;

use studio_core::storage::StorageLayout;
use studio_core::tools::{self, ToolContext};
use studio_core::{inventory, reconcile};
use studio_db::pool;

use config::StudioConfig;

#[derive(Parser)]
#[command(name = "studio", about = "Art studio companion: supplies, projects and portfolio")]
struct Cli {
    /// Database URL (overrides STUDIO_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Data directory for uploads and exports (overrides STUDIO_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a studio config file (no database required)
    Init {
        /// SQLite connection URL
        #[arg(long, default_value = studio_db::config::DbConfig::DEFAULT_URL)]
        db_url: String,
        /// Directory for uploads, portfolio images and exported projects
        #[arg(long, default_value = config::DEFAULT_DATA_DIR)]
        data: PathBuf,
        /// Base URL of the Letta agent server
        #[arg(long, default_value = config::DEFAULT_AGENT_URL)]
        agent_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Create the database, run migrations and prepare the data directory
    DbInit,
    /// Start the web server
    Serve {
        /// Address to bind to
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
        /// Port to listen on
        #[arg(long, default_value_t = 5000)]
        port: u16,
    },
    /// List the agent tool catalog
    Tools,
    /// Invoke a single agent tool with JSON arguments
    Tool {
        /// Tool name, e.g. get_low_stock_supplies
        name: String,
        /// Arguments as a JSON object
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Show supplies at or below the low-stock threshold
    LowStock {
        /// Quantity threshold between 0 and 1
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Reconcile a project's materials against the inventory
    ShoppingList {
        /// Project ID
        project_id: String,
    },
}

/// Execute the `studio init` command: write a config file.
fn cmd_init(db_url: &str, data_dir: PathBuf, agent_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: Some(db_url.to_string()),
        },
        storage: config::StorageSection {
            data_dir: Some(data_dir.clone()),
        },
        agent: config::AgentSection {
            base_url: Some(agent_url.to_string()),
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!("  storage.data_dir = {}", data_dir.display());
    println!("  agent.base_url = {agent_url}");
    println!();
    println!("Next: run `studio db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `studio db-init` command: create database and run migrations.
async fn cmd_db_init(resolved: &StudioConfig) -> anyhow::Result<()> {
    println!("Initializing studio database...");

    let db_pool = open_pool(resolved).await?;

    StorageLayout::new(&resolved.data_dir).ensure()?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }
    println!("Data directory: {}", resolved.data_dir.display());

    db_pool.close().await;

    println!("studio db-init complete.");
    Ok(())
}

/// Connect to the database, creating and migrating it when needed.
async fn open_pool(resolved: &StudioConfig) -> anyhow::Result<SqlitePool> {
    pool::ensure_database_dir(&resolved.db_config)?;
    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;
    Ok(db_pool)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn cmd_tool(db_pool: &SqlitePool, resolved: &StudioConfig, name: &str, args: &str) -> anyhow::Result<()> {
    let args: serde_json::Value =
        serde_json::from_str(args).with_context(|| format!("invalid JSON arguments: {args}"))?;
    let ctx = ToolContext {
        pool: db_pool.clone(),
        storage: StorageLayout::new(&resolved.data_dir),
    };
    let result = tools::invoke(&ctx, name, args).await?;
    print_json(&result)
}

async fn cmd_low_stock(db_pool: &SqlitePool, threshold: Option<f64>) -> anyhow::Result<()> {
    let report = inventory::low_stock(db_pool, threshold).await?;
    if report.shopping_list.is_empty() {
        println!("All supplies are well stocked!");
        return Ok(());
    }
    println!(
        "{} supplies at or below {:.0}%:",
        report.total_low_stock,
        report.threshold * 100.0
    );
    for item in &report.shopping_list {
        let brand = item.brand.as_deref().unwrap_or("-");
        println!(
            "  {:<30} {:<12} {:>4.0}%  [{:?}]  {brand}",
            item.name,
            item.category.as_deref().unwrap_or("-"),
            item.current_quantity * 100.0,
            item.urgency,
        );
    }
    Ok(())
}

async fn cmd_shopping_list(db_pool: &SqlitePool, project_id: &str) -> anyhow::Result<()> {
    let id = uuid::Uuid::parse_str(project_id)
        .with_context(|| format!("invalid project ID: {project_id}"))?;
    let list = reconcile::generate_shopping_list(db_pool, id).await?;
    print_json(&list)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            data,
            agent_url,
            force,
        } => {
            cmd_init(&db_url, data, &agent_url, force)?;
        }
        command => {
            let resolved =
                StudioConfig::resolve(cli.database_url.as_deref(), cli.data_dir.as_deref());
            run_command(command, &resolved).await?;
        }
    }

    Ok(())
}

async fn run_command(command: Commands, resolved: &StudioConfig) -> anyhow::Result<()> {
    match command {
        Commands::Init { .. } => anyhow::bail!("init does not need a resolved config"),
        Commands::DbInit => {
            cmd_db_init(resolved).await?;
        }
        Commands::Serve { bind, port } => {
            serve_cmd::run_serve(resolved, &bind, port).await?;
        }
        Commands::Tools => {
            for tool in tools::catalog() {
                println!("{:<28} {:<12} {}", tool.name, tool.group, tool.description);
            }
        }
        Commands::Tool { name, args } => {
            let db_pool = open_pool(resolved).await?;
            let result = cmd_tool(&db_pool, resolved, &name, &args).await;
            db_pool.close().await;
            result?;
        }
        Commands::LowStock { threshold } => {
            let db_pool = open_pool(resolved).await?;
            let result = cmd_low_stock(&db_pool, threshold).await;
            db_pool.close().await;
            result?;
        }
        Commands::ShoppingList { project_id } => {
            let db_pool = open_pool(resolved).await?;
            let result = cmd_shopping_list(&db_pool, &project_id).await;
            db_pool.close().await;
            result?;
        }
    }
    Ok(())
}
