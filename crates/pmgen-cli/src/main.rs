mod config;
mod generate_cmd;
mod plan_cmds;

use clap::{Parser, Subcommand};

use pmgen_db::pool;

use config::PmgenConfig;

#[derive(Parser)]
#[command(name = "pmgen", about = "Preventive maintenance plan generator")]
struct Cli {
    /// Database URL (overrides PMGEN_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a pmgen config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/pmgen")]
        db_url: String,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the pmgen database (requires config file or env vars)
    DbInit,
    /// Generate a maintenance plan from an intake TOML file
    Generate {
        /// Path to the intake TOML file
        file: String,
        /// Print the plan without persisting it
        #[arg(long)]
        no_save: bool,
        /// Override the generation model
        #[arg(long)]
        model: Option<String>,
    },
    /// Print the generation prompt for an intake file without calling anything
    Prompt {
        /// Path to the intake TOML file
        file: String,
    },
    /// Plan management
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Show plan details (or list all plans)
    Show {
        /// Plan ID to show (omit to list all)
        plan_id: Option<String>,
    },
    /// Export a plan and its tasks as JSON
    Export {
        /// Plan ID to export
        plan_id: String,
        /// Output file path (defaults to stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Delete a plan and all its tasks
    Delete {
        /// Plan ID to delete
        plan_id: String,
    },
}

/// Execute the `pmgen init` command: write config file.
fn cmd_init(db_url: &str, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        generation: config::GenerationSection::default(),
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    println!();
    println!("Set your API key via PMGEN_API_KEY or [generation].api_key in the config file.");
    println!("Next: run `pmgen db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `pmgen db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = PmgenConfig::resolve(cli_db_url, None)?;

    println!("Initializing pmgen database...");

    pool::ensure_database_exists(&resolved.db_config).await?;

    let db_pool = pool::create_pool(&resolved.db_config).await?;
    pool::run_migrations(&db_pool).await?;

    let counts = pool::table_counts(&db_pool).await?;
    println!("Database ready. Tables:");
    for (table, count) in &counts {
        println!("  {table}: {count} rows");
    }

    db_pool.close().await;

    println!("pmgen db-init complete.");
    Ok(())
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
        Commands::Init { db_url, force } => {
            cmd_init(&db_url, force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Generate {
            file,
            no_save,
            model,
        } => {
            let resolved = PmgenConfig::resolve(cli.database_url.as_deref(), model.as_deref())?;
            generate_cmd::run_generate(&resolved, &file, no_save).await?;
        }
        Commands::Prompt { file } => {
            generate_cmd::run_prompt(&file)?;
        }
        Commands::Plan { command } => {
            let resolved = PmgenConfig::resolve(cli.database_url.as_deref(), None)?;
            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let result = plan_cmds::run_plan_command(command, &db_pool).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
