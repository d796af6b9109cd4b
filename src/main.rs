mod classify;
mod config;
mod db;
mod engine;
mod export;
mod extract;
mod normalize;
mod page;
mod record;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::info;

use config::{RunConfig, BASE_URL, DEFAULT_DB_PATH, DEFAULT_MAX_PAGES, DEFAULT_USER_AGENT};

#[derive(Parser)]
#[command(name = "mdl_scraper", about = "MyDramaList top-shows scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the top-shows catalog and extract one record per drama
    Run {
        /// Index pages to walk
        #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_PAGES)]
        pages: u32,
        /// Insert records into the SQLite store
        #[arg(long)]
        persist: bool,
        /// Also write completed records to a JSON file
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
        #[arg(long, default_value = DEFAULT_USER_AGENT)]
        user_agent: String,
    },
    /// Scrape completed-drama lists for the given users
    UserList {
        /// Comma-separated usernames
        #[arg(long)]
        users: String,
        /// Insert ratings into the SQLite store
        #[arg(long)]
        persist: bool,
        /// Also write ratings to a JSON file
        #[arg(long)]
        json: Option<PathBuf>,
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
        #[arg(long, default_value = DEFAULT_USER_AGENT)]
        user_agent: String,
    },
    /// Show row counts in the store
    Stats {
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db_path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            pages,
            persist,
            json,
            db_path,
            user_agent,
        } => {
            let cfg = RunConfig {
                base_url: BASE_URL.to_string(),
                pages,
                persist,
                db_path,
                json_out: json,
                user_agent,
            };
            let conn = open_store(&cfg)?;
            let stats = engine::run_crawl(&cfg, conn.as_ref()).await?;
            stats.print();
            Ok(())
        }
        Commands::UserList {
            users,
            persist,
            json,
            db_path,
            user_agent,
        } => {
            let users: Vec<String> = users
                .split(',')
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect();
            if users.is_empty() {
                anyhow::bail!("no usernames given");
            }
            let cfg = RunConfig {
                base_url: BASE_URL.to_string(),
                pages: 0, // list scrapes do not walk the index
                persist,
                db_path,
                json_out: json,
                user_agent,
            };
            let conn = open_store(&cfg)?;
            let ratings = engine::run_user_lists(&cfg, &users, conn.as_ref()).await?;
            println!("Scraped {} ratings for {} user(s)", ratings.len(), users.len());
            Ok(())
        }
        Commands::Stats { db_path } => {
            let conn = db::connect(&db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Dramas:       {}", s.dramas);
            println!("User ratings: {}", s.user_ratings);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Resolve the persistence flag into a ready-to-use connection, or none.
fn open_store(cfg: &RunConfig) -> anyhow::Result<Option<rusqlite::Connection>> {
    if !cfg.persist {
        info!("Persistence disabled");
        return Ok(None);
    }
    let conn = db::connect(&cfg.db_path)?;
    db::init_schema(&conn)?;
    info!("Persistence enabled ({})", cfg.db_path.display());
    Ok(Some(conn))
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
