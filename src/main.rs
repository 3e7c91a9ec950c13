//! NBA training data CLI
//!
//! Scrapes a season from basketball-reference.com and writes the per-game
//! feature table used for model training.

use clap::{Parser, Subcommand};
use hoops::{Config, Result};

#[derive(Parser)]
#[command(name = "hoops")]
#[command(about = "Build NBA per-game training data from basketball-reference", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape a season and write its training CSV
    Build {
        /// Season end year (2021 is the 2020-21 season)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        season: Option<u16>,
        /// Use only cached pages (no network requests)
        #[arg(long)]
        offline: bool,
        /// Output directory for the CSV
        #[arg(long)]
        output: Option<String>,
    },
    /// Page cache commands
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show cached page statistics
    Status,
    /// Remove every cached page
    Clear,
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Build {
            season,
            offline,
            output,
        } => commands::build(config, season, offline, output),
        Commands::Cache { action } => match action {
            CacheCommands::Status => commands::cache_status(&config),
            CacheCommands::Clear => commands::cache_clear(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}


mod commands {
    use super::*;
    use hoops::data::Database;
    use hoops::pipeline::{build_training_data, BuildOptions};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!(
            "  1. Put the cities table at {} and player ratings at {}",
            config.data.cities_path, config.data.ratings_path
        );
        println!("  2. Edit {} to pick the season", config_path);
        println!("  3. Run 'hoops build' to scrape and write the training data");

        Ok(())
    }

    pub fn build(
        mut config: Config,
        season: Option<u16>,
        offline: bool,
        output: Option<String>,
    ) -> Result<()> {
        if let Some(year) = season {
            config.season.year = year;
        }
        if let Some(dir) = output {
            config.data.output_dir = dir;
        }
        if offline {
            println!("Offline mode: using cached pages only");
        }

        let options = BuildOptions { offline };
        let (path, rows) = build_training_data(&config, &options)?;
        println!("Wrote {} games to {}", rows, path.display());

        Ok(())
    }

    pub fn cache_status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.get_stats()?;

        println!("Page Cache Status");
        println!("───────────────────────────────");
        println!("  Path:     {}", config.data.database_path);
        println!("  Pages:    {}", stats.page_count);
        println!("  Size:     {:.1} MB", stats.total_bytes as f64 / 1_048_576.0);
        if let (Some(oldest), Some(newest)) = (stats.oldest_fetch, stats.newest_fetch) {
            println!("  Fetched:  {} to {}", oldest, newest);
        }

        Ok(())
    }

    pub fn cache_clear(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let removed = db.clear_pages()?;
        println!("Removed {} cached pages", removed);

        Ok(())
    }
}
