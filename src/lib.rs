//! NBA training data builder
//!
//! Scrapes a season of games and box scores from basketball-reference.com and
//! turns them into one row of home-minus-away rolling features per game.

pub mod data;
pub mod features;
pub mod pipeline;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Short franchise code used by basketball-reference (e.g. `BOS`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamCode(pub String);

impl TeamCode {
    pub fn new(code: impl Into<String>) -> Self {
        TeamCode(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A completed game from the season schedule
#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub date: NaiveDateTime,
    pub home_team: TeamCode,
    pub away_team: TeamCode,
    /// Relative box score link, e.g. `/boxscores/202012220BRK.html`
    pub href: String,
    pub home_points: u16,
    pub away_points: u16,
    /// Host city of the home team, if the franchise is mapped
    pub location: Option<String>,
    pub coords: Option<Coordinates>,
}

impl Game {
    /// Returns the point margin (positive = home win)
    pub fn margin(&self) -> i32 {
        self.home_points as i32 - self.away_points as i32
    }

    /// Check if a team was playing at home
    pub fn is_home(&self, team: &TeamCode) -> Option<bool> {
        if *team == self.home_team {
            Some(true)
        } else if *team == self.away_team {
            Some(false)
        } else {
            None
        }
    }

    pub fn involves(&self, team: &TeamCode) -> bool {
        self.is_home(team).is_some()
    }

    /// Get the opponent for a given team
    pub fn opponent(&self, team: &TeamCode) -> Option<&TeamCode> {
        match self.is_home(team)? {
            true => Some(&self.away_team),
            false => Some(&self.home_team),
        }
    }

    /// Get score for a specific team
    pub fn points_for(&self, team: &TeamCode) -> Option<u16> {
        match self.is_home(team)? {
            true => Some(self.home_points),
            false => Some(self.away_points),
        }
    }

    /// Get score against a specific team
    pub fn points_against(&self, team: &TeamCode) -> Option<u16> {
        match self.is_home(team)? {
            true => Some(self.away_points),
            false => Some(self.home_points),
        }
    }

    /// Identity of the physical game, shared by both teams' logs
    pub fn key(&self) -> GameKey {
        GameKey {
            date: self.date,
            href: self.href.clone(),
            home_team: self.home_team.clone(),
            away_team: self.away_team.clone(),
            home_points: self.home_points,
            away_points: self.away_points,
        }
    }
}

/// Columns that jointly identify one physical game
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameKey {
    pub date: NaiveDateTime,
    pub href: String,
    pub home_team: TeamCode,
    pub away_team: TeamCode,
    pub home_points: u16,
    pub away_points: u16,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum HoopsError {
    #[error("Scraping {url} failed: {message}")]
    Scraper { url: String, message: String },

    #[error("Table '{table}' not found on {url}")]
    MissingTable { url: String, table: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, HoopsError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub season: SeasonConfig,
    pub source: SourceConfig,
    pub data: DataConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeasonConfig {
    /// Calendar year the season ends in (2021 = the 2020-21 season)
    pub year: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    /// Minimum gap between network requests
    pub request_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub cities_path: String,
    pub ratings_path: String,
    pub database_path: String,
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            season: SeasonConfig { year: 2021 },
            source: SourceConfig {
                base_url: "https://www.basketball-reference.com".to_string(),
                user_agent: "hoops-training-data/0.1".to_string(),
                timeout_secs: 30,
                request_delay_ms: 2000,
            },
            data: DataConfig {
                cities_path: "data/uscities.csv".to_string(),
                ratings_path: "data/player_ratings.csv".to_string(),
                database_path: "data/hoops.db".to_string(),
                output_dir: ".".to_string(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HoopsError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| HoopsError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| HoopsError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Where the training table for the configured season is written
    pub fn output_path(&self) -> PathBuf {
        PathBuf::from(&self.data.output_dir).join(format!("training_data_{}.csv", self.season.year))
    }
}
