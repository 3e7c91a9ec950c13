//! Per-game table: joins both teams' views of a game, adds player ratings and
//! differences every feature home minus away.

use super::team_log::{SideRow, TeamFeatures};
use crate::data::scrapers::boxscore::SideRatings;
use crate::{Coordinates, GameKey, Result};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

/// Rating columns appended after the team features
pub const RATING_NAMES: [&str; 2] = ["rVORP", "rSKILL"];

/// One physical game with both teams' pre-game features
#[derive(Debug, Clone, PartialEq)]
pub struct GameRow {
    pub key: GameKey,
    pub coords: Option<Coordinates>,
    pub home: SideRow,
    pub away: SideRow,
    pub home_ratings: SideRatings,
    pub away_ratings: SideRatings,
}

impl GameRow {
    pub fn points_diff(&self) -> i32 {
        self.key.home_points as i32 - self.key.away_points as i32
    }

    /// Collapse every home/away feature pair into `home - away`
    pub fn difference(&self) -> FeatureRow {
        let mut home = self.home.features.to_vec();
        home.extend([self.home_ratings.rvorp, self.home_ratings.rskill]);
        let mut away = self.away.features.to_vec();
        away.extend([self.away_ratings.rvorp, self.away_ratings.rskill]);

        let features = home
            .into_iter()
            .zip(away)
            .map(|(h, a)| match (h, a) {
                (Some(h), Some(a)) => Some(h - a),
                _ => None,
            })
            .collect();

        FeatureRow {
            key: self.key.clone(),
            home_games: self.home.game_index,
            away_games: self.away.game_index,
            home_won: self.home.won,
            away_won: self.away.won,
            coords: self.coords,
            points_diff: self.points_diff(),
            features,
        }
    }
}

/// One output row of the training table
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub key: GameKey,
    pub home_games: usize,
    pub away_games: usize,
    pub home_won: bool,
    pub away_won: bool,
    pub coords: Option<Coordinates>,
    pub points_diff: i32,
    /// `home - away` for each of `FeatureRow::feature_names()`
    pub features: Vec<Option<f64>>,
}

impl FeatureRow {
    pub fn feature_names() -> Vec<&'static str> {
        TeamFeatures::NAMES
            .iter()
            .chain(RATING_NAMES.iter())
            .copied()
            .collect()
    }

    pub fn header() -> Vec<&'static str> {
        let mut header = vec![
            "Date", "href", "Home", "Away", "G_home", "G_away", "PTS_home", "PTS_away", "W_home",
            "W_away", "lat", "lng", "PTS_diff",
        ];
        header.extend(Self::feature_names());
        header
    }

    fn record(&self) -> Vec<String> {
        let flag = |b: bool| (if b { "1" } else { "0" }).to_string();
        let mut record = vec![
            self.key.date.format("%Y-%m-%d %H:%M:%S").to_string(),
            self.key.href.clone(),
            self.key.home_team.to_string(),
            self.key.away_team.to_string(),
            self.home_games.to_string(),
            self.away_games.to_string(),
            self.key.home_points.to_string(),
            self.key.away_points.to_string(),
            flag(self.home_won),
            flag(self.away_won),
            format_value(self.coords.map(|c| c.lat)),
            format_value(self.coords.map(|c| c.lng)),
            self.points_diff.to_string(),
        ];
        record.extend(self.features.iter().map(|v| format_value(*v)));
        record
    }
}

/// Missing values become empty fields; whole numbers keep a `.0`
fn format_value(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{:.1}", v),
        Some(v) => v.to_string(),
    }
}

/// Inner-join home-game rows with away-game rows on the game identity,
/// sorted by start time (ties by box score link).
pub fn join_sides(homes: Vec<SideRow>, aways: Vec<SideRow>) -> Vec<GameRow> {
    let mut away_by_key: HashMap<GameKey, SideRow> =
        aways.into_iter().map(|r| (r.key.clone(), r)).collect();

    let mut rows = Vec::with_capacity(homes.len());
    for home in homes {
        match away_by_key.remove(&home.key) {
            Some(away) => rows.push(GameRow {
                key: home.key.clone(),
                coords: home.coords,
                home,
                away,
                home_ratings: SideRatings::default(),
                away_ratings: SideRatings::default(),
            }),
            None => log::warn!("No away-side row for {}", home.key.href),
        }
    }
    for key in away_by_key.keys() {
        log::warn!("No home-side row for {}", key.href);
    }

    rows.sort_by(|a, b| (a.key.date, &a.key.href).cmp(&(b.key.date, &b.key.href)));
    rows
}

/// Write the training table as CSV
pub fn write_csv<W: Write>(rows: &[FeatureRow], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(FeatureRow::header())?;
    for row in rows {
        wtr.write_record(row.record())?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the training table to a file, creating parent directories
pub fn write_csv_file<P: AsRef<Path>>(rows: &[FeatureRow], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_csv(rows, file)
}
