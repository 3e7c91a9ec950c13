//! Per-season player ratings (rVORP / rSKILL)

use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Team code used for a traded player's season-total row
const SEASON_TOTAL_TEAM: &str = "TOT";

/// One player's ratings for one season
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerRating {
    #[serde(rename = "Player", default)]
    pub name: String,
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Year")]
    pub year: u16,
    #[serde(rename = "Tm", default)]
    pub team: Option<String>,
    #[serde(rename = "MP", default)]
    pub minutes: Option<f64>,
    #[serde(rename = "rVORP")]
    pub rvorp: f64,
    #[serde(rename = "rSKILL")]
    pub rskill: f64,
}

/// Ratings indexed by (player id, season)
#[derive(Debug, Clone, Default)]
pub struct RatingTable {
    ratings: HashMap<(String, u16), PlayerRating>,
}

impl RatingTable {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let table = Self::from_reader(file)?;
        log::info!(
            "Loaded {} player ratings from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(rdr);
        let mut rows = Vec::new();
        for result in reader.deserialize::<PlayerRating>() {
            rows.push(result?);
        }
        Ok(Self::from_ratings(rows))
    }

    /// Index ratings; a player listed several times in a season keeps the
    /// season-total row if present, otherwise the first row.
    pub fn from_ratings(rows: Vec<PlayerRating>) -> Self {
        let mut ratings: HashMap<(String, u16), PlayerRating> = HashMap::new();

        for row in rows {
            let key = (row.id.clone(), row.year);
            match ratings.get(&key) {
                None => {
                    ratings.insert(key, row);
                }
                Some(existing) => {
                    let is_total = row.team.as_deref() == Some(SEASON_TOTAL_TEAM);
                    let existing_is_total =
                        existing.team.as_deref() == Some(SEASON_TOTAL_TEAM);
                    if is_total && !existing_is_total {
                        ratings.insert(key, row);
                    } else {
                        log::debug!("Duplicate rating for {} in {}", row.id, row.year);
                    }
                }
            }
        }

        RatingTable { ratings }
    }

    pub fn get(&self, player_id: &str, year: u16) -> Option<&PlayerRating> {
        self.ratings.get(&(player_id.to_string(), year))
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }
}
