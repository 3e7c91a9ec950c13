//! Per-team game logs and their pre-game features

use super::rolling::{shifted_expanding_mean, shifted_rolling_mean, shifted_streak};
use super::travel::shifted_distances;
use crate::{Coordinates, Game, GameKey, HoopsError, Result, TeamCode};

/// Trailing windows (in games) for the lagged NRtg and W/L features
pub const LAGS: [usize; 3] = [5, 10, 25];

/// A team's form going into a game, from earlier games only
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamFeatures {
    /// Mean point differential over the season so far
    pub net_rating: Option<f64>,
    /// Mean point differential over the last 5/10/25 games
    pub net_rating_lag: [Option<f64>; 3],
    /// Win rate over the season so far
    pub win_rate: Option<f64>,
    /// Win rate over the last 5/10/25 games
    pub win_rate_lag: [Option<f64>; 3],
    /// Signed current run (positive = wins)
    pub streak: Option<i32>,
    /// Days since the previous game
    pub rest_days: Option<f64>,
    /// km from the previous game's host city
    pub distance_km: Option<f64>,
}

impl TeamFeatures {
    /// Number of features in this struct
    pub const DIM: usize = 11;

    /// Output column names, in `to_vec` order
    pub const NAMES: [&'static str; Self::DIM] = [
        "NRtg", "NRtg_5", "NRtg_10", "NRtg_25", "W/L", "W/L_5", "W/L_10", "W/L_25", "Streak",
        "Rest", "Dist",
    ];

    /// Convert to flat vector
    pub fn to_vec(&self) -> Vec<Option<f64>> {
        let mut v = Vec::with_capacity(Self::DIM);
        v.push(self.net_rating);
        v.extend(self.net_rating_lag);
        v.push(self.win_rate);
        v.extend(self.win_rate_lag);
        v.push(self.streak.map(f64::from));
        v.push(self.rest_days);
        v.push(self.distance_km);
        v
    }
}

/// One game from a single team's point of view
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGame {
    pub game: Game,
    /// 1-based position in the team's season
    pub index: usize,
    pub is_home: bool,
    pub opponent: TeamCode,
    pub points_for: u16,
    pub points_against: u16,
    pub won: bool,
    pub features: TeamFeatures,
}

impl TeamGame {
    pub fn margin(&self) -> f64 {
        self.points_for as f64 - self.points_against as f64
    }
}

/// A team's game in the shape it takes in the joined per-game table
#[derive(Debug, Clone, PartialEq)]
pub struct SideRow {
    pub key: GameKey,
    pub coords: Option<Coordinates>,
    pub game_index: usize,
    pub won: bool,
    pub features: TeamFeatures,
}

/// Chronological log of one team's completed games
#[derive(Debug, Clone)]
pub struct TeamGameLog {
    pub team: TeamCode,
    pub games: Vec<TeamGame>,
}

impl TeamGameLog {
    /// Build the log of `team` from the season schedule (sorted by date),
    /// keeping exactly its first `expected_games` games.
    pub fn build(team: &TeamCode, schedule: &[Game], expected_games: usize) -> Result<Self> {
        let mut games: Vec<TeamGame> = Vec::with_capacity(expected_games);

        for game in schedule.iter().filter(|g| g.involves(team)) {
            if games.len() == expected_games {
                break;
            }
            let (is_home, opponent, points_for, points_against) = match game.is_home(team) {
                Some(true) => (true, &game.away_team, game.home_points, game.away_points),
                _ => (false, &game.home_team, game.away_points, game.home_points),
            };
            games.push(TeamGame {
                game: game.clone(),
                index: games.len() + 1,
                is_home,
                opponent: opponent.clone(),
                points_for,
                points_against,
                won: points_for > points_against,
                features: TeamFeatures::default(),
            });
        }

        if games.len() < expected_games {
            return Err(HoopsError::Parse(format!(
                "{} has {} games in the schedule but {} in the standings",
                team,
                games.len(),
                expected_games
            )));
        }

        let mut log = TeamGameLog {
            team: team.clone(),
            games,
        };
        log.compute_features();
        Ok(log)
    }

    fn compute_features(&mut self) {
        let margins: Vec<f64> = self.games.iter().map(TeamGame::margin).collect();
        let wins: Vec<f64> = self
            .games
            .iter()
            .map(|g| if g.won { 1.0 } else { 0.0 })
            .collect();
        let results: Vec<bool> = self.games.iter().map(|g| g.won).collect();
        let coords: Vec<Option<Coordinates>> = self.games.iter().map(|g| g.game.coords).collect();

        let net_rating = shifted_expanding_mean(&margins);
        let win_rate = shifted_expanding_mean(&wins);
        let net_rating_lag: Vec<Vec<Option<f64>>> = LAGS
            .iter()
            .map(|&n| shifted_rolling_mean(&margins, n))
            .collect();
        let win_rate_lag: Vec<Vec<Option<f64>>> = LAGS
            .iter()
            .map(|&n| shifted_rolling_mean(&wins, n))
            .collect();
        let streak = shifted_streak(&results);
        let distance = shifted_distances(&coords);

        for k in 0..self.games.len() {
            let rest_days = k.checked_sub(1).map(|p| {
                let gap = self.games[k].game.date - self.games[p].game.date;
                gap.num_seconds() as f64 / 86_400.0
            });

            self.games[k].features = TeamFeatures {
                net_rating: net_rating[k],
                net_rating_lag: [net_rating_lag[0][k], net_rating_lag[1][k], net_rating_lag[2][k]],
                win_rate: win_rate[k],
                win_rate_lag: [win_rate_lag[0][k], win_rate_lag[1][k], win_rate_lag[2][k]],
                streak: streak[k],
                rest_days,
                distance_km: distance[k],
            };
        }
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Split into (home games, away games) rows keyed by the physical game
    pub fn split_home_away(&self) -> (Vec<SideRow>, Vec<SideRow>) {
        let (home, away): (Vec<&TeamGame>, Vec<&TeamGame>) =
            self.games.iter().partition(|g| g.is_home);
        let to_rows = |games: Vec<&TeamGame>| -> Vec<SideRow> {
            games
                .into_iter()
                .map(|g| SideRow {
                    key: g.game.key(),
                    coords: g.game.coords,
                    game_index: g.index,
                    won: g.won,
                    features: g.features,
                })
                .collect()
        };
        (to_rows(home), to_rows(away))
    }
}
