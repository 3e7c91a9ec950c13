//! End-to-end season build
//!
//! Reference data -> standings and schedule -> per-team logs -> box score
//! ratings -> differenced training table.

use crate::data::scrapers::boxscore::{fetch_boxscore, weighted_ratings};
use crate::data::scrapers::schedule::fetch_schedule;
use crate::data::scrapers::standings::{fetch_standings, Standings};
use crate::data::scrapers::{HttpPageSource, PageSource};
use crate::data::{CityTable, Database, RatingTable};
use crate::features::assembly::{join_sides, write_csv_file};
use crate::features::{FeatureRow, GameRow, TeamGameLog};
use crate::{Config, Game, HoopsError, Result};
use std::path::PathBuf;

/// Builds the training table of one season from a page source
pub struct SeasonPipeline<'a> {
    source: &'a dyn PageSource,
    cities: &'a CityTable,
    ratings: &'a RatingTable,
    year: u16,
}

impl<'a> SeasonPipeline<'a> {
    pub fn new(
        source: &'a dyn PageSource,
        cities: &'a CityTable,
        ratings: &'a RatingTable,
        year: u16,
    ) -> Self {
        SeasonPipeline {
            source,
            cities,
            ratings,
            year,
        }
    }

    /// Run every stage and return the rows sorted by date
    pub fn run(&self) -> Result<Vec<FeatureRow>> {
        log::info!(
            "Creating {}-{} season games data",
            self.year.saturating_sub(1),
            self.year
        );

        let standings = fetch_standings(self.source, self.year)?;
        let games = fetch_schedule(self.source, self.year, &standings, self.cities)?;

        log::info!("Looping over every team");
        let logs = build_team_logs(&standings, &games)?;
        let mut rows = join_logs(&logs);
        let kept = kept_games(&logs);
        if kept < games.len() {
            log::debug!(
                "{} games past the standings counts left out",
                games.len() - kept
            );
        }
        if rows.len() != kept {
            log::warn!("{} joined rows for {} kept games", rows.len(), kept);
        }

        self.add_ratings(&mut rows)?;

        Ok(rows.iter().map(GameRow::difference).collect())
    }

    /// Fetch each game's box score and attach both sides' weighted ratings
    fn add_ratings(&self, rows: &mut [GameRow]) -> Result<()> {
        let total = rows.len();
        for (i, row) in rows.iter_mut().enumerate() {
            log::info!(
                "[{}/{}] Processing {} vs. {}",
                i + 1,
                total,
                row.key.home_team,
                row.key.away_team
            );
            let boxscore = fetch_boxscore(
                self.source,
                &row.key.href,
                &row.key.home_team,
                &row.key.away_team,
            )?;
            row.home_ratings = weighted_ratings(&boxscore.home, self.ratings, self.year);
            row.away_ratings = weighted_ratings(&boxscore.away, self.ratings, self.year);
        }
        Ok(())
    }
}

/// One log per team, in standings order
pub fn build_team_logs(standings: &Standings, games: &[Game]) -> Result<Vec<TeamGameLog>> {
    standings
        .entries
        .iter()
        .map(|entry| {
            let log = TeamGameLog::build(&entry.code, games, entry.games())?;
            log::debug!("{}: {} games", entry.code, log.len());
            Ok(log)
        })
        .collect()
}

/// Games surviving truncation, counted once each from the home side
pub fn kept_games(logs: &[TeamGameLog]) -> usize {
    logs.iter()
        .map(|log| log.games.iter().filter(|g| g.is_home).count())
        .sum()
}

/// Pair every team's home rows with its opponents' away rows
pub fn join_logs(logs: &[TeamGameLog]) -> Vec<GameRow> {
    let mut homes = Vec::new();
    let mut aways = Vec::new();
    for log in logs {
        let (home, away) = log.split_home_away();
        homes.extend(home);
        aways.extend(away);
    }
    join_sides(homes, aways)
}

/// Options for a configured build
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Serve every page from the cache, never touching the network
    pub offline: bool,
}

/// Load reference data, scrape the configured season and write the CSV.
/// Returns the output path and the number of rows written.
pub fn build_training_data(config: &Config, options: &BuildOptions) -> Result<(PathBuf, usize)> {
    let cities = CityTable::load(&config.data.cities_path).map_err(|e| {
        HoopsError::Config(format!(
            "Failed to load cities from {}: {}",
            config.data.cities_path, e
        ))
    })?;
    let ratings = RatingTable::load(&config.data.ratings_path).map_err(|e| {
        HoopsError::Config(format!(
            "Failed to load ratings from {}: {}",
            config.data.ratings_path, e
        ))
    })?;

    let db = Database::open(&config.data.database_path)?;
    let source = HttpPageSource::new(&config.source)?
        .with_cache(&db)
        .offline_only(options.offline);

    let pipeline = SeasonPipeline::new(&source, &cities, &ratings, config.season.year);
    let rows = pipeline.run()?;

    let path = config.output_path();
    write_csv_file(&rows, &path)?;
    log::info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok((path, rows.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::scrapers::boxscore::tests::{boxscore_page, player_row, side_table};
    use crate::data::scrapers::schedule::tests::{game_row, schedule_page};
    use crate::data::scrapers::standings::tests::{standings_page, standings_row};
    use crate::data::scrapers::standings::StandingsEntry;
    use crate::data::scrapers::StaticPages;
    use crate::features::assembly::write_csv;
    use crate::features::team_log::tests::game;
    use crate::features::TeamFeatures;
    use crate::TeamCode;

    const CITIES: &str = "city,lat,lng,population\n\
        Boston,42.3188,-71.0852,4688346\n\
        New York,40.6943,-73.9249,18713220\n";

    const RATINGS: &str = "Player,ID,Year,MP,rVORP,rSKILL\n\
        Jayson Tatum,tatumja01,2021,2290,3.0,2.0\n\
        Kemba Walker,walkeke02,2021,1470,1.0,1.0\n\
        Julius Randle,randlju01,2021,2667,2.0,4.0\n";

    fn boxscore(home: &str, away: &str) -> String {
        let celtics = side_table(
            "BOS",
            &[
                player_row("tatumja01", "Jayson Tatum", Some("30:00")),
                player_row("walkeke02", "Kemba Walker", Some("10:00")),
                player_row("rookie01", "Unrated Rookie", Some("20:00")),
            ],
        );
        let knicks = side_table(
            "NYK",
            &[
                player_row("randlju01", "Julius Randle", Some("36:00")),
                player_row("noplay01", "Bench Player", None),
            ],
        );
        match (home, away) {
            ("BOS", "NYK") => boxscore_page(&celtics, &knicks),
            _ => boxscore_page(&knicks, &celtics),
        }
    }

    fn pages() -> StaticPages {
        let standings = standings_page(&[
            standings_row("Boston Celtics", "BOS", 2, 1),
            standings_row("New York Knicks", "NYK", 1, 2),
        ]);
        let december = schedule_page(
            2021,
            &["december", "january"],
            &[
                game_row(
                    "Wed, Dec 23, 2020",
                    "7:30p",
                    "New York Knicks",
                    Some(100),
                    "Boston Celtics",
                    Some(110),
                    Some("/boxscores/202012230BOS.html"),
                ),
                game_row(
                    "Sun, Dec 27, 2020",
                    "1:00p",
                    "Boston Celtics",
                    Some(99),
                    "New York Knicks",
                    Some(105),
                    Some("/boxscores/202012270NYK.html"),
                ),
            ],
        );
        let january = schedule_page(
            2021,
            &["december", "january"],
            &[
                game_row(
                    "Sat, Jan 2, 2021",
                    "7:00p",
                    "New York Knicks",
                    Some(101),
                    "Boston Celtics",
                    Some(120),
                    Some("/boxscores/202101020BOS.html"),
                ),
                game_row(
                    "Mon, Jan 4, 2021",
                    "7:00p",
                    "Boston Celtics",
                    None,
                    "New York Knicks",
                    None,
                    None,
                ),
            ],
        );

        StaticPages::new()
            .with_page("/leagues/NBA_2021_ratings.html", standings)
            .with_page("/leagues/NBA_2021_games.html", december)
            .with_page("/leagues/NBA_2021_games-january.html", january)
            .with_page("/boxscores/202012230BOS.html", boxscore("BOS", "NYK"))
            .with_page("/boxscores/202012270NYK.html", boxscore("NYK", "BOS"))
            .with_page("/boxscores/202101020BOS.html", boxscore("BOS", "NYK"))
    }

    fn run(pages: &StaticPages) -> Result<Vec<FeatureRow>> {
        let cities = CityTable::from_reader(CITIES.as_bytes())?;
        let ratings = RatingTable::from_reader(RATINGS.as_bytes())?;
        SeasonPipeline::new(pages, &cities, &ratings, 2021).run()
    }

    #[test]
    fn test_one_row_per_played_game() {
        let pages = pages();
        let rows = run(&pages).unwrap();

        assert_eq!(rows.len(), 3);
        let dates: Vec<_> = rows.iter().map(|r| r.key.date.to_string()).collect();
        assert_eq!(
            dates,
            vec![
                "2020-12-23 19:30:00",
                "2020-12-27 13:00:00",
                "2021-01-02 19:00:00"
            ]
        );
        assert_eq!(rows[1].points_diff, 6);
        assert_eq!(rows[0].home_games, 1);
        assert_eq!(rows[2].away_games, 3);
    }

    #[test]
    fn test_rating_and_travel_differences() {
        let pages = pages();
        let rows = run(&pages).unwrap();
        let rvorp = TeamFeatures::DIM;
        let dist = TeamFeatures::DIM - 1;

        // Celtics: (3*30 + 1*10) / 40 = 2.5, rookie unrated; Knicks: 2.0
        assert_eq!(rows[0].features[rvorp], Some(0.5));
        // Celtics rSKILL: (2*30 + 1*10) / 40 = 1.75; Knicks 4.0
        assert_eq!(rows[0].features[rvorp + 1], Some(-2.25));
        // Second game is in New York: both teams came from Boston
        assert_eq!(rows[1].features[dist], Some(0.0));
        assert!(rows[1].coords.unwrap().lat > 40.0);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let pages = pages();
        let mut first = Vec::new();
        let mut second = Vec::new();
        write_csv(&run(&pages).unwrap(), &mut first).unwrap();
        write_csv(&run(&pages).unwrap(), &mut second).unwrap();

        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_boxscore_aborts() {
        let cities = CityTable::from_reader(CITIES.as_bytes()).unwrap();
        let ratings = RatingTable::from_reader(RATINGS.as_bytes()).unwrap();
        let pages = pages().with_page("/boxscores/202101020BOS.html", "<html></html>");

        let err = SeasonPipeline::new(&pages, &cities, &ratings, 2021)
            .run()
            .unwrap_err();
        assert!(matches!(err, HoopsError::MissingTable { .. }));
    }

    #[test]
    fn test_team_logs_match_standings() {
        let pages = pages();
        let cities = CityTable::from_reader(CITIES.as_bytes()).unwrap();
        let standings = fetch_standings(&pages, 2021).unwrap();
        let games = fetch_schedule(&pages, 2021, &standings, &cities).unwrap();

        let logs = build_team_logs(&standings, &games).unwrap();
        for (log, entry) in logs.iter().zip(&standings.entries) {
            assert_eq!(log.len(), entry.games());
        }
        assert_eq!(join_logs(&logs).len(), games.len());
        assert_eq!(kept_games(&logs), games.len());
    }

    #[test]
    fn test_games_past_standings_are_not_counted() {
        let entry = |code: &str| StandingsEntry {
            name: code.to_string(),
            code: TeamCode::new(code),
            wins: 1,
            losses: 1,
        };
        let standings = Standings {
            entries: vec![entry("BOS"), entry("NYK")],
        };
        // Third meeting is a postseason game beyond the W+L counts
        let games = vec![
            game(1, 19, "BOS", "NYK", 110, 100),
            game(3, 20, "NYK", "BOS", 105, 99),
            game(9, 20, "BOS", "NYK", 101, 98),
        ];

        let logs = build_team_logs(&standings, &games).unwrap();
        assert_eq!(kept_games(&logs), 2);
        assert_eq!(join_logs(&logs).len(), kept_games(&logs));
    }

    #[test]
    fn test_season_zero_does_not_overflow() {
        let cities = CityTable::default();
        let ratings = RatingTable::default();
        let pages = StaticPages::new();

        let err = SeasonPipeline::new(&pages, &cities, &ratings, 0)
            .run()
            .unwrap_err();
        assert!(matches!(err, HoopsError::Scraper { .. }));
    }
}
