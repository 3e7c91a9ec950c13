//! Season schedule scraper
//!
//! The schedule landing page shows the first month of the season and links to
//! one page per remaining month. Every played row carries its own box score
//! link, which is read from the row itself and cross-checked against the
//! number of box score anchors in the table.

use super::standings::Standings;
use super::{is_header_row, selector, PageSource, StatCells};
use crate::data::reference::CityTable;
use crate::{Game, HoopsError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const ROW_STATS: [&str; 6] = [
    "date_game",
    "game_start_time",
    "visitor_team_name",
    "visitor_pts",
    "home_team_name",
    "home_pts",
];

/// Path of the schedule landing page
pub fn schedule_path(year: u16) -> String {
    format!("/leagues/NBA_{}_games.html", year)
}

/// A schedule row before team codes and locations are resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRow {
    pub date: NaiveDateTime,
    pub visitor: String,
    pub visitor_points: Option<u16>,
    pub home: String,
    pub home_points: Option<u16>,
    pub href: Option<String>,
}

impl ScheduleRow {
    pub fn is_played(&self) -> bool {
        self.href.is_some()
    }
}

/// One parsed schedule page
#[derive(Debug, Clone, Default)]
pub struct SchedulePage {
    pub rows: Vec<ScheduleRow>,
    pub month_links: Vec<String>,
}

/// Fetch every month of a season and resolve it into games, sorted by start time
pub fn fetch_schedule(
    source: &dyn PageSource,
    year: u16,
    standings: &Standings,
    cities: &CityTable,
) -> Result<Vec<Game>> {
    let path = schedule_path(year);
    log::info!("Fetching {}-{} schedule", year.saturating_sub(1), year);
    let first = parse_schedule_page(&source.fetch(&path)?, &path)?;

    let mut rows = first.rows;
    // The landing page already holds the first month
    for month in first.month_links.iter().skip(1) {
        log::debug!("Fetching month {}", month);
        let page = parse_schedule_page(&source.fetch(month)?, month)?;
        rows.extend(page.rows);
    }

    let games = resolve_games(rows, standings, cities)?;
    log::info!("Found {} played games", games.len());
    Ok(games)
}

/// Turn schedule rows into games: drop unplayed rows, map names to codes and
/// host cities, and stably sort by start time.
pub fn resolve_games(
    rows: Vec<ScheduleRow>,
    standings: &Standings,
    cities: &CityTable,
) -> Result<Vec<Game>> {
    let mut seen = HashSet::new();
    let mut games = Vec::new();

    for row in rows {
        let (href, home_points, away_points) =
            match (row.href, row.home_points, row.visitor_points) {
                (Some(href), Some(h), Some(v)) => (href, h, v),
                (None, None, None) => {
                    log::debug!("Skipping unplayed game {} at {}", row.visitor, row.home);
                    continue;
                }
                _ => {
                    return Err(HoopsError::Parse(format!(
                        "incomplete result for {} at {} on {}",
                        row.visitor, row.home, row.date
                    )))
                }
            };

        if !seen.insert((row.date, href.clone())) {
            log::warn!("Duplicate schedule entry {}", href);
            continue;
        }

        let (location, coords) = cities.locate_franchise(&row.home);
        games.push(Game {
            date: row.date,
            home_team: standings.code_for(&row.home)?,
            away_team: standings.code_for(&row.visitor)?,
            href,
            home_points,
            away_points,
            location,
            coords,
        });
    }

    games.sort_by_key(|g| g.date);
    Ok(games)
}

/// Parse the schedule table and month links of one page
pub fn parse_schedule_page(html: &str, url: &str) -> Result<SchedulePage> {
    let document = Html::parse_document(html);
    let table = document
        .select(&selector("table#schedule, table")?)
        .next()
        .ok_or_else(|| HoopsError::MissingTable {
            url: url.to_string(),
            table: "schedule".to_string(),
        })?;

    let time_pattern = Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([ap])m?$")
        .map_err(|e| HoopsError::Parse(e.to_string()))?;

    let cells = StatCells::new(&ROW_STATS)?;
    let link = selector("a[href]")?;

    let mut rows = Vec::new();
    for row in table.select(&selector("tbody tr")?) {
        if is_header_row(row) {
            continue;
        }
        rows.push(parse_row(row, url, &cells, &link, &time_pattern)?);
    }

    // Row/link alignment check: every box score anchor in the table must
    // have been claimed by exactly one row.
    let anchors = table
        .select(&link)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| is_boxscore_link(href))
        .count();
    let linked = rows.iter().filter(|r| r.is_played()).count();
    if anchors != linked {
        return Err(HoopsError::Scraper {
            url: url.to_string(),
            message: format!(
                "{} box score links for {} played rows",
                anchors, linked
            ),
        });
    }

    Ok(SchedulePage {
        rows,
        month_links: month_links(&document)?,
    })
}

fn parse_row(
    row: ElementRef,
    url: &str,
    cells: &StatCells,
    link: &Selector,
    time_pattern: &Regex,
) -> Result<ScheduleRow> {
    let malformed = |what: &str| HoopsError::Scraper {
        url: url.to_string(),
        message: format!("schedule row without {}", what),
    };

    let date_text = cells.text(row, "date_game")?.ok_or_else(|| malformed("date"))?;
    let time_text = cells
        .text(row, "game_start_time")?
        .filter(|t| !t.is_empty());
    let date = parse_game_time(&date_text, time_text.as_deref(), time_pattern)?;

    let visitor = cells
        .text(row, "visitor_team_name")?
        .ok_or_else(|| malformed("visitor"))?;
    let home = cells
        .text(row, "home_team_name")?
        .ok_or_else(|| malformed("home team"))?;
    let visitor_points = parse_points(cells.text(row, "visitor_pts")?)?;
    let home_points = parse_points(cells.text(row, "home_pts")?)?;

    let links: Vec<String> = row
        .select(link)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| is_boxscore_link(href))
        .map(str::to_string)
        .collect();
    if links.len() > 1 {
        return Err(malformed("a unique box score link"));
    }

    Ok(ScheduleRow {
        date,
        visitor,
        visitor_points,
        home,
        home_points,
        href: links.into_iter().next(),
    })
}

fn parse_points(text: Option<String>) -> Result<Option<u16>> {
    match text.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(t) => t
            .parse()
            .map(Some)
            .map_err(|_| HoopsError::Parse(format!("bad points value '{}'", t))),
    }
}

pub fn is_boxscore_link(href: &str) -> bool {
    href.contains("boxscores") && href.contains("html")
}

/// Links to the per-month schedule pages, in page order
pub fn month_links(document: &Html) -> Result<Vec<String>> {
    let mut links: Vec<String> = Vec::new();
    for a in document.select(&selector("a[href]")?) {
        let href = match a.value().attr("href") {
            Some(h) => h,
            None => continue,
        };
        let stem = href.split(".html").next().unwrap_or_default();
        let suffix = stem.rsplit('-').next().unwrap_or_default();
        if MONTHS.contains(&suffix) && !links.iter().any(|l| l == href) {
            links.push(href.to_string());
        }
    }
    Ok(links)
}

/// `Tue, Dec 22, 2020` + `7:00p` -> 2020-12-22 19:00:00.
/// A missing start time means midnight.
pub fn parse_game_time(
    date_text: &str,
    time_text: Option<&str>,
    time_pattern: &Regex,
) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date_text.trim(), "%a, %b %d, %Y")
        .map_err(|e| HoopsError::Parse(format!("bad game date '{}': {}", date_text, e)))?;

    let time = match time_text {
        None => NaiveTime::MIN,
        Some(t) => {
            let bad = || HoopsError::Parse(format!("bad start time '{}'", t));
            let caps = time_pattern.captures(t.trim()).ok_or_else(bad)?;
            let hour: u32 = caps[1].parse().map_err(|_| bad())?;
            let minute: u32 = caps[2].parse().map_err(|_| bad())?;
            let pm = caps[3].eq_ignore_ascii_case("p");
            let hour = match (hour % 12, pm) {
                (h, true) => h + 12,
                (h, false) => h,
            };
            NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(bad)?
        }
    };

    Ok(date.and_time(time))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::scrapers::standings::tests::{standings_page, standings_row};
    use crate::data::scrapers::standings::parse_standings;
    use crate::data::scrapers::StaticPages;
    use crate::TeamCode;

    pub(crate) fn game_row(
        date: &str,
        time: &str,
        visitor: &str,
        visitor_pts: Option<u16>,
        home: &str,
        home_pts: Option<u16>,
        href: Option<&str>,
    ) -> String {
        let pts = |p: Option<u16>| p.map(|p| p.to_string()).unwrap_or_default();
        let box_cell = href
            .map(|h| format!(r#"<a href="{}">Box Score</a>"#, h))
            .unwrap_or_default();
        format!(
            r#"<tr><th data-stat="date_game"><a href="/boxscores/index.fcgi?month=12">{date}</a></th>
               <td data-stat="game_start_time">{time}</td>
               <td data-stat="visitor_team_name"><a href="/teams/X/2021.html">{visitor}</a></td>
               <td data-stat="visitor_pts">{vp}</td>
               <td data-stat="home_team_name"><a href="/teams/Y/2021.html">{home}</a></td>
               <td data-stat="home_pts">{hp}</td>
               <td data-stat="box_score_text">{box_cell}</td></tr>"#,
            vp = pts(visitor_pts),
            hp = pts(home_pts),
        )
    }

    pub(crate) fn schedule_page(year: u16, months: &[&str], rows: &[String]) -> String {
        let links: String = months
            .iter()
            .map(|m| format!(r#"<a href="/leagues/NBA_{}_games-{}.html">{}</a>"#, year, m, m))
            .collect();
        format!(
            r#"<html><body><div class="filter">{links}</div>
               <table id="schedule"><thead><tr><th>Date</th></tr></thead>
               <tbody>{}</tbody></table></body></html>"#,
            rows.join("\n")
        )
    }

    fn pattern() -> Regex {
        Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([ap])m?$").unwrap()
    }

    #[test]
    fn test_parse_game_time() {
        let p = pattern();
        let t = parse_game_time("Tue, Dec 22, 2020", Some("7:00p"), &p).unwrap();
        assert_eq!(t.to_string(), "2020-12-22 19:00:00");

        let t = parse_game_time("Wed, Dec 23, 2020", Some("12:30p"), &p).unwrap();
        assert_eq!(t.to_string(), "2020-12-23 12:30:00");

        let t = parse_game_time("Wed, Dec 23, 2020", Some("12:05a"), &p).unwrap();
        assert_eq!(t.to_string(), "2020-12-23 00:05:00");

        let t = parse_game_time("Fri, Oct 12, 1979", None, &p).unwrap();
        assert_eq!(t.to_string(), "1979-10-12 00:00:00");

        assert!(parse_game_time("Tue, Dec 22, 2020", Some("noon"), &p).is_err());
    }

    #[test]
    fn test_parse_schedule_page() {
        let html = schedule_page(
            2021,
            &["december", "january"],
            &[
                game_row(
                    "Tue, Dec 22, 2020",
                    "7:00p",
                    "Golden State Warriors",
                    Some(99),
                    "Brooklyn Nets",
                    Some(125),
                    Some("/boxscores/202012220BRK.html"),
                ),
                r#"<tr class="thead"><th>Date</th></tr>"#.to_string(),
                game_row(
                    "Wed, Dec 23, 2020",
                    "8:00p",
                    "Brooklyn Nets",
                    None,
                    "Boston Celtics",
                    None,
                    None,
                ),
            ],
        );
        let page = parse_schedule_page(&html, "test").unwrap();

        assert_eq!(page.rows.len(), 2);
        assert_eq!(
            page.rows[0].href.as_deref(),
            Some("/boxscores/202012220BRK.html")
        );
        assert_eq!(page.rows[0].home_points, Some(125));
        assert!(!page.rows[1].is_played());
        assert_eq!(
            page.month_links,
            vec![
                "/leagues/NBA_2021_games-december.html",
                "/leagues/NBA_2021_games-january.html"
            ]
        );
    }

    #[test]
    fn test_stray_boxscore_link_is_rejected() {
        let mut html = schedule_page(
            2021,
            &[],
            &[game_row(
                "Tue, Dec 22, 2020",
                "7:00p",
                "Golden State Warriors",
                Some(99),
                "Brooklyn Nets",
                Some(125),
                Some("/boxscores/202012220BRK.html"),
            )],
        );
        // A promotional link inside the table breaks row/link alignment
        html = html.replace(
            "</tbody>",
            r#"</tbody><tfoot><tr><td><a href="/boxscores/promo.html">x</a></td></tr></tfoot>"#,
        );

        let err = parse_schedule_page(&html, "test").unwrap_err();
        assert!(matches!(err, HoopsError::Scraper { .. }));
    }

    #[test]
    fn test_fetch_schedule_concatenates_months() {
        let standings = parse_standings(
            &standings_page(&[
                standings_row("Brooklyn Nets", "BRK", 1, 1),
                standings_row("Boston Celtics", "BOS", 1, 1),
            ]),
            "test",
        )
        .unwrap();
        let cities = CityTable::from_reader(
            "city,lat,lng,population\nBrooklyn,40.6501,-73.9496,2600000\nBoston,42.3188,-71.0852,4688346\n"
                .as_bytes(),
        )
        .unwrap();

        let december = schedule_page(
            2021,
            &["december", "january"],
            &[game_row(
                "Wed, Dec 23, 2020",
                "7:30p",
                "Boston Celtics",
                Some(95),
                "Brooklyn Nets",
                Some(110),
                Some("/boxscores/202012230BRK.html"),
            )],
        );
        let january = schedule_page(
            2021,
            &["december", "january"],
            &[game_row(
                "Fri, Jan 1, 2021",
                "7:30p",
                "Brooklyn Nets",
                Some(101),
                "Boston Celtics",
                Some(104),
                Some("/boxscores/202101010BOS.html"),
            )],
        );
        let pages = StaticPages::new()
            .with_page("/leagues/NBA_2021_games.html", december)
            .with_page("/leagues/NBA_2021_games-january.html", january);

        let games = fetch_schedule(&pages, 2021, &standings, &cities).unwrap();

        assert_eq!(games.len(), 2);
        assert_eq!(games[0].home_team, TeamCode::new("BRK"));
        assert_eq!(games[0].location.as_deref(), Some("Brooklyn"));
        assert_eq!(games[1].home_team, TeamCode::new("BOS"));
        assert_eq!(games[1].coords.unwrap().lat, 42.3188);
        // December was served by the landing page, not fetched again
        assert!(!pages
            .requests()
            .iter()
            .any(|p| p.ends_with("december.html")));
    }

    fn brooklyn_standings() -> Standings {
        parse_standings(
            &standings_page(&[
                standings_row("Brooklyn Nets", "BRK", 1, 0),
                standings_row("Boston Celtics", "BOS", 0, 1),
            ]),
            "test",
        )
        .unwrap()
    }

    fn result_row(points: Option<(u16, u16)>, href: Option<&str>) -> ScheduleRow {
        ScheduleRow {
            date: NaiveDate::from_ymd_opt(2020, 12, 22)
                .unwrap()
                .and_hms_opt(19, 0, 0)
                .unwrap(),
            visitor: "Boston Celtics".to_string(),
            visitor_points: points.map(|p| p.1),
            home: "Brooklyn Nets".to_string(),
            home_points: points.map(|p| p.0),
            href: href.map(str::to_string),
        }
    }

    #[test]
    fn test_resolve_games_skips_duplicate_entries() {
        let link = Some("/boxscores/202012220BRK.html");
        let rows = vec![
            result_row(Some((125, 99)), link),
            result_row(Some((125, 99)), link),
            result_row(None, None),
        ];

        let games = resolve_games(rows, &brooklyn_standings(), &CityTable::default()).unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].home_team, TeamCode::new("BRK"));
        assert_eq!(games[0].away_team, TeamCode::new("BOS"));
    }

    #[test]
    fn test_resolve_games_rejects_partial_results() {
        let standings = brooklyn_standings();

        // Score posted without a box score link
        let err = resolve_games(
            vec![result_row(Some((125, 99)), None)],
            &standings,
            &CityTable::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HoopsError::Parse(_)));

        // Box score link without a score
        let err = resolve_games(
            vec![result_row(None, Some("/boxscores/202012220BRK.html"))],
            &standings,
            &CityTable::default(),
        )
        .unwrap_err();
        assert!(matches!(err, HoopsError::Parse(_)));
    }

    #[test]
    fn test_resolve_games_rejects_unknown_team() {
        let standings = parse_standings(
            &standings_page(&[standings_row("Brooklyn Nets", "BRK", 1, 0)]),
            "test",
        )
        .unwrap();
        let rows = vec![ScheduleRow {
            date: NaiveDate::from_ymd_opt(2020, 12, 22)
                .unwrap()
                .and_hms_opt(19, 0, 0)
                .unwrap(),
            visitor: "Seattle SuperSonics".to_string(),
            visitor_points: Some(90),
            home: "Brooklyn Nets".to_string(),
            home_points: Some(100),
            href: Some("/boxscores/x.html".to_string()),
        }];

        let err = resolve_games(rows, &standings, &CityTable::default()).unwrap_err();
        assert!(matches!(err, HoopsError::UnknownTeam(_)));
    }
}
