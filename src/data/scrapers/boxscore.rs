//! Box score scraper and minutes-weighted player ratings

use super::{element_text, is_header_row, selector, PageSource, StatCells};
use crate::data::ratings::RatingTable;
use crate::{HoopsError, Result, TeamCode};
use scraper::{ElementRef, Html, Selector};

/// Minutes played by one player in one game
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerLine {
    /// basketball-reference player id, e.g. `tatumja01`
    pub id: String,
    pub name: String,
    pub minutes: f64,
}

/// Both sides' player lines for a game
#[derive(Debug, Clone, PartialEq)]
pub struct BoxScore {
    pub home: Vec<PlayerLine>,
    pub away: Vec<PlayerLine>,
}

/// Minutes-weighted rating averages for one side
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SideRatings {
    pub rvorp: Option<f64>,
    pub rskill: Option<f64>,
}

/// Fetch and parse the box score of a game
pub fn fetch_boxscore(
    source: &dyn PageSource,
    href: &str,
    home: &TeamCode,
    away: &TeamCode,
) -> Result<BoxScore> {
    let html = source.fetch(href)?;
    parse_boxscore(&html, href, home, away)
}

pub fn parse_boxscore(html: &str, url: &str, home: &TeamCode, away: &TeamCode) -> Result<BoxScore> {
    let document = Html::parse_document(html);
    Ok(BoxScore {
        home: parse_side(&document, url, home)?,
        away: parse_side(&document, url, away)?,
    })
}

/// Player lines from the `box-{CODE}-game-basic` table
fn parse_side(document: &Html, url: &str, team: &TeamCode) -> Result<Vec<PlayerLine>> {
    let table_id = format!("{}-game-basic", team);
    let table = document
        .select(&selector("table[id]")?)
        .find(|t| t.value().id().map_or(false, |id| id.contains(&table_id)))
        .ok_or_else(|| HoopsError::MissingTable {
            url: url.to_string(),
            table: table_id.clone(),
        })?;

    let cells = StatCells::new(&["mp"])?;
    let player_link = selector("[data-stat=\"player\"] a[href]")?;

    let mut players = Vec::new();
    for row in table.select(&selector("tbody tr")?) {
        if is_header_row(row) {
            continue;
        }
        players.push(parse_player_row(row, url, &cells, &player_link)?);
    }
    Ok(players)
}

fn parse_player_row(
    row: ElementRef,
    url: &str,
    cells: &StatCells,
    player_link: &Selector,
) -> Result<PlayerLine> {
    let link = row
        .select(player_link)
        .next()
        .ok_or_else(|| HoopsError::Scraper {
            url: url.to_string(),
            message: "box score row without player link".to_string(),
        })?;
    let href = link.value().attr("href").unwrap_or_default();
    let id = player_id_from_href(href).ok_or_else(|| HoopsError::Scraper {
        url: url.to_string(),
        message: format!("bad player link '{}'", href),
    })?;

    // Players who did not play have a `reason` cell instead of minutes
    let minutes = match cells.text(row, "mp")? {
        Some(mp) => parse_minutes(&mp)?,
        None => 0.0,
    };

    Ok(PlayerLine {
        id,
        name: element_text(link),
        minutes,
    })
}

/// `/players/t/tatumja01.html` -> `tatumja01`
pub fn player_id_from_href(href: &str) -> Option<String> {
    if !href.contains("player") {
        return None;
    }
    href.rsplit('/')
        .next()
        .and_then(|file| file.split('.').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// `MM:SS` -> fractional minutes. Sentinels like `Did Not Play` and anything
/// else without a colon count as zero.
pub fn parse_minutes(text: &str) -> Result<f64> {
    let text = text.trim();
    let (mins, secs) = match text.split_once(':') {
        Some(parts) => parts,
        None => return Ok(0.0),
    };
    let bad = || HoopsError::Parse(format!("bad minutes value '{}'", text));
    let mins: u32 = mins.trim().parse().map_err(|_| bad())?;
    let secs: f64 = secs.trim().parse().map_err(|_| bad())?;
    Ok(mins as f64 + secs / 60.0)
}

/// `sum(rating * minutes) / sum(minutes)` over the rated players of a side.
/// Unrated players are left out; a side with no rated minutes has no value.
pub fn weighted_ratings(players: &[PlayerLine], ratings: &RatingTable, year: u16) -> SideRatings {
    let mut minutes = 0.0;
    let mut rvorp = 0.0;
    let mut rskill = 0.0;

    for player in players {
        match ratings.get(&player.id, year) {
            Some(r) => {
                minutes += player.minutes;
                rvorp += r.rvorp * player.minutes;
                rskill += r.rskill * player.minutes;
            }
            None => log::debug!("No {} rating for {} ({})", year, player.name, player.id),
        }
    }

    if minutes > 0.0 {
        SideRatings {
            rvorp: Some(rvorp / minutes),
            rskill: Some(rskill / minutes),
        }
    } else {
        SideRatings::default()
    }
}
