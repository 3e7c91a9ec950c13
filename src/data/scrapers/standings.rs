//! Season standings: team codes and completed game counts

use super::{element_text, is_header_row, selector, PageSource, StatCells};
use crate::{HoopsError, Result, TeamCode};
use scraper::{ElementRef, Html, Selector};

/// Path of the team ratings page, which lists every team with W/L
pub fn standings_path(year: u16) -> String {
    format!("/leagues/NBA_{}_ratings.html", year)
}

/// One team's line in the standings
#[derive(Debug, Clone, PartialEq)]
pub struct StandingsEntry {
    pub name: String,
    pub code: TeamCode,
    pub wins: u32,
    pub losses: u32,
}

impl StandingsEntry {
    /// Games completed so far
    pub fn games(&self) -> usize {
        (self.wins + self.losses) as usize
    }
}

/// Teams of a season in table order
#[derive(Debug, Clone, Default)]
pub struct Standings {
    pub entries: Vec<StandingsEntry>,
}

impl Standings {
    /// Code for a full franchise name
    pub fn code_for(&self, name: &str) -> Result<TeamCode> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.code.clone())
            .ok_or_else(|| HoopsError::UnknownTeam(name.to_string()))
    }

    /// Wins + losses for a team code
    pub fn expected_games(&self, code: &TeamCode) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.code == *code)
            .map(StandingsEntry::games)
    }

    pub fn codes(&self) -> impl Iterator<Item = &TeamCode> {
        self.entries.iter().map(|e| &e.code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fetch and parse the standings for a season
pub fn fetch_standings(source: &dyn PageSource, year: u16) -> Result<Standings> {
    let path = standings_path(year);
    log::info!("Fetching {}-{} standings", year.saturating_sub(1), year);
    let html = source.fetch(&path)?;
    let standings = parse_standings(&html, &path)?;
    log::info!("Found {} teams", standings.len());
    Ok(standings)
}

/// Parse the first table of a ratings page
pub fn parse_standings(html: &str, url: &str) -> Result<Standings> {
    let document = Html::parse_document(html);
    let table = document
        .select(&selector("table")?)
        .next()
        .ok_or_else(|| HoopsError::MissingTable {
            url: url.to_string(),
            table: "ratings".to_string(),
        })?;

    let cells = StatCells::new(&["wins", "losses"])?;
    let team_link = selector("[data-stat=\"team_name\"] a[href]")?;

    let mut entries = Vec::new();
    for row in table.select(&selector("tbody tr")?) {
        if is_header_row(row) {
            continue;
        }
        entries.push(parse_row(row, url, &cells, &team_link)?);
    }

    if entries.is_empty() {
        return Err(HoopsError::Scraper {
            url: url.to_string(),
            message: "standings table has no teams".to_string(),
        });
    }

    Ok(Standings { entries })
}

fn parse_row(
    row: ElementRef,
    url: &str,
    cells: &StatCells,
    team_link: &Selector,
) -> Result<StandingsEntry> {
    let malformed = |what: &str| HoopsError::Scraper {
        url: url.to_string(),
        message: format!("standings row without {}", what),
    };

    let link = row
        .select(team_link)
        .next()
        .ok_or_else(|| malformed("team link"))?;
    let name = element_text(link);
    let href = link.value().attr("href").unwrap_or_default();
    let code = team_code_from_href(href).ok_or_else(|| malformed("team code"))?;

    let wins = parse_count(cells.text(row, "wins")?, "wins")?;
    let losses = parse_count(cells.text(row, "losses")?, "losses")?;

    Ok(StandingsEntry {
        name,
        code,
        wins,
        losses,
    })
}

fn parse_count(text: Option<String>, what: &str) -> Result<u32> {
    let text = text.ok_or_else(|| HoopsError::Parse(format!("missing {}", what)))?;
    text.parse()
        .map_err(|_| HoopsError::Parse(format!("bad {} value '{}'", what, text)))
}

/// `/teams/BOS/2021.html` -> `BOS`
pub fn team_code_from_href(href: &str) -> Option<TeamCode> {
    href.split('/')
        .nth(2)
        .filter(|s| !s.is_empty())
        .map(TeamCode::new)
}
