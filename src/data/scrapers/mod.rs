//! Scrapers for basketball-reference.com pages

pub mod boxscore;
pub mod schedule;
pub mod standings;

use crate::data::Database;
use crate::{HoopsError, Result, SourceConfig};
use scraper::{ElementRef, Selector};
use std::cell::Cell;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Anything that can hand back the HTML of a site-relative path
pub trait PageSource {
    /// Fetch the page at `path` (e.g. `/leagues/NBA_2021_games.html`)
    fn fetch(&self, path: &str) -> Result<String>;
}

/// Fetches pages over HTTP, backed by the SQLite page cache
pub struct HttpPageSource<'a> {
    client: reqwest::blocking::Client,
    base_url: String,
    cache: Option<&'a Database>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
    delay: Duration,
    last_request: Cell<Option<Instant>>,
}

impl<'a> HttpPageSource<'a> {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(HttpPageSource {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            cache: None,
            offline_only: false,
            delay: Duration::from_millis(config.request_delay_ms),
            last_request: Cell::new(None),
        })
    }

    /// Use a page cache
    pub fn with_cache(mut self, cache: &'a Database) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    /// Absolute URL for a site-relative path
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    /// Sleep so consecutive network requests are at least `delay` apart
    fn throttle(&self) {
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }
}

impl PageSource for HttpPageSource<'_> {
    fn fetch(&self, path: &str) -> Result<String> {
        let url = self.url_for(path);

        if let Some(cache) = self.cache {
            if let Some(html) = cache.get_page(&url)? {
                log::debug!("Loading from cache: {}", url);
                return Ok(html);
            }
        }

        if self.offline_only {
            return Err(HoopsError::Scraper {
                url,
                message: "no cached copy (offline mode)".to_string(),
            });
        }

        self.throttle();
        log::debug!("Fetching {}", url);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(HoopsError::Scraper {
                message: format!("HTTP {}", response.status()),
                url,
            });
        }
        let html = response.text()?;

        if let Some(cache) = self.cache {
            cache.put_page(&url, &html)?;
        }

        Ok(html)
    }
}

/// Pages served from memory, keyed by path
#[cfg(test)]
#[derive(Debug, Default)]
pub struct StaticPages {
    pages: std::collections::HashMap<String, String>,
    requests: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl StaticPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, path: &str, html: impl Into<String>) -> Self {
        self.pages.insert(path.to_string(), html.into());
        self
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

#[cfg(test)]
impl PageSource for StaticPages {
    fn fetch(&self, path: &str) -> Result<String> {
        self.requests.borrow_mut().push(path.to_string());
        self.pages
            .get(path)
            .cloned()
            .ok_or_else(|| HoopsError::Scraper {
                url: path.to_string(),
                message: "no such page".to_string(),
            })
    }
}

/// Compile a CSS selector
pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| HoopsError::Parse(format!("bad selector {}: {:?}", css, e)))
}

/// Trimmed text of an element
pub(crate) fn element_text(el: ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

/// `data-stat` cell selectors, compiled once per page and reused for every row
pub(crate) struct StatCells {
    selectors: HashMap<&'static str, Selector>,
}

impl StatCells {
    pub(crate) fn new(stats: &[&'static str]) -> Result<Self> {
        let mut selectors = HashMap::with_capacity(stats.len());
        for &stat in stats {
            selectors.insert(stat, selector(&format!("[data-stat=\"{}\"]", stat))?);
        }
        Ok(StatCells { selectors })
    }

    /// Trimmed text of the `th`/`td` cell carrying `data-stat="{stat}"`
    pub(crate) fn text(&self, row: ElementRef, stat: &str) -> Result<Option<String>> {
        let sel = self
            .selectors
            .get(stat)
            .ok_or_else(|| HoopsError::Parse(format!("no selector compiled for '{}'", stat)))?;
        Ok(row.select(sel).next().map(element_text))
    }
}

/// True for the repeated header rows basketball-reference puts inside tables
pub(crate) fn is_header_row(row: ElementRef) -> bool {
    row.value()
        .classes()
        .any(|c| c == "thead" || c == "over_header")
}
