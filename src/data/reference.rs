//! Static reference data: city coordinates and franchise host cities

use crate::{Coordinates, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

/// Canadian host cities, absent from the US city table
const EXTRA_CITIES: [(&str, f64, f64); 2] = [
    ("Toronto", 43.6532, -79.3832),
    ("Vancouver", 49.2827, -123.1207),
];

/// Population assigned to the extra cities so they always win deduplication
const EXTRA_CITY_POPULATION: f64 = 1e9;

/// Franchise name -> host city, covering relocations and renames since 1977
const HOST_CITIES: &[(&str, &str)] = &[
    ("Atlanta Hawks", "Atlanta"),
    ("Boston Celtics", "Boston"),
    ("Brooklyn Nets", "Brooklyn"),
    ("Charlotte Bobcats", "Charlotte"),
    ("Charlotte Hornets", "Charlotte"),
    ("Chicago Bulls", "Chicago"),
    ("Cleveland Cavaliers", "Cleveland"),
    ("Dallas Mavericks", "Dallas"),
    ("Denver Nuggets", "Denver"),
    ("Detroit Pistons", "Detroit"),
    ("Golden State Warriors", "San Francisco"),
    ("Houston Rockets", "Houston"),
    ("Indiana Pacers", "Indianapolis"),
    ("Kansas City Kings", "Kansas City"),
    ("Los Angeles Clippers", "Los Angeles"),
    ("Los Angeles Lakers", "Los Angeles"),
    ("Memphis Grizzlies", "Memphis"),
    ("Miami Heat", "Miami"),
    ("Milwaukee Bucks", "Milwaukee"),
    ("Minnesota Timberwolves", "Minneapolis"),
    ("New Jersey Nets", "Brooklyn"),
    ("New Orleans Hornets", "New Orleans"),
    ("New Orleans Jazz", "New Orleans"),
    ("New Orleans Pelicans", "New Orleans"),
    ("New Orleans/Oklahoma City Hornets", "Oklahoma City"),
    ("New York Knicks", "New York"),
    ("Oklahoma City Thunder", "Oklahoma City"),
    ("Orlando Magic", "Orlando"),
    ("Philadelphia 76ers", "Philadelphia"),
    ("Phoenix Suns", "Phoenix"),
    ("Portland Trail Blazers", "Portland"),
    ("Sacramento Kings", "Sacramento"),
    ("San Antonio Spurs", "San Antonio"),
    ("San Diego Clippers", "San Diego"),
    ("Seattle SuperSonics", "Seattle"),
    ("Toronto Raptors", "Toronto"),
    ("Utah Jazz", "Salt Lake City"),
    ("Vancouver Grizzlies", "Vancouver"),
    ("Washington Bullets", "Washington"),
    ("Washington Wizards", "Washington"),
];

/// Host city of a franchise, `None` if the franchise is not mapped
pub fn host_city(franchise: &str) -> Option<&'static str> {
    HOST_CITIES
        .iter()
        .find(|(name, _)| *name == franchise)
        .map(|(_, city)| *city)
}

/// A row of the city table
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct City {
    #[serde(rename = "city")]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub population: f64,
}

/// City name -> coordinates, one entry per name
#[derive(Debug, Clone, Default)]
pub struct CityTable {
    cities: HashMap<String, City>,
}

impl CityTable {
    /// Load the city table from a CSV file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let table = Self::from_reader(file)?;
        log::info!(
            "Loaded {} cities from {}",
            table.len(),
            path.as_ref().display()
        );
        Ok(table)
    }

    /// Build the table from CSV with `city, lat, lng, population` columns
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(rdr);
        let mut rows = Vec::new();
        for result in reader.deserialize::<City>() {
            rows.push(result?);
        }
        Ok(Self::from_cities(rows))
    }

    /// Deduplicate by name, keeping the most populous city
    pub fn from_cities(rows: Vec<City>) -> Self {
        let extras = EXTRA_CITIES.iter().map(|(name, lat, lng)| City {
            name: name.to_string(),
            lat: *lat,
            lng: *lng,
            population: EXTRA_CITY_POPULATION,
        });

        let mut cities: HashMap<String, City> = HashMap::new();
        for city in rows.into_iter().chain(extras) {
            match cities.get(&city.name) {
                Some(existing) if existing.population >= city.population => {}
                _ => {
                    cities.insert(city.name.clone(), city);
                }
            }
        }

        CityTable { cities }
    }

    pub fn get(&self, name: &str) -> Option<&City> {
        self.cities.get(name)
    }

    pub fn coordinates(&self, name: &str) -> Option<Coordinates> {
        self.get(name).map(|c| Coordinates {
            lat: c.lat,
            lng: c.lng,
        })
    }

    /// Host city and its coordinates for a home franchise
    pub fn locate_franchise(&self, franchise: &str) -> (Option<String>, Option<Coordinates>) {
        match host_city(franchise) {
            Some(city) => (Some(city.to_string()), self.coordinates(city)),
            None => {
                log::debug!("No host city mapped for {}", franchise);
                (None, None)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}
