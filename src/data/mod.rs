//! Data ingestion
//!
//! Reference tables, basketball-reference scrapers and the SQLite page cache.

pub mod database;
pub mod ratings;
pub mod reference;
pub mod scrapers;

pub use database::Database;
pub use ratings::RatingTable;
pub use reference::CityTable;
