//! Feature extraction
//!
//! Turns the season schedule into per-team logs of pre-game form, then into
//! one differenced row per game.

pub mod assembly;
pub mod rolling;
pub mod team_log;
pub mod travel;

pub use assembly::{FeatureRow, GameRow};
pub use team_log::{SideRow, TeamFeatures, TeamGameLog};
