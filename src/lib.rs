//! Boss Mode analytics
//!
//! Works out, for each building in an idle-game economy, what share of total
//! CpS it produces directly and what share it creates in other buildings
//! through synergy upgrades.

pub mod analyzer;
pub mod db;
pub mod error;
pub mod extract;
pub mod format;
pub mod models;
pub mod sample;
pub mod snapshot;
pub mod status;

pub use analyzer::{analyze, synergy_bonus_percent, synergy_breakdown, total_share_percent};
pub use error::BossModeError;
pub use snapshot::{EconomySnapshot, ProductionUnit, SynergyLink, SynergyRole, UnitId};
pub use status::{BuffClassifier, RunStatus};
