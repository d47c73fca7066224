//! Observation zones, their configuration and per-zone counting rules.

mod config;
mod counter;
mod observation_zone;

pub use config::{ZoneConfigError, load_zone_config, parse_zone_config};
pub use counter::{Counter, evaluate_and_count};
pub use observation_zone::{COUNTING_BAND_PX, ObservationZone, ZoneError, assign_zone};
