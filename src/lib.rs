//! levelmap - level to stage resolution and catalog sync
//!
//! A puzzle game ships a bundled catalog of stages per progression track
//! (main line, special levels, daily challenge). Each stage holds a fixed
//! number of levels. levelmap maps a global level number onto the stage that
//! contains it, loads that stage's payload, and keeps the catalogs current by
//! downloading newer versions announced by remote config.
//!
//! ## Layout
//!
//! - [`resolver`]: pure level to stage arithmetic
//! - [`handler`]: per-track behavior (lookahead cache, special unlocks, daily)
//! - [`coordinator`]: owns every track's state; the gameplay-facing API
//! - [`sync`]: download state machine per track
//! - [`store`]: collaborator traits and their provided implementations
//! - [`config`]: TOML configuration and storage layout

pub mod config;
pub mod coordinator;
pub mod domain;
pub mod error;
pub mod handler;
pub mod resolver;
pub mod store;
pub mod sync;

pub use coordinator::{ContentServices, InitReport, ProgressionCoordinator, SyncOutcome};
pub use domain::*;
pub use error::{LevelError, Result};
