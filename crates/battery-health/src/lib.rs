//! Battery health evaluation for connected vehicles.
//!
//! Telemetry samples are scored against their recent history: the temporal context
//! builder reconstructs idle and charging runs, the rule engine deducts from a base
//! score, and the projector turns triggered rules into driver-facing alerts and tips.

pub mod config;
pub mod error;
pub mod health;
pub mod ingest;
pub mod telemetry;
