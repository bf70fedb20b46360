//! State reconciliation engine for HTTP-controlled doors and gates.
//!
//! This crate owns the logic between a smart-home consumer and a remote
//! device exposing open/close/state URLs (plus an optional light):
//!
//! - **[`DoorController`]** — Central facade. [`start()`](DoorController::start)
//!   seeds an initial snapshot, performs the first state check, and spawns
//!   the polling task. Consumers read current/target state through
//!   staleness-aware accessors and write through
//!   [`request_door_target()`](DoorController::request_door_target) /
//!   [`request_light()`](DoorController::request_light).
//!
//! - **[`DoorState`]** ([`door`]) — Four-way door model plus `Stopped`, with
//!   the bidirectional mapping to the device's reported vocabulary and the
//!   current↔target pairing rules.
//!
//! - **[`ReconciledState`]** ([`reconcile`]) — The single long-lived record
//!   of current/target values, each slot timestamped on every write so
//!   reads can detect a device that has gone quiet.
//!
//! - **[`StateSink`]** ([`sink`]) — Change notifications for the platform
//!   integration layer (the seam a HomeKit/MQTT adapter implements).
//!
//! All device I/O goes through `doorlink-api`'s serialized gateway; poll
//! cycles are additionally serialized behind their own lock so a slow
//! determination never overlaps the next cycle.

pub mod config;
pub mod controller;
pub mod door;
pub mod error;
pub mod reconcile;
pub mod sink;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DeviceConfig, DoorConfig, DoorStateSource, LightConfig, StateProbe};
pub use controller::DoorController;
pub use door::DoorState;
pub use error::CoreError;
pub use reconcile::{ReconciledState, Stamped};
pub use sink::{NullSink, StateSink};
