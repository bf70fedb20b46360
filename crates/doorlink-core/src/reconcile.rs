// The single long-lived record of reconciled device state.
//
// Every write re-stamps its slot's timestamp even when the value is
// unchanged -- staleness detection needs "heard, unchanged" to differ
// from "never heard", independent of value-change notifications.

use std::time::Duration;

use tokio::time::Instant;

use crate::door::DoorState;

/// A value plus the instant it was last written.
#[derive(Debug, Clone, Copy)]
pub struct Stamped<T> {
    pub value: T,
    set_at: Instant,
}

impl<T> Stamped<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            set_at: Instant::now(),
        }
    }

    /// Record that the value was (re)confirmed now.
    pub fn stamp(&mut self) {
        self.set_at = Instant::now();
    }

    /// Time since the value was last written.
    pub fn elapsed(&self) -> Duration {
        self.set_at.elapsed()
    }
}

/// Current/target door state and current light state, each timestamped.
///
/// Initialized to `Secured`/`Secured`/off; mutated only through the
/// controller's setters for the lifetime of the process.
#[derive(Debug)]
pub struct ReconciledState {
    pub door_current: Stamped<DoorState>,
    pub door_target: Stamped<DoorState>,
    pub light_current: Stamped<bool>,
}

impl ReconciledState {
    pub fn new() -> Self {
        Self {
            door_current: Stamped::new(DoorState::Secured),
            door_target: Stamped::new(DoorState::Secured),
            light_current: Stamped::new(false),
        }
    }
}

impl Default for ReconciledState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stamp_refreshes_even_without_value_change() {
        let mut slot = Stamped::new(DoorState::Secured);
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(slot.elapsed(), Duration::from_secs(5));

        slot.stamp();
        assert_eq!(slot.value, DoorState::Secured);
        assert_eq!(slot.elapsed(), Duration::ZERO);
    }

    #[test]
    fn initial_snapshot_is_secured_and_off() {
        let state = ReconciledState::new();
        assert_eq!(state.door_current.value, DoorState::Secured);
        assert_eq!(state.door_target.value, DoorState::Secured);
        assert!(!state.light_current.value);
    }
}
