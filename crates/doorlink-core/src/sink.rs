// Consumer-notification seam.
//
// The platform integration layer (HomeKit bridge, MQTT publisher, ...)
// implements this to hear about state transitions. Called only on a real
// value change or on the forced initial snapshot, from inside the
// engine's serialized mutation paths.

use crate::door::DoorState;

/// Change notifications for the reconciled state.
pub trait StateSink: Send + Sync {
    /// The observed door position changed (or was initially seeded).
    fn door_current_changed(&self, state: DoorState);

    /// The desired door position changed (or was initially seeded).
    fn door_target_changed(&self, state: DoorState);

    /// The light turned on or off (or was initially seeded).
    fn light_changed(&self, on: bool);
}

/// Sink for consumers that only ever poll the read accessors.
pub struct NullSink;

impl StateSink for NullSink {
    fn door_current_changed(&self, _state: DoorState) {}
    fn door_target_changed(&self, _state: DoorState) {}
    fn light_changed(&self, _on: bool) {}
}
