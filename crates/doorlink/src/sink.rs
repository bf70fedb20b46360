// Log-backed consumer. A platform integration (HomeKit bridge, MQTT
// publisher) would implement `StateSink` in its place.

use doorlink_core::door::light_label;
use doorlink_core::{DoorState, StateSink};
use tracing::info;

pub struct LogSink;

impl StateSink for LogSink {
    fn door_current_changed(&self, state: DoorState) {
        info!(state = state.report_label(), "door is");
    }

    fn door_target_changed(&self, state: DoorState) {
        info!(state = state.report_label(), "door target is");
    }

    fn light_changed(&self, on: bool) {
        info!(state = light_label(on), "light is");
    }
}
