// Validated engine configuration.
//
// `doorlink-config` produces these from the raw declarative surface;
// everything here is already checked for presence and consistency, so
// the engine never revalidates at runtime. The blind-vs-reported choice
// is baked into `DoorStateSource` at construction rather than branched
// on a URL option at every read.

use std::time::Duration;

use doorlink_api::EndpointConfig;

/// A state-reporting endpoint: which URL to poll and which JSON field
/// carries the observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateProbe {
    pub url: String,
    pub field: String,
}

/// Where the door's authoritative current state comes from.
#[derive(Debug, Clone)]
pub enum DoorStateSource {
    /// The device reports its position; poll this probe.
    Reported(StateProbe),
    /// Blind device: the last commanded target is ground truth.
    Assumed,
}

/// Door subsystem configuration.
#[derive(Debug, Clone)]
pub struct DoorConfig {
    pub open_url: String,
    pub close_url: String,
    /// JSON field whose `true` value acknowledges a command.
    pub success_field: String,
    pub state: DoorStateSource,
    /// How long one open/close run takes. Required for blind devices;
    /// also arms the auto-close timer when `close_after_open_auto` is set.
    pub operation: Option<Duration>,
    /// Re-close automatically `operation` after a successful open.
    pub close_after_open_auto: bool,
}

/// Optional light subsystem configuration.
#[derive(Debug, Clone)]
pub struct LightConfig {
    pub name: String,
    pub on_url: String,
    pub off_url: String,
    pub success_field: String,
    pub state: Option<StateProbe>,
}

/// Full validated configuration for one device.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub name: String,
    pub endpoint: EndpointConfig,
    /// Interval between poll cycles.
    pub poll_interval: Duration,
    pub door: DoorConfig,
    pub light: Option<LightConfig>,
}

impl DeviceConfig {
    /// The door's state probe, when the device reports door position.
    pub fn door_probe(&self) -> Option<&StateProbe> {
        match &self.door.state {
            DoorStateSource::Reported(probe) => Some(probe),
            DoorStateSource::Assumed => None,
        }
    }

    /// The light's state probe, when configured.
    pub fn light_probe(&self) -> Option<&StateProbe> {
        self.light.as_ref().and_then(|l| l.state.as_ref())
    }

    /// Whether the device reports any state at all. Devices that don't
    /// are never polled and never considered stale.
    pub fn has_states(&self) -> bool {
        self.door_probe().is_some() || self.light_probe().is_some()
    }

    /// Age at which a current-state read turns stale, or `None` for
    /// blind devices (their tracked state is authoritative by definition).
    pub fn stale_after(&self) -> Option<Duration> {
        self.has_states().then(|| self.poll_interval * 3)
    }

    /// Whether door and light share one state URL, so a single poll
    /// yields both observations.
    pub fn shared_state_url(&self) -> bool {
        match (self.door_probe(), self.light_probe()) {
            (Some(door), Some(light)) => door.url == light.url,
            _ => false,
        }
    }
}
