//! Configuration surface for doorlink.
//!
//! The declarative field names (`httpHost`, `doorOpenUrl`, ...) follow
//! the schema door-controller firmwares and existing bridge setups
//! already use; snake_case aliases make the same fields reachable from
//! `DOORLINK_`-prefixed environment variables. Loading goes through
//! figment (TOML file + env overlay); validation collects *every*
//! problem before rejecting, so operators see all misconfigurations at
//! once instead of fixing them one reject at a time.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;
use thiserror::Error;

use doorlink_api::{CustomHeader, EndpointConfig};
use doorlink_core::config::{DeviceConfig, DoorConfig, DoorStateSource, LightConfig, StateProbe};

// ── Errors ──────────────────────────────────────────────────────────

/// One misconfiguration. Field names refer to the declarative surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing or invalid configuration field '{0}'")]
    MissingField(&'static str),

    #[error("Missing or invalid configuration field '{field}' when '{requires}' is set")]
    MissingDependentField {
        field: &'static str,
        requires: &'static str,
    },

    #[error("Missing or invalid configuration field '{field}' when '{absent}' is not set")]
    MissingFallbackField {
        field: &'static str,
        absent: &'static str,
    },

    #[error("Invalid value for configuration field '{field}': {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}

/// Everything wrong with one configuration, reported together.
#[derive(Debug)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "configuration rejected with {} error(s):", self.0.len())?;
        for error in &self.0 {
            writeln!(f, "  - {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

/// Loading-stage failures (before validation even runs).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error(transparent)]
    Invalid(#[from] ConfigErrors),
}

impl From<figment::Error> for LoadError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Raw declarative surface ─────────────────────────────────────────

/// The raw, unvalidated configuration as written by the operator.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawConfig {
    #[serde(alias = "http_host")]
    pub http_host: Option<String>,

    #[serde(alias = "http_port")]
    pub http_port: Option<u16>,

    #[serde(alias = "http_status_poll_milliseconds")]
    pub http_status_poll_milliseconds: Option<u64>,

    #[serde(alias = "http_request_timeout_milliseconds")]
    pub http_request_timeout_milliseconds: Option<u64>,

    #[serde(alias = "http_header_name")]
    pub http_header_name: Option<String>,

    #[serde(alias = "http_header_value")]
    pub http_header_value: Option<String>,

    pub name: Option<String>,

    #[serde(alias = "door_state_url")]
    pub door_state_url: Option<String>,

    #[serde(alias = "door_state_field")]
    pub door_state_field: Option<String>,

    #[serde(alias = "door_operation_seconds")]
    pub door_operation_seconds: Option<u64>,

    #[serde(alias = "door_operation_close_after_open_auto")]
    pub door_operation_close_after_open_auto: Option<bool>,

    #[serde(alias = "door_open_url")]
    pub door_open_url: Option<String>,

    #[serde(alias = "door_close_url")]
    pub door_close_url: Option<String>,

    #[serde(alias = "door_success_field")]
    pub door_success_field: Option<String>,

    #[serde(alias = "light_name")]
    pub light_name: Option<String>,

    #[serde(alias = "light_state_url")]
    pub light_state_url: Option<String>,

    #[serde(alias = "light_state_field")]
    pub light_state_field: Option<String>,

    #[serde(alias = "light_on_url")]
    pub light_on_url: Option<String>,

    #[serde(alias = "light_off_url")]
    pub light_off_url: Option<String>,

    #[serde(alias = "light_success_field")]
    pub light_success_field: Option<String>,
}

const DEFAULT_PORT: u16 = 80;
const DEFAULT_POLL_MS: u64 = 4000;
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

/// Take a required field, recording an error when it is missing. The
/// placeholder return is never observed: validation rejects the whole
/// config before it could be.
fn required(
    value: Option<String>,
    field: &'static str,
    errors: &mut Vec<ConfigError>,
) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or_else(|| {
        errors.push(ConfigError::MissingField(field));
        String::new()
    })
}

fn required_for(
    value: Option<String>,
    field: &'static str,
    requires: &'static str,
    errors: &mut Vec<ConfigError>,
) -> String {
    value.filter(|v| !v.is_empty()).unwrap_or_else(|| {
        errors.push(ConfigError::MissingDependentField { field, requires });
        String::new()
    })
}

impl RawConfig {
    /// Load from a TOML file with a `DOORLINK_`-prefixed env overlay.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        Ok(Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("DOORLINK_"))
            .extract()?)
    }

    /// Load from a TOML string (tests, embedded defaults).
    pub fn load_str(toml: &str) -> Result<Self, LoadError> {
        Ok(Figment::new().merge(Toml::string(toml)).extract()?)
    }

    /// Validate into the engine's typed configuration.
    ///
    /// Collect-all-then-reject: every problem is recorded before the
    /// config is refused, and nothing is built unless all checks pass.
    #[allow(clippy::too_many_lines)]
    pub fn validate(self) -> Result<DeviceConfig, ConfigErrors> {
        let mut errors = Vec::new();

        // ── Endpoint ────────────────────────────────────────────
        let host = required(self.http_host, "httpHost", &mut errors);

        let port = self.http_port.unwrap_or(DEFAULT_PORT);
        if port == 0 {
            errors.push(ConfigError::InvalidField {
                field: "httpPort",
                reason: "must be a positive port number".into(),
            });
        }

        let poll_ms = self.http_status_poll_milliseconds.unwrap_or(DEFAULT_POLL_MS);
        if poll_ms == 0 {
            errors.push(ConfigError::InvalidField {
                field: "httpStatusPollMilliseconds",
                reason: "must be a positive interval".into(),
            });
        }

        let timeout_ms = self
            .http_request_timeout_milliseconds
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        if timeout_ms == 0 {
            errors.push(ConfigError::InvalidField {
                field: "httpRequestTimeoutMilliseconds",
                reason: "must be a positive timeout".into(),
            });
        }

        let header = if present(&self.http_header_name) {
            let name = self.http_header_name.unwrap_or_default();
            let value = required_for(
                self.http_header_value,
                "httpHeaderValue",
                "httpHeaderName",
                &mut errors,
            );
            Some(CustomHeader { name, value })
        } else {
            None
        };

        // ── Door ────────────────────────────────────────────────
        let name = required(self.name, "name", &mut errors);

        let operation = self.door_operation_seconds.filter(|&secs| secs > 0);

        let state = if present(&self.door_state_url) {
            let url = self.door_state_url.unwrap_or_default();
            let field = required_for(
                self.door_state_field,
                "doorStateField",
                "doorStateUrl",
                &mut errors,
            );
            DoorStateSource::Reported(StateProbe { url, field })
        } else {
            if operation.is_none() {
                errors.push(ConfigError::MissingFallbackField {
                    field: "doorOperationSeconds",
                    absent: "doorStateUrl",
                });
            }
            DoorStateSource::Assumed
        };

        let open_url = required(self.door_open_url, "doorOpenUrl", &mut errors);
        let close_url = required(self.door_close_url, "doorCloseUrl", &mut errors);
        let success_field = required(self.door_success_field, "doorSuccessField", &mut errors);

        // ── Light (entire block gated on lightName) ─────────────
        let light = if present(&self.light_name) {
            let light_name = self.light_name.unwrap_or_default();

            let state = if present(&self.light_state_url) {
                let url = self.light_state_url.unwrap_or_default();
                let field = required_for(
                    self.light_state_field,
                    "lightStateField",
                    "lightStateUrl",
                    &mut errors,
                );
                Some(StateProbe { url, field })
            } else {
                None
            };

            Some(LightConfig {
                name: light_name,
                on_url: required_for(self.light_on_url, "lightOnUrl", "lightName", &mut errors),
                off_url: required_for(self.light_off_url, "lightOffUrl", "lightName", &mut errors),
                success_field: required_for(
                    self.light_success_field,
                    "lightSuccessField",
                    "lightName",
                    &mut errors,
                ),
                state,
            })
        } else {
            None
        };

        if !errors.is_empty() {
            return Err(ConfigErrors(errors));
        }

        Ok(DeviceConfig {
            name,
            endpoint: EndpointConfig {
                host,
                port,
                timeout: Duration::from_millis(timeout_ms),
                header,
            },
            poll_interval: Duration::from_millis(poll_ms),
            door: DoorConfig {
                open_url,
                close_url,
                success_field,
                state,
                operation: operation.map(Duration::from_secs),
                close_after_open_auto: self.door_operation_close_after_open_auto.unwrap_or(false),
            },
            light,
        })
    }
}
