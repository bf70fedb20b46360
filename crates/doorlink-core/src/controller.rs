// ── Door controller facade ──
//
// Full lifecycle for one device: initial snapshot, background polling,
// staleness-aware reads, and command dispatch. All device I/O funnels
// through the serialized gateway; poll cycles additionally serialize
// behind the poll lock so a slow determination never overlaps the next
// cycle.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use doorlink_api::{ActionGateway, Method};

use crate::config::DeviceConfig;
use crate::door::{DoorState, light_label};
use crate::error::CoreError;
use crate::reconcile::ReconciledState;
use crate::sink::StateSink;

const SUCCESS: &Value = &Value::Bool(true);

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<Inner>`. Owns the reconciled state and the
/// two mutual-exclusion domains (HTTP inside the gateway, poll
/// scheduling here); state is only ever mutated from behind them.
#[derive(Clone)]
pub struct DoorController {
    inner: Arc<Inner>,
}

struct Inner {
    config: DeviceConfig,
    gateway: ActionGateway,
    state: Mutex<ReconciledState>,
    /// Poll-scheduling domain: held across one determination at a time.
    poll_lock: Mutex<()>,
    sink: Arc<dyn StateSink>,
    cancel: CancellationToken,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl DoorController {
    /// Create a controller from validated configuration. Does NOT touch
    /// the network -- call [`start()`](Self::start) to seed the initial
    /// snapshot and begin polling.
    pub fn new(config: DeviceConfig, sink: Arc<dyn StateSink>) -> Result<Self, CoreError> {
        let gateway = ActionGateway::new(config.endpoint.clone())?;
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                gateway,
                state: Mutex::new(ReconciledState::new()),
                poll_lock: Mutex::new(()),
                sink,
                cancel: CancellationToken::new(),
                poll_task: Mutex::new(None),
            }),
        })
    }

    /// The validated device configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.inner.config
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Seed the initial snapshot (closed door, light off), run the first
    /// state check synchronously, then spawn the polling task.
    ///
    /// Devices that report no state skip both the first check and the
    /// poll task entirely; their state tracks successful commands.
    pub async fn start(&self) {
        info!(name = %self.inner.config.name, "starting door controller");

        {
            let mut st = self.inner.state.lock().await;
            self.apply_door_current(&mut st, DoorState::Secured, true, false);
            if self.inner.config.light.is_some() {
                self.apply_light_current(&mut st, false, true);
            }
        }

        if self.inner.config.has_states() {
            self.check_states(true).await;

            let task = tokio::spawn(poll_task(
                self.clone(),
                self.inner.config.poll_interval,
                self.inner.cancel.clone(),
            ));
            *self.inner.poll_task.lock().await = Some(task);
        }
    }

    /// Stop the polling task and wait for it to finish. In-flight
    /// requests and armed auto-close timers are not cancelled.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        if let Some(task) = self.inner.poll_task.lock().await.take() {
            let _ = task.await;
        }
    }

    // ── State determination ──────────────────────────────────────

    /// Run one poll cycle: door determination, then light determination
    /// (skipped when the light shares the door's state URL), each behind
    /// the poll lock. Determination errors are logged and do not
    /// propagate -- the next cycle retries.
    pub async fn check_states(&self, initial: bool) {
        debug!(initial, "checking device states");

        if self.inner.config.door_probe().is_some() {
            let _poll = self.inner.poll_lock.lock().await;
            match self.determine_door().await {
                Ok((door, light)) => {
                    let mut st = self.inner.state.lock().await;
                    self.apply_door_current(&mut st, door, initial, false);
                    if let Some(on) = light {
                        self.apply_light_current(&mut st, on, initial);
                    }
                }
                Err(e) => warn!(error = %e, "door state determination failed"),
            }
        }

        // A shared state URL already yielded the light observation above.
        if self.inner.config.light_probe().is_some() && !self.inner.config.shared_state_url() {
            let _poll = self.inner.poll_lock.lock().await;
            match self.determine_light().await {
                Ok(on) => {
                    let mut st = self.inner.state.lock().await;
                    self.apply_light_current(&mut st, on, initial);
                }
                Err(e) => warn!(error = %e, "light state determination failed"),
            }
        }
    }

    /// Ask the device for the door position. For blind devices this
    /// returns the tracked current state without any network call. When
    /// door and light share a state URL and the light field is present
    /// in the same body, the light observation is extracted too.
    pub async fn determine_door(&self) -> Result<(DoorState, Option<bool>), CoreError> {
        let Some(probe) = self.inner.config.door_probe() else {
            let st = self.inner.state.lock().await;
            return Ok((st.door_current.value, None));
        };

        let json = self
            .inner
            .gateway
            .execute(Method::GET, &probe.url, Some(&probe.field), None)
            .await?;

        // The gateway guarantees the field is present.
        let raw = &json[probe.field.as_str()];
        let state = raw
            .as_str()
            .and_then(DoorState::from_report)
            .ok_or_else(|| CoreError::UnrecognizedState {
                raw: raw.to_string(),
            })?;

        let light = self
            .inner
            .config
            .light_probe()
            .filter(|lp| lp.url == probe.url)
            .and_then(|lp| json.get(lp.field.as_str()))
            .map(|v| v == SUCCESS);

        Ok((state, light))
    }

    /// Ask the device whether the light is on. Passthrough of the
    /// tracked value when no light state URL is configured.
    pub async fn determine_light(&self) -> Result<bool, CoreError> {
        let Some(probe) = self.inner.config.light_probe() else {
            let st = self.inner.state.lock().await;
            return Ok(st.light_current.value);
        };

        let json = self
            .inner
            .gateway
            .execute(Method::GET, &probe.url, Some(&probe.field), None)
            .await?;

        Ok(&json[probe.field.as_str()] == SUCCESS)
    }

    // ── Reads (consumer contract) ────────────────────────────────

    /// Last known door position. Stale once nothing has been heard for
    /// three poll intervals -- but only for devices that report state;
    /// a blind device's tracked state is authoritative forever.
    pub async fn door_current(&self) -> Result<DoorState, CoreError> {
        let st = self.inner.state.lock().await;
        if let Some(ttl) = self.inner.config.stale_after() {
            let elapsed = st.door_current.elapsed();
            if elapsed >= ttl {
                return Err(CoreError::StaleState {
                    subject: "door",
                    last_known: st.door_current.value.report_label(),
                    elapsed,
                });
            }
        }
        Ok(st.door_current.value)
    }

    /// Desired door position. Never stale.
    pub async fn door_target(&self) -> DoorState {
        self.inner.state.lock().await.door_target.value
    }

    /// Last known light state, with the same staleness rule as the door.
    pub async fn light_current(&self) -> Result<bool, CoreError> {
        let st = self.inner.state.lock().await;
        if let Some(ttl) = self.inner.config.stale_after() {
            let elapsed = st.light_current.elapsed();
            if elapsed >= ttl {
                return Err(CoreError::StaleState {
                    subject: "light",
                    last_known: light_label(st.light_current.value),
                    elapsed,
                });
            }
        }
        Ok(st.light_current.value)
    }

    // ── Command dispatch ─────────────────────────────────────────

    /// Request a new door target state.
    ///
    /// A request matching the current target succeeds immediately with
    /// zero HTTP calls. Otherwise the open/close URL is hit expecting
    /// the success field to be `true`; only then is the target updated.
    /// A successful open may arm the uncancellable auto-close timer.
    pub async fn request_door_target(&self, new_state: DoorState) -> Result<(), CoreError> {
        {
            let st = self.inner.state.lock().await;
            if st.door_target.value == new_state {
                return Ok(());
            }
            info!(
                requested = new_state.report_label(),
                currently = st.door_current.value.report_label(),
                target = st.door_target.value.report_label(),
                "received request to operate the door"
            );
        }

        let door = &self.inner.config.door;
        let url = if new_state == DoorState::Unsecured {
            &door.open_url
        } else {
            &door.close_url
        };

        self.inner
            .gateway
            .execute(Method::GET, url, Some(&door.success_field), Some(SUCCESS))
            .await
            .map_err(|source| CoreError::CommandFailed {
                subject: "door",
                source,
            })?;

        {
            let mut st = self.inner.state.lock().await;
            self.apply_door_target(&mut st, new_state, false, false);
        }

        if new_state == DoorState::Unsecured && door.close_after_open_auto {
            if let Some(operation) = door.operation {
                self.arm_auto_close(operation);
            }
        }

        Ok(())
    }

    /// Request the light on or off. Same idempotent short-circuit and
    /// failure contract as the door; the device expects a PUT here.
    pub async fn request_light(&self, on: bool) -> Result<(), CoreError> {
        let Some(light) = self.inner.config.light.as_ref() else {
            return Err(CoreError::LightNotConfigured);
        };

        {
            let st = self.inner.state.lock().await;
            if st.light_current.value == on {
                return Ok(());
            }
            info!(
                requested = light_label(on),
                currently = light_label(st.light_current.value),
                "received request to operate the light"
            );
        }

        let url = if on { &light.on_url } else { &light.off_url };

        self.inner
            .gateway
            .execute(Method::PUT, url, Some(&light.success_field), Some(SUCCESS))
            .await
            .map_err(|source| CoreError::CommandFailed {
                subject: "light",
                source,
            })?;

        let mut st = self.inner.state.lock().await;
        self.apply_light_current(&mut st, on, false);
        Ok(())
    }

    /// One-shot timer re-issuing a close after the door's operation
    /// time. Deliberately not cancelled by intervening commands; if the
    /// door closed in the meantime, the re-issue is an idempotent no-op.
    fn arm_auto_close(&self, operation: Duration) {
        info!(after = ?operation, "arming auto-close timer");
        let controller = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(operation).await;
            info!("auto-close timer fired");
            if let Err(e) = controller.request_door_target(DoorState::Secured).await {
                error!(error = %e, "auto-close failed");
            }
        });
    }

    // ── Setters (reconciliation core) ────────────────────────────
    //
    // Each setter stamps its slot unconditionally, applies the value on
    // a real change (or the forced initial snapshot), notifies the
    // sink, and cross-derives the paired value one level deep. The
    // origin flag suppresses back-propagation: a current-update caused
    // by a target-update never re-enters the target setter, and vice
    // versa.

    fn apply_door_current(
        &self,
        st: &mut ReconciledState,
        state: DoorState,
        initial: bool,
        from_target: bool,
    ) {
        st.door_current.stamp();
        if st.door_current.value == state && !initial {
            return;
        }

        info!(
            state = state.report_label(),
            initial, "door current state changed"
        );
        st.door_current.value = state;
        self.inner.sink.door_current_changed(state);

        if !from_target {
            if let Some(target) = state.derived_target() {
                self.apply_door_target(st, target, initial, true);
            }
        }
    }

    fn apply_door_target(
        &self,
        st: &mut ReconciledState,
        state: DoorState,
        initial: bool,
        from_current: bool,
    ) {
        st.door_target.stamp();
        if st.door_target.value == state && !initial {
            return;
        }

        info!(
            state = state.report_label(),
            initial, "door target state changed"
        );
        st.door_target.value = state;
        self.inner.sink.door_target_changed(state);

        if !from_current {
            if let Some(current) = state.derived_current() {
                self.apply_door_current(st, current, initial, true);
            }
        }
    }

    fn apply_light_current(&self, st: &mut ReconciledState, on: bool, initial: bool) {
        st.light_current.stamp();
        if st.light_current.value == on && !initial {
            return;
        }

        info!(state = light_label(on), initial, "light state changed");
        st.light_current.value = on;
        self.inner.sink.light_changed(on);
    }
}

/// Periodically re-check device state until cancelled. Cycles are
/// scheduled after the previous one completes, so they never overlap
/// however long a determination takes.
async fn poll_task(controller: DoorController, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => controller.check_states(false).await,
        }
    }
}
