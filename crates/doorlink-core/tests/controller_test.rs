#![allow(clippy::unwrap_used)]
// Integration tests for `DoorController` against a wiremock device.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doorlink_core::{
    CoreError, DeviceConfig, DoorConfig, DoorController, DoorState, DoorStateSource, LightConfig,
    NullSink, StateProbe,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn device_config(server: &MockServer) -> DeviceConfig {
    let url = url::Url::parse(&server.uri()).unwrap();
    DeviceConfig {
        name: "Garage Door".into(),
        endpoint: doorlink_api::EndpointConfig {
            host: url.host_str().unwrap().to_owned(),
            port: url.port().unwrap_or(80),
            timeout: Duration::from_secs(5),
            header: None,
        },
        poll_interval: Duration::from_secs(4),
        door: DoorConfig {
            open_url: "/door/open".into(),
            close_url: "/door/close".into(),
            success_field: "success".into(),
            state: DoorStateSource::Assumed,
            operation: None,
            close_after_open_auto: false,
        },
        light: None,
    }
}

fn with_door_probe(mut cfg: DeviceConfig, url: &str, field: &str) -> DeviceConfig {
    cfg.door.state = DoorStateSource::Reported(StateProbe {
        url: url.into(),
        field: field.into(),
    });
    cfg
}

fn with_light(mut cfg: DeviceConfig, state: Option<StateProbe>) -> DeviceConfig {
    cfg.light = Some(LightConfig {
        name: "Garage Light".into(),
        on_url: "/light/on".into(),
        off_url: "/light/off".into(),
        success_field: "success".into(),
        state,
    });
    cfg
}

fn controller(cfg: DeviceConfig) -> DoorController {
    DoorController::new(cfg, Arc::new(NullSink)).unwrap()
}

async fn mount_success(server: &MockServer, m: &str, p: &str, expect: u64) {
    Mock::given(method(m))
        .and(path(p))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(expect)
        .mount(server)
        .await;
}

// ── Polling / determination ─────────────────────────────────────────

#[tokio::test]
async fn open_report_reconciles_current_and_target() {
    let server = MockServer::start().await;
    let cfg = with_door_probe(device_config(&server), "/door/state", "door");

    Mock::given(method("GET"))
        .and(path("/door/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"door": "OPEN"})))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = controller(cfg);
    ctrl.check_states(true).await;

    assert_eq!(ctrl.door_current().await.unwrap(), DoorState::Unsecured);
    assert_eq!(ctrl.door_target().await, DoorState::Unsecured);
}

#[tokio::test]
async fn shared_state_url_yields_both_observations_in_one_call() {
    let server = MockServer::start().await;
    let cfg = with_light(
        with_door_probe(device_config(&server), "/status", "door"),
        Some(StateProbe {
            url: "/status".into(),
            field: "light".into(),
        }),
    );

    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"door": "CLOSED", "light": true})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = controller(cfg);
    ctrl.check_states(true).await;

    assert_eq!(ctrl.door_current().await.unwrap(), DoorState::Secured);
    assert!(ctrl.light_current().await.unwrap());
}

#[tokio::test]
async fn separate_state_urls_are_polled_separately() {
    let server = MockServer::start().await;
    let cfg = with_light(
        with_door_probe(device_config(&server), "/door/state", "door"),
        Some(StateProbe {
            url: "/light/state".into(),
            field: "light".into(),
        }),
    );

    Mock::given(method("GET"))
        .and(path("/door/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"door": "CLOSED"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/light/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"light": true})))
        .expect(1)
        .mount(&server)
        .await;

    let ctrl = controller(cfg);
    ctrl.check_states(true).await;

    assert!(ctrl.light_current().await.unwrap());
}

#[tokio::test]
async fn unrecognized_report_leaves_state_untouched() {
    let server = MockServer::start().await;
    let cfg = with_door_probe(device_config(&server), "/door/state", "door");

    Mock::given(method("GET"))
        .and(path("/door/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"door": "sideways"})))
        .mount(&server)
        .await;

    let ctrl = controller(cfg);

    let err = ctrl.determine_door().await.expect_err("unrecognized");
    assert!(
        matches!(err, CoreError::UnrecognizedState { ref raw } if raw.contains("sideways")),
        "expected UnrecognizedState, got: {err:?}"
    );

    // check_states logs the failure and carries on without mutating.
    ctrl.check_states(false).await;
    assert_eq!(ctrl.door_current().await.unwrap(), DoorState::Secured);
}

#[tokio::test]
async fn blind_device_determination_makes_no_network_call() {
    let server = MockServer::start().await;
    let ctrl = controller(device_config(&server));

    // No mocks mounted: any request would 404 and fail the call.
    let (state, light) = ctrl.determine_door().await.unwrap();
    assert_eq!(state, DoorState::Secured);
    assert_eq!(light, None);
}

// ── Command dispatch ────────────────────────────────────────────────

#[tokio::test]
async fn door_command_is_idempotent_for_both_targets() {
    let server = MockServer::start().await;
    let ctrl = controller(device_config(&server));

    // Target starts Secured: re-requesting it must issue zero calls.
    mount_success(&server, "GET", "/door/close", 0).await;
    ctrl.request_door_target(DoorState::Secured).await.unwrap();

    // One open flips the target; a second open request is a no-op.
    mount_success(&server, "GET", "/door/open", 1).await;
    ctrl.request_door_target(DoorState::Unsecured).await.unwrap();
    ctrl.request_door_target(DoorState::Unsecured).await.unwrap();

    assert_eq!(ctrl.door_target().await, DoorState::Unsecured);
}

#[tokio::test]
async fn failed_command_reports_and_mutates_nothing() {
    let server = MockServer::start().await;
    let ctrl = controller(device_config(&server));

    mount_success(&server, "GET", "/door/open", 1).await;
    ctrl.request_door_target(DoorState::Unsecured).await.unwrap();

    // Device acknowledges the close request with success=false.
    Mock::given(method("GET"))
        .and(path("/door/close"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let err = ctrl
        .request_door_target(DoorState::Secured)
        .await
        .expect_err("command must fail");

    assert!(
        matches!(
            err,
            CoreError::CommandFailed {
                source: doorlink_api::Error::FieldValueMismatch { .. },
                ..
            }
        ),
        "expected CommandFailed(FieldValueMismatch), got: {err:?}"
    );
    assert_eq!(ctrl.door_target().await, DoorState::Unsecured);
    assert_eq!(ctrl.door_current().await.unwrap(), DoorState::Unsecured);
}

#[tokio::test]
async fn blind_device_tracks_commanded_target_as_current() {
    let server = MockServer::start().await;
    let ctrl = controller(device_config(&server));

    mount_success(&server, "GET", "/door/open", 1).await;
    ctrl.request_door_target(DoorState::Unsecured).await.unwrap();

    // Current state derives from the commanded target, and never stales.
    assert_eq!(ctrl.door_current().await.unwrap(), DoorState::Unsecured);
}

#[tokio::test]
async fn light_commands_use_put_and_update_current() {
    let server = MockServer::start().await;
    let ctrl = controller(with_light(device_config(&server), None));

    mount_success(&server, "PUT", "/light/on", 1).await;
    ctrl.request_light(true).await.unwrap();
    assert!(ctrl.light_current().await.unwrap());

    // Same-value request short-circuits.
    ctrl.request_light(true).await.unwrap();

    mount_success(&server, "PUT", "/light/off", 1).await;
    ctrl.request_light(false).await.unwrap();
    assert!(!ctrl.light_current().await.unwrap());
}

#[tokio::test]
async fn light_command_failure_mutates_nothing() {
    let server = MockServer::start().await;
    let ctrl = controller(with_light(device_config(&server), None));

    Mock::given(method("PUT"))
        .and(path("/light/on"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = ctrl.request_light(true).await.expect_err("must fail");
    assert!(matches!(err, CoreError::CommandFailed { .. }));
    assert!(!ctrl.light_current().await.unwrap());
}

#[tokio::test]
async fn request_light_without_light_config_is_rejected() {
    let server = MockServer::start().await;
    let ctrl = controller(device_config(&server));

    let err = ctrl.request_light(true).await.expect_err("no light");
    assert!(matches!(err, CoreError::LightNotConfigured));
}

// ── Auto-close ──────────────────────────────────────────────────────

#[tokio::test]
async fn successful_open_arms_auto_close() {
    let server = MockServer::start().await;
    let mut cfg = device_config(&server);
    cfg.door.operation = Some(Duration::from_millis(50));
    cfg.door.close_after_open_auto = true;

    mount_success(&server, "GET", "/door/open", 1).await;
    mount_success(&server, "GET", "/door/close", 1).await;

    let ctrl = controller(cfg);
    ctrl.request_door_target(DoorState::Unsecured).await.unwrap();
    assert_eq!(ctrl.door_target().await, DoorState::Unsecured);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ctrl.door_target().await, DoorState::Secured);
}

#[tokio::test]
async fn auto_close_after_manual_close_is_a_noop() {
    let server = MockServer::start().await;
    let mut cfg = device_config(&server);
    cfg.door.operation = Some(Duration::from_millis(50));
    cfg.door.close_after_open_auto = true;

    mount_success(&server, "GET", "/door/open", 1).await;
    // Exactly one close: the manual one. The timer's re-issue must
    // short-circuit on the already-Secured target.
    mount_success(&server, "GET", "/door/close", 1).await;

    let ctrl = controller(cfg);
    ctrl.request_door_target(DoorState::Unsecured).await.unwrap();
    ctrl.request_door_target(DoorState::Secured).await.unwrap();

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ctrl.door_target().await, DoorState::Secured);
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn start_seeds_initial_snapshot_and_polls() {
    let server = MockServer::start().await;
    let mut cfg = with_door_probe(device_config(&server), "/door/state", "door");
    cfg.poll_interval = Duration::from_millis(50);

    Mock::given(method("GET"))
        .and(path("/door/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"door": "OPEN"})))
        .mount(&server)
        .await;

    let ctrl = controller(cfg);
    ctrl.start().await;

    // The first check ran synchronously inside start().
    assert_eq!(ctrl.door_current().await.unwrap(), DoorState::Unsecured);

    // And the poll task keeps the state fresh afterwards.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ctrl.door_current().await.unwrap(), DoorState::Unsecured);

    ctrl.shutdown().await;
}

#[tokio::test]
async fn poll_errors_do_not_stop_the_loop() {
    let server = MockServer::start().await;
    let mut cfg = with_door_probe(device_config(&server), "/door/state", "door");
    cfg.poll_interval = Duration::from_millis(50);

    // First the device misbehaves...
    let flaky = Mock::given(method("GET"))
        .and(path("/door/state"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1..)
        .mount_as_scoped(&server)
        .await;

    let ctrl = controller(cfg);
    ctrl.start().await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    drop(flaky);

    // ...then recovers, and the loop picks the state right up.
    Mock::given(method("GET"))
        .and(path("/door/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"door": "OPEN"})))
        .mount(&server)
        .await;

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ctrl.door_current().await.unwrap(), DoorState::Unsecured);

    ctrl.shutdown().await;
}
