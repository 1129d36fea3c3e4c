#![allow(clippy::unwrap_used)]
// End-to-end tests for the resolver, the speed-set strategy chain, and
// the toggle entity, against a wiremock daemon.

use std::sync::Arc;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use deluctl_core::{
    AdaptPolicy, ConnectionProfile, CoreError, MemoryPresetStore, Preset, SpeedPresets,
    SpeedSetter, SpeedToggle, ToggleConfig, resolve,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn profile(server: &MockServer) -> ConnectionProfile {
    let uri = Url::parse(&server.uri()).unwrap();
    ConnectionProfile {
        host: uri.host_str().unwrap().to_owned(),
        port: uri.port().unwrap(),
        password: "deluge-pass".to_string().into(),
    }
}

fn config(server: &MockServer) -> ToggleConfig {
    ToggleConfig {
        profile: profile(server),
        presets: SpeedPresets {
            limited: Preset::new(500, 100),
            unlimited: Preset::unlimited(),
        },
        ..ToggleConfig::default()
    }
}

async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/json"))
        .and(body_partial_json(json!({"method": "auth.login"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": true, "error": null, "id": 1})),
        )
        .mount(server)
        .await;
}

async fn mount_get_config(server: &MockServer, download: i64, upload: i64) {
    Mock::given(method("POST"))
        .and(path("/json"))
        .and(body_partial_json(json!({"method": "core.get_config"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {"max_download_speed": download, "max_upload_speed": upload},
            "error": null,
            "id": 2,
        })))
        .mount(server)
        .await;
}

async fn mount_set_config_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/json"))
        .and(body_partial_json(json!({"method": "core.set_config"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": null, "error": null, "id": 2})),
        )
        .mount(server)
        .await;
}

fn requests_for(requests: &[Request], rpc_method: &str) -> usize {
    requests
        .iter()
        .filter(|r| {
            serde_json::from_slice::<serde_json::Value>(&r.body)
                .ok()
                .and_then(|v| v.get("method").and_then(|m| m.as_str()).map(String::from))
                .is_some_and(|m| m == rpc_method)
        })
        .count()
}

// ── Resolver (wire) ─────────────────────────────────────────────────

#[tokio::test]
async fn resolver_scenario_a_exact_limited_match() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_get_config(&server, 500, 100).await;

    let presets = SpeedPresets {
        limited: Preset::new(500, 100),
        unlimited: Preset::unlimited(),
    };
    let resolution = resolve(&profile(&server), &presets).await.unwrap();

    assert!(resolution.is_on);
    assert_eq!(resolution.adapted_limited, None);
}

#[tokio::test]
async fn resolver_scenario_b_unlimited_match() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_get_config(&server, -1, -1).await;

    let presets = SpeedPresets {
        limited: Preset::new(500, 100),
        unlimited: Preset::unlimited(),
    };
    let resolution = resolve(&profile(&server), &presets).await.unwrap();

    assert!(!resolution.is_on);
    assert_eq!(resolution.adapted_limited, None);
}

#[tokio::test]
async fn resolver_scenario_c_capped_drift_adopts() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_get_config(&server, 200, 50).await;

    let presets = SpeedPresets {
        limited: Preset::new(500, 100),
        unlimited: Preset::unlimited(),
    };
    let resolution = resolve(&profile(&server), &presets).await.unwrap();

    assert!(resolution.is_on);
    assert_eq!(resolution.adapted_limited, Some(Preset::new(200, 50)));
}

#[tokio::test]
async fn resolver_swallows_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": false, "error": null, "id": 1})),
        )
        .mount(&server)
        .await;

    let resolution = resolve(&profile(&server), &SpeedPresets::default()).await;
    assert!(resolution.is_none(), "resolver must swallow failures");
}

// ── Speed setter ────────────────────────────────────────────────────

#[tokio::test]
async fn setter_scenario_f_alternate_auth_invoked_once() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    Mock::given(method("POST"))
        .and(path("/json"))
        .and(body_partial_json(json!({"method": "core.set_config"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": null,
            "error": {"message": "Not authenticated"},
            "id": 2,
        })))
        .mount(&server)
        .await;

    let setter = SpeedSetter::new(false);
    let result = setter.apply(&profile(&server), Preset::new(500, 100)).await;

    assert!(matches!(result, Err(CoreError::SpeedSetFailed { .. })));
    let requests = server.received_requests().await.unwrap();
    // Direct, then alternate-auth exactly once: two full login+set cycles.
    assert_eq!(requests_for(&requests, "core.set_config"), 2);
    assert_eq!(requests_for(&requests, "auth.login"), 2);
}

#[tokio::test]
async fn setter_other_rpc_error_does_not_escalate() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    Mock::given(method("POST"))
        .and(path("/json"))
        .and(body_partial_json(json!({"method": "core.set_config"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": null,
            "error": {"message": "Value out of range"},
            "id": 2,
        })))
        .mount(&server)
        .await;

    let setter = SpeedSetter::new(false);
    let err = setter
        .apply(&profile(&server), Preset::new(500, 100))
        .await
        .unwrap_err();

    match err {
        CoreError::SpeedSetFailed { attempts, message } => {
            assert_eq!(attempts, 1);
            assert!(message.contains("Value out of range"), "message: {message}");
        }
        other => panic!("expected SpeedSetFailed, got: {other:?}"),
    }
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests_for(&requests, "core.set_config"), 1);
}

#[tokio::test]
async fn setter_consolidated_error_names_root_causes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": false, "error": null, "id": 1})),
        )
        .mount(&server)
        .await;

    let setter = SpeedSetter::new(false);
    let err = setter
        .apply(&profile(&server), Preset::new(500, 100))
        .await
        .unwrap_err();

    let text = err.to_string();
    assert!(text.contains("daemon is running"), "guidance missing: {text}");
    assert!(text.contains("firewall"), "guidance missing: {text}");
}

#[tokio::test]
async fn setter_apply_is_idempotent() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_set_config_ok(&server).await;

    let setter = SpeedSetter::new(false);
    let target = Preset::new(500, 100);
    setter.apply(&profile(&server), target).await.unwrap();
    setter.apply(&profile(&server), target).await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests_for(&requests, "core.set_config"), 2);
    for request in &requests {
        let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        if body["method"] == "core.set_config" {
            assert_eq!(
                body["params"][0],
                json!({"max_download_speed": 500, "max_upload_speed": 100})
            );
        }
    }
}

// ── Toggle entity ───────────────────────────────────────────────────

#[tokio::test]
async fn toggle_scenario_d_turn_on_sets_exact_payload() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    Mock::given(method("POST"))
        .and(path("/json"))
        .and(body_partial_json(json!({
            "method": "core.set_config",
            "params": [{"max_download_speed": 500, "max_upload_speed": 100}],
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": null, "error": null, "id": 2})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let toggle = SpeedToggle::new(config(&server));
    toggle.turn_on().await;

    let state = toggle.state();
    assert!(state.is_on);
    assert!(state.available);
}

#[tokio::test]
async fn toggle_scenario_e_auth_failure_goes_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": false, "error": null, "id": 1})),
        )
        .mount(&server)
        .await;

    let toggle = SpeedToggle::new(config(&server));
    toggle.turn_on().await;

    let state = toggle.state();
    assert!(!state.is_on, "on/off bit must not move on failure");
    assert!(!state.available);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(
        requests_for(&requests, "core.set_config"),
        0,
        "no set_config may be attempted after a login rejection"
    );
}

#[tokio::test]
async fn toggle_turn_off_uses_unlimited_preset() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    Mock::given(method("POST"))
        .and(path("/json"))
        .and(body_partial_json(json!({
            "method": "core.set_config",
            "params": [{"max_download_speed": -1, "max_upload_speed": -1}],
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": null, "error": null, "id": 2})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let toggle = SpeedToggle::new(config(&server));
    toggle.turn_off().await;

    let state = toggle.state();
    assert!(!state.is_on);
    assert!(state.available);
}

#[tokio::test]
async fn toggle_flips_from_published_state() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_set_config_ok(&server).await;

    let toggle = SpeedToggle::new(config(&server));
    let after_first = toggle.toggle().await;
    assert!(after_first.is_on, "initial OFF toggles to ON");

    let after_second = toggle.toggle().await;
    assert!(!after_second.is_on, "ON toggles back to OFF");
}

#[tokio::test]
async fn attach_adopts_and_persists_drifted_preset() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_get_config(&server, 200, 50).await;

    let store = Arc::new(MemoryPresetStore::new());
    let store_dyn: Arc<dyn deluctl_core::PresetStore> = store.clone();
    let toggle = SpeedToggle::with_dependencies(config(&server), Some(store_dyn), None);
    toggle.attach().await;

    let state = toggle.state();
    assert!(state.is_on);
    assert!(state.available);
    assert_eq!(toggle.presets().await.limited, Preset::new(200, 50));
    assert_eq!(store.saved(), Some(Preset::new(200, 50)));
}

#[tokio::test]
async fn attach_with_adaptation_off_keeps_configured_preset() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_get_config(&server, 200, 50).await;

    let store = Arc::new(MemoryPresetStore::new());
    let store_dyn: Arc<dyn deluctl_core::PresetStore> = store.clone();
    let mut cfg = config(&server);
    cfg.adapt = AdaptPolicy::Off;
    let toggle = SpeedToggle::with_dependencies(cfg, Some(store_dyn), None);
    toggle.attach().await;

    // Drift still classifies as ON, but Preset 1 stays untouched.
    assert!(toggle.state().is_on);
    assert_eq!(toggle.presets().await.limited, Preset::new(500, 100));
    assert_eq!(store.saved(), None);
}

#[tokio::test]
async fn attach_marks_unavailable_when_daemon_unreachable() {
    let server = MockServer::builder().start().await;
    let cfg = config(&server);
    drop(server); // nothing listening any more

    let toggle = SpeedToggle::new(cfg);
    toggle.attach().await;

    let state = toggle.state();
    assert!(!state.is_on, "prior belief kept");
    assert!(!state.available);
}

#[tokio::test]
async fn check_connection_reports_limits() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    mount_get_config(&server, 500, 100).await;
    Mock::given(method("POST"))
        .and(path("/json"))
        .and(body_partial_json(json!({"method": "daemon.get_method_list"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": ["auth.login", "core.get_config", "core.set_config"],
            "error": null,
            "id": 2,
        })))
        .mount(&server)
        .await;

    let toggle = SpeedToggle::new(config(&server));
    let report = toggle.check_connection().await.unwrap();

    assert_eq!(report.limits, Preset::new(500, 100));
    assert_eq!(report.methods, Some(3));
    assert!(report.summary_contains_limits());
}

#[tokio::test]
async fn attributes_show_presets_without_stats_feed() {
    let server = MockServer::start().await;
    let toggle = SpeedToggle::new(config(&server));

    let attrs = toggle.attributes().await;
    assert_eq!(attrs.preset_1_download, "500 KiB/s");
    assert_eq!(attrs.preset_2_download, "Unlimited");
    assert_eq!(attrs.current_preset, "Preset 2 (Unlimited)");
    assert!(attrs.download_rate.is_none());
}

// Small extension trait keeping the Display assertion readable.
trait ReportExt {
    fn summary_contains_limits(&self) -> bool;
}

impl ReportExt for deluctl_core::ConnectionReport {
    fn summary_contains_limits(&self) -> bool {
        self.to_string().contains("500 KiB/s")
    }
}
