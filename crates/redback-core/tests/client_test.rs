#![allow(clippy::unwrap_used)]
// Integration tests for `RedbackClient` (facade + caches) using wiremock.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use redback_api::ManualClock;
use redback_core::{
    ApiScheme, ApiUrls, ClientConfig, CoreError, RedbackClient, RetryPolicy, SiteIndex,
};

// ── Helpers ─────────────────────────────────────────────────────────

const SERIAL: &str = "RB0001";

fn config(server: &MockServer, scheme: ApiScheme, id: &str, secret: &str) -> ClientConfig {
    ClientConfig::new(scheme, id, SecretString::from(secret.to_owned()))
        .with_urls(ApiUrls::from_root(&format!("{}/api/v2/", server.uri())).unwrap())
        .with_retry(RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        })
}

fn private_client(server: &MockServer) -> (RedbackClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cfg = config(server, ApiScheme::Private, SERIAL, "cookie-value");
    (RedbackClient::with_clock(cfg, clock.clone()).unwrap(), clock)
}

fn public_client(server: &MockServer, index: &str) -> (RedbackClient, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cfg = config(server, ApiScheme::Public, "client-id", "client-secret")
        .with_site_index(SiteIndex::parse_lenient(index));
    (RedbackClient::with_clock(cfg, clock.clone()).unwrap(), clock)
}

fn energy_input() -> Value {
    json!({
        "ACLoadW": 123.0,
        "BackupLoadW": 0.0,
        "PVW": 456.0,
        "ThirdPartyW": null,
        "GridStatus": "Export",
        "GridNegativeIsImportW": -123.0,
        "BatteryNegativeIsChargingW": 403.308,
        "BatteryStatus": "Discharging",
        "BatterySoC0to100": 51.0
    })
}

async fn mount_energy(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/energyflowd2/{SERIAL}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "Data": { "Input": energy_input() } })),
        )
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_private_info(server: &MockServer, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/api/v2/inverterinfo"))
        .and(query_param("SerialNumber", SERIAL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Model": "ST10000",
            "Firmware": "080819"
        })))
        .expect(expected)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/BannerInfo"))
        .and(query_param("SerialNumber", SERIAL))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ProductDisplayname": "Smart Inverter",
            "InstalledPvSizeWatts": 9960.0
        })))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v2/Auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

async fn mount_sites(server: &MockServer, ids: &[&str], expected: u64) {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "Id": id, "Type": "Site", "Nodes": [] }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/v2/EnergyData/With/Nodes"))
        .and(header("Authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Data": data })))
        .expect(expected)
        .mount(server)
        .await;
}

// ── Private scheme ──────────────────────────────────────────────────

#[tokio::test]
async fn test_private_energy_is_data_input_verbatim() {
    let server = MockServer::start().await;
    mount_energy(&server, 1).await;
    let (client, _) = private_client(&server);

    let energy = client.get_energy_data().await.unwrap();
    assert_eq!(Value::Object(energy.as_map().clone()), energy_input());
}

#[tokio::test]
async fn test_private_site_id_is_serial_without_request() {
    let server = MockServer::start().await;
    let (client, _) = private_client(&server);
    assert_eq!(client.get_site_id().await.unwrap(), SERIAL);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_info_fetched_once_per_fifteen_minutes() {
    let server = MockServer::start().await;
    mount_private_info(&server, 2).await;
    let (client, clock) = private_client(&server);

    for _ in 0..5 {
        let info = client.get_inverter_info().await.unwrap();
        assert_eq!(info.get_str("ModelName"), Some("ST10000"));
    }
    clock.advance(TimeDelta::minutes(14));
    client.get_inverter_info().await.unwrap();

    clock.advance(TimeDelta::minutes(1));
    let info = client.get_inverter_info().await.unwrap();
    assert_eq!(info.get_str("ProductDisplayname"), Some("Smart Inverter"));
}

#[tokio::test]
async fn test_energy_fetched_once_per_minute() {
    let server = MockServer::start().await;
    mount_energy(&server, 2).await;
    let (client, clock) = private_client(&server);

    for _ in 0..10 {
        client.get_energy_data().await.unwrap();
        clock.advance(TimeDelta::seconds(5));
    }
    // 50 s elapsed since the first fetch.
    client.get_energy_data().await.unwrap();
    clock.advance(TimeDelta::seconds(10));
    client.get_energy_data().await.unwrap();
}

#[tokio::test]
async fn test_refresh_fetches_info_then_energy() {
    let server = MockServer::start().await;
    mount_private_info(&server, 1).await;
    mount_energy(&server, 1).await;
    let (client, _) = private_client(&server);

    client.refresh().await.unwrap();
    client.refresh().await.unwrap();

    let paths: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|r| r.url.path().to_owned())
        .collect();
    assert_eq!(
        paths,
        vec![
            "/api/v2/inverterinfo".to_owned(),
            "/api/v2/BannerInfo".to_owned(),
            format!("/api/v2/energyflowd2/{SERIAL}"),
        ]
    );
}

#[tokio::test]
async fn test_failed_refresh_keeps_previous_snapshot() {
    let server = MockServer::start().await;
    mount_energy(&server, 1).await;
    let (client, clock) = private_client(&server);

    let before = client.energy_snapshot().await.unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/energyflowd2/{SERIAL}")))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;
    clock.advance(TimeDelta::seconds(61));

    let err = client.get_energy_data().await.unwrap_err();
    assert!(
        matches!(err, CoreError::ServiceUnavailable { status: 503, .. }),
        "expected ServiceUnavailable, got: {err:?}"
    );
    let kept = client.cached_energy_data().await.unwrap();
    assert!(Arc::ptr_eq(&kept.value, &before.value));
    assert_eq!(kept.fetched_at, before.fetched_at);

    server.reset().await;
    Mock::given(method("GET"))
        .and(path(format!("/api/v2/energyflowd2/{SERIAL}")))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.get_energy_data().await.unwrap_err();
    assert!(
        matches!(err, CoreError::RequestRejected { status: 401, .. }),
        "expected RequestRejected, got: {err:?}"
    );
    assert!(err.is_credential_problem());
    let kept = client.cached_energy_data().await.unwrap();
    assert!(Arc::ptr_eq(&kept.value, &before.value));

    let diag = client.diagnostics().await;
    assert!(!diag.last_update_success);
}

#[tokio::test]
async fn test_connection_rejected_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/inverterinfo"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let (client, _) = private_client(&server);

    assert!(!client.test_connection().await);
    let err = client.check_connection().await.unwrap_err();
    assert!(err.is_credential_problem());
}

// ── Public scheme ───────────────────────────────────────────────────

#[tokio::test]
async fn test_site_id_second_of_three() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_sites(&server, &["S1", "S2", "S3"], 1).await;
    let (client, _) = public_client(&server, "Second");

    assert_eq!(client.get_site_id().await.unwrap(), "S2");
    // Resolved once for the life of the client.
    assert_eq!(client.get_site_id().await.unwrap(), "S2");
}

#[tokio::test]
async fn test_site_id_single_site_answers_any_index() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_sites(&server, &["ONLY"], 1).await;
    let (client, _) = public_client(&server, "Third");

    assert_eq!(client.get_site_id().await.unwrap(), "ONLY");
}

#[tokio::test]
async fn test_site_id_empty_list_is_site_not_found() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_sites(&server, &[], 1).await;
    let (client, _) = public_client(&server, "1");

    let err = client.get_site_id().await.unwrap_err();
    assert!(matches!(err, CoreError::SiteNotFound { index: 1, available: 0 }));
}

#[tokio::test]
async fn test_public_energy_is_flattened() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_sites(&server, &["S1"], 1).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/EnergyData/S1/Dynamic"))
        .and(query_param("metadata", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Data": {
                "TimestampUtc": "2024-05-01T02:03:00Z",
                "SiteId": "S1",
                "PvPowerInstantaneouskW": 4.2,
                "Inverters": [{ "SerialNumber": "N-1" }],
                "Phases": [
                    { "Id": "A", "VoltageInstantaneousV": 233.1, "CurrentInstantaneousA": 1.0,
                      "ActiveExportedPowerInstantaneouskW": 0.5, "ActiveImportedPowerInstantaneouskW": 0.0 },
                    { "Id": "B", "VoltageInstantaneousV": 235.3, "CurrentInstantaneousA": 1.0,
                      "ActiveExportedPowerInstantaneouskW": 0.5, "ActiveImportedPowerInstantaneouskW": 0.0 },
                    { "Id": "C", "VoltageInstantaneousV": 236.1, "CurrentInstantaneousA": 1.0,
                      "ActiveExportedPowerInstantaneouskW": 0.5, "ActiveImportedPowerInstantaneouskW": 0.0 }
                ],
                "Battery": { "CurrentNegativeIsChargingA": 2.5, "VoltageV": 51.0 },
                "PVs": [{ "PvIndex": 0, "VoltageV": 400.0, "CurrentA": 5.0, "PowerkW": 2.0 }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let (client, _) = public_client(&server, "first");

    let energy = client.get_energy_data().await.unwrap();
    let voltage = energy.get_f64("VoltageInstantaneousV").unwrap();
    assert!((voltage - 406.8).abs() <= 0.1, "got {voltage}");
    for key in ["Phases", "Battery", "PVs", "TimestampUtc", "SiteId", "Inverters"] {
        assert!(!energy.contains_key(key), "{key} should be flattened away");
    }
    assert_eq!(energy.get_f64("BatteryVoltageV"), Some(51.0));
    assert_eq!(energy.get_f64("PV_0_PowerkW"), Some(2.0));
}

#[tokio::test]
async fn test_public_info_and_connection() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_sites(&server, &["S1"], 2).await;
    Mock::given(method("GET"))
        .and(path("/api/v2/EnergyData/S1/Static"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Data": {
                "Id": "S1",
                "StaticData": { "SiteDetails": { "Name": "Home" } },
                "Nodes": [{
                    "Id": "INV-1",
                    "StaticData": {
                        "ModelName": "SH5000",
                        "SoftwareVersion": "3.1",
                        "BatteryModels": ["A", "B"]
                    }
                }]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let (client, _) = public_client(&server, "1");

    // The connection test reads the site list without caching it.
    assert!(client.test_connection().await);

    let info = client.get_inverter_info().await.unwrap();
    assert_eq!(info.get_str("SiteId"), Some("S1"));
    assert_eq!(info.get_str("InverterSerialNumber"), Some("INV-1"));
    assert_eq!(info.get_str("Model"), Some("SH5000"));
    assert_eq!(info.get_str("FirmwareVersion"), Some("3.1"));
    assert_eq!(info.get_str("BatteryModels"), Some("A, B"));
    assert_eq!(info.get_str("Name"), Some("Home"));

    let diag = client.diagnostics().await;
    assert_eq!(diag.site_id.as_deref(), Some("S1"));
    assert_eq!(diag.has_token, Some(true));
}
