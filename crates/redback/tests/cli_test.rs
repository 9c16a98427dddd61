//! Integration tests for the `redback` CLI binary.
//!
//! Argument parsing, help output, completions and error handling run
//! offline; data commands use `--demo` or a wiremock portal.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

const NO_CONFIG_HOME: &str = "/tmp/redback-cli-test-nonexistent";

/// Build a [`Command`] for the `redback` binary with env isolation.
///
/// Clears all `REDBACK_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn redback_cmd_in(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("redback");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("REDBACK_PROFILE")
        .env_remove("REDBACK_SCHEME")
        .env_remove("REDBACK_AUTH_ID")
        .env_remove("REDBACK_AUTH_SECRET")
        .env_remove("REDBACK_SITE_INDEX")
        .env_remove("REDBACK_TIMEOUT")
        .env_remove("REDBACK_OUTPUT")
        .env_remove("REDBACK_DEMO");
    cmd
}

fn redback_cmd() -> assert_cmd::Command {
    redback_cmd_in(Path::new(NO_CONFIG_HOME))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = redback_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    redback_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("Redback")
            .and(predicate::str::contains("energy"))
            .and(predicate::str::contains("site-id"))
            .and(predicate::str::contains("diagnostics")),
    );
}

#[test]
fn test_version_flag() {
    redback_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("redback"));
}

#[test]
fn test_completions_bash() {
    redback_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_invalid_output_format_is_usage_error() {
    redback_cmd()
        .args(["--demo", "-o", "xml", "info"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("xml"));
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn test_missing_config_is_usage_error() {
    let output = redback_cmd().arg("info").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("config init"), "Expected hint in output:\n{text}");
}

#[test]
fn test_unknown_profile_is_reported() {
    redback_cmd()
        .args(["--profile", "cabin", "energy"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("cabin"));
}

#[test]
fn test_auth_id_without_secret_is_auth_error() {
    redback_cmd()
        .args(["--scheme", "private", "--auth-id", "RB0001", "energy"])
        .assert()
        .code(3);
}

#[test]
fn test_config_path_lands_under_config_home() {
    redback_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_show_masks_secrets() {
    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), "https://portal.example/api/v2/");

    redback_cmd_in(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.cabin]")
                .and(predicate::str::contains("***SECRET***"))
                .and(predicate::str::contains("cookie-value").not()),
        );
}

// ── Demo source ─────────────────────────────────────────────────────

#[test]
fn test_demo_connection_test() {
    redback_cmd()
        .args(["--demo", "test"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Connection ok"));
}

#[test]
fn test_demo_site_id_is_serial() {
    redback_cmd()
        .args(["--demo", "-o", "plain", "site-id"])
        .assert()
        .success()
        .stdout("RB-DEMO-0001\n");
}

#[test]
fn test_demo_info_plain() {
    redback_cmd()
        .args(["--demo", "-o", "plain", "info"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Model=ST10000")
                .and(predicate::str::contains("ProductDisplayname=Smart Inverter DEMO")),
        );
}

#[test]
fn test_demo_energy_derived_json() {
    let output = redback_cmd()
        .args(["--demo", "-o", "json", "energy", "--derived"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["PVW"], json!(456.0));
    assert_eq!(body["GridStatus"], json!("Export"));
    let load = body["SiteLoadkW"].as_f64().unwrap();
    assert!((load - 0.123).abs() < 1e-9, "SiteLoadkW = {load}");
}

#[test]
fn test_demo_watch_stops_after_count() {
    let output = redback_cmd()
        .args(["--demo", "-o", "json-compact", "watch", "--interval", "1ms", "--count", "2"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "two ticks and a summary:\n{stdout}");

    // The second poll hits the energy cache: the same sample is not counted twice
    let second: Value = serde_json::from_str(lines[1]).unwrap();
    assert_eq!(second["fresh"], json!(false));
    let summary: Value = serde_json::from_str(lines[2]).unwrap();
    assert_eq!(summary["samples"], json!(1));
    // Polling faster than the cache still credits one full minute at 456 W
    let solar = summary["totals"]["SolarGenerationkWh"].as_f64().unwrap();
    assert!((solar - 0.456 / 60.0).abs() < 1e-9, "SolarGenerationkWh = {solar}");
}

#[test]
fn test_demo_diagnostics_redacts_credentials() {
    let output = redback_cmd()
        .args(["--demo", "-o", "json", "diagnostics"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let diag: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(diag["auth_id"], json!("***SECRET***"));
    assert_eq!(diag["auth_secret"], json!("***SECRET***"));
    assert_eq!(diag["demo"], json!(true));
    assert_eq!(diag["last_update_success"], json!(true));
    assert_eq!(diag["site_id"], json!("RB-DEMO-0001"));
}

// ── Live portal (wiremock) ──────────────────────────────────────────

fn write_config(home: &Path, private_base: &str) {
    let dir = home.join("redback");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        format!(
            r#"
default_profile = "cabin"

[profiles.cabin]
scheme = "private"
auth_id = "RB0001"
auth_secret = "cookie-value"
private_base_url = "{private_base}"
"#
        ),
    )
    .unwrap();
}

async fn run_blocking(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_energy_against_portal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/energyflowd2/RB0001"))
        .and(header("cookie", "cookie-value"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Data": { "Input": { "PVW": 1500.0, "ACLoadW": 700.0 } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &format!("{}/api/v2/", server.uri()));

    let mut cmd = redback_cmd_in(home.path());
    cmd.args(["-o", "plain", "energy"]);
    let output = run_blocking(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("PVW=1500.0"), "{stdout}");
    assert!(stdout.contains("ACLoadW=700.0"), "{stdout}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_cookie_exits_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v2/inverterinfo"))
        .and(query_param("SerialNumber", "RB0001"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let home = tempfile::tempdir().unwrap();
    write_config(home.path(), &format!("{}/api/v2/", server.uri()));

    let mut cmd = redback_cmd_in(home.path());
    cmd.arg("test");
    let output = run_blocking(cmd).await;

    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}
