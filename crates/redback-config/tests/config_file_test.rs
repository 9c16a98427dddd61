#![allow(clippy::unwrap_used)]
// Round-trips of the TOML profile file through figment.

use pretty_assertions::assert_eq;

use redback_config::{Config, ConfigError, Profile, load_config_from, save_config_to};
use redback_core::{ApiScheme, SiteIndex};

#[test]
fn test_missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.default_profile_name(), "default");
    assert_eq!(cfg.defaults.output, "table");
    assert_eq!(cfg.defaults.timeout, 30);
    assert!(cfg.profiles.is_empty());
}

#[test]
fn test_profiles_parse_with_ordinal_site_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_profile = "home"

[defaults]
output = "json"

[profiles.home]
scheme = "public"
auth_id = "client-123"
auth_secret_env = "HOME_SECRET"
site_index = "Second"

[profiles.cabin]
scheme = "private"
auth_id = "RB0001"
site_index = 3
timeout = 10
"#,
    )
    .unwrap();

    let cfg = load_config_from(&path).unwrap();
    assert_eq!(cfg.defaults.output, "json");

    let (name, home) = cfg.profile(None).unwrap();
    assert_eq!(name, "home");
    assert_eq!(home.scheme, ApiScheme::Public);
    assert_eq!(home.site_index, SiteIndex::new(2));
    assert_eq!(home.auth_secret_env.as_deref(), Some("HOME_SECRET"));

    let (_, cabin) = cfg.profile(Some("cabin")).unwrap();
    assert_eq!(cabin.scheme, ApiScheme::Private);
    assert_eq!(cabin.site_index.get(), 3);
    assert_eq!(cabin.timeout, Some(10));

    assert!(matches!(
        cfg.profile(Some("nowhere")),
        Err(ConfigError::UnknownProfile { .. })
    ));
}

#[test]
fn test_saved_config_loads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut cfg = Config::default();
    let mut profile = Profile::new(ApiScheme::Private, "RB0001");
    profile.auth_secret = Some("cookie".into());
    cfg.profiles.insert("default".into(), profile);
    save_config_to(&cfg, &path).unwrap();

    let loaded = load_config_from(&path).unwrap();
    let (_, p) = loaded.profile(None).unwrap();
    assert_eq!(p.auth_id, "RB0001");
    assert_eq!(p.auth_secret.as_deref(), Some("cookie"));
    assert_eq!(p.site_index, SiteIndex::FIRST);
}
