mod support;

use std::io::Write;

use bloomwatch::config::{ConfigError, ServiceConfig, CONFIG_ENV};
use support::with_scoped_env;

const CONFIG: &str = r#"
[server]
port = 9000
public_base_url = "https://maps.example"

[region]
pixel_size = 0.01

[mask]
asset = "projects/demo/assets/vegetacion"

[defaults]
year = 2023
month = 6
"#;

fn config_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

const OVERRIDES: [&str; 4] = ["HOST", "PORT", "PUBLIC_BASE_URL", "CATALOG_PATH"];

fn env_with<'a>(
    config: Option<&'a str>,
    set: &[(&'a str, &'a str)],
) -> Vec<(&'a str, Option<&'a str>)> {
    let mut changes: Vec<(&str, Option<&str>)> = vec![(CONFIG_ENV, config)];
    for key in OVERRIDES {
        let value = set.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);
        changes.push((key, value));
    }
    changes
}

#[test]
fn test_load_reads_file_named_by_env() {
    let file = config_file(CONFIG);
    let path = file.path().to_str().unwrap();
    let config = with_scoped_env(&env_with(Some(path), &[]), ServiceConfig::load).unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.server.public_base_url, "https://maps.example");
    assert_eq!((config.defaults.year, config.defaults.month), (2023, 6));

    let mask = config.mask.expect("mask section");
    assert_eq!(mask.asset, "projects/demo/assets/vegetacion");
    assert_eq!(mask.property, "Clasif2014");
    assert_eq!(mask.value, serde_json::json!("Agrícola"));
}

#[test]
fn test_env_overrides_win_over_file() {
    let file = config_file(CONFIG);
    let path = file.path().to_str().unwrap();
    let env = env_with(
        Some(path),
        &[
            ("PORT", "9100"),
            ("HOST", "127.0.0.1"),
            ("CATALOG_PATH", "/data/catalog.json"),
        ],
    );
    let config = with_scoped_env(&env, ServiceConfig::load).unwrap();

    assert_eq!(config.server.port, 9100);
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(
        config.backend.catalog_path.as_deref(),
        Some(std::path::Path::new("/data/catalog.json"))
    );
}

#[test]
fn test_bad_port_override_is_rejected() {
    let file = config_file(CONFIG);
    let path = file.path().to_str().unwrap();
    let result = with_scoped_env(&env_with(Some(path), &[("PORT", "http")]), ServiceConfig::load);
    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_missing_config_file_is_read_error() {
    let env = env_with(Some("/nonexistent/bloomwatch.toml"), &[]);
    let result = with_scoped_env(&env, ServiceConfig::load);
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_unknown_backend_type_fails_validation() {
    let file = config_file("[backend]\ntype = \"earth-engine\"\n");
    let path = file.path().to_str().unwrap();
    let result = with_scoped_env(&env_with(Some(path), &[]), ServiceConfig::load);
    match result {
        Err(ConfigError::Invalid(message)) => assert!(message.contains("earth-engine")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_malformed_toml_is_parse_error() {
    let file = config_file("[server\nport = 1");
    let path = file.path().to_str().unwrap();
    let result = with_scoped_env(&env_with(Some(path), &[]), ServiceConfig::load);
    assert!(matches!(result, Err(ConfigError::Parse { .. })));
}
