use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;
use warmpool::config::Config;
use warmpool::WarmPoolError;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn loads_pool_settings_from_file() {
    let file = write_config(
        r#"
[pool]
size = 3
max_executions = 4
max_age_minutes = 10
maintenance_interval_secs = 20

[api]
bind_port = 9100

[logging]
format = "json"
"#,
    );

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.pool.size, 3);
    assert_eq!(config.api.bind_port, 9100);
    assert_eq!(config.api.bind_address, "127.0.0.1");
    assert_eq!(config.logging.format, "json");

    let pool = config.pool.to_pool_config();
    assert_eq!(pool.capacity, 3);
    assert_eq!(pool.max_executions, 4);
    assert_eq!(pool.max_age, Duration::from_secs(600));
    assert_eq!(pool.maintenance_interval, Duration::from_secs(20));
    assert_eq!(pool.acquire_timeout, Duration::from_secs(30));
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_config("");
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.pool.size, 5);
    assert_eq!(config.telemetry.max_events, 1000);
}

#[test]
fn rejects_zero_pool_size() {
    let file = write_config("[pool]\nsize = 0\n");
    let result = Config::from_file(file.path());
    assert!(matches!(result, Err(WarmPoolError::Config(_))));
}

#[test]
fn rejects_malformed_toml() {
    let file = write_config("[pool\nsize = ");
    let result = Config::from_file(file.path());
    assert!(matches!(result, Err(WarmPoolError::Config(msg)) if msg.contains("parse")));
}

#[test]
fn missing_file_is_a_config_error() {
    let result = Config::from_file("/nonexistent/warmpool.toml");
    assert!(matches!(result, Err(WarmPoolError::Config(_))));
}

#[test]
fn generated_example_is_valid() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("warmpool.toml");

    Config::create_example(&path).unwrap();
    let config = Config::from_file(&path).unwrap();

    assert_eq!(config.pool.size, 5);
    assert_eq!(config.pool.max_age_minutes, 30);
    assert!(config.api.enabled);
}
