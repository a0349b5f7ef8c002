use std::io::Write;

use api_fest::config::{load_config, load_config_lenient};
use api_fest::model::Transport;

fn write_temp_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("api_fest_test_")
        .suffix(".toml")
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn valid_config_loads() {
    let file = write_temp_config(
        r#"
[server]
listen = "0.0.0.0:8080"
log_level = "debug"
metrics_enabled = false

[client]
base_url = "http://localhost:8080/"
timeout_secs = 3
transport = "graphql"
trpc_batch = true
"#,
    );
    let config = load_config(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.server.listen, "0.0.0.0:8080");
    assert_eq!(config.server.log_level, "debug");
    assert!(!config.server.metrics_enabled);
    assert_eq!(config.client.base_url, "http://localhost:8080/");
    assert_eq!(config.client.timeout_secs, 3);
    assert_eq!(config.client.transport().unwrap(), Transport::GraphQl);
    assert!(config.client.trpc_batch);
}

#[test]
fn missing_config_file_errors() {
    let result = load_config("nonexistent_test_file.toml");
    assert!(result.is_err());
    let err = format!("{:#}", result.unwrap_err());
    assert!(
        err.contains("nonexistent_test_file.toml"),
        "Error should mention the file path: {err}"
    );
}

#[test]
fn missing_config_file_is_defaults_when_lenient() {
    let config = load_config_lenient("nonexistent_test_file.toml").unwrap();
    assert_eq!(config.server.listen, "127.0.0.1:3000");
    assert_eq!(config.client.transport().unwrap(), Transport::Rest);
}

#[test]
fn malformed_toml_errors() {
    let file = write_temp_config("this is [[[not valid toml");
    let result = load_config_lenient(file.path().to_str().unwrap());
    assert!(result.is_err());
    let err = format!("{:#}", result.unwrap_err());
    assert!(
        err.contains("parse") || err.contains("expected"),
        "Error should mention parse failure: {err}"
    );
}

#[test]
fn invalid_listen_errors() {
    let file = write_temp_config(
        r#"
[server]
listen = "not-an-address"
"#,
    );
    let result = load_config(file.path().to_str().unwrap());
    let err = format!("{:#}", result.unwrap_err());
    assert!(err.contains("server.listen"), "Error should name the field: {err}");
}

#[test]
fn relative_base_url_errors() {
    let file = write_temp_config(
        r#"
[client]
base_url = "localhost:3000"
"#,
    );
    let result = load_config(file.path().to_str().unwrap());
    let err = format!("{:#}", result.unwrap_err());
    assert!(err.contains("base_url"), "Error should name the field: {err}");
}

#[test]
fn defaults_applied() {
    let file = write_temp_config("[server]\n[client]\n");
    let config = load_config(file.path().to_str().unwrap()).unwrap();

    assert_eq!(config.server.listen, "127.0.0.1:3000");
    assert_eq!(config.server.log_level, "info");
    assert!(config.server.metrics_enabled);
    assert_eq!(config.client.base_url, "http://127.0.0.1:3000");
    assert_eq!(config.client.timeout_secs, 10);
    assert_eq!(config.client.transport, "rest");
    assert!(!config.client.trpc_batch);
}
