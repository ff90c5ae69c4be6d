// Runs the binary so the terminate-on-bad-config path can be observed from outside.

use std::process::Command;

fn rabbitenv() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rabbitenv"));
    // keep a stray .env or shell export from leaking in
    for (key, _) in std::env::vars() {
        if key.starts_with("RABBITMQ_") {
            cmd.env_remove(key);
        }
    }
    cmd.env("RUST_LOG", "error");
    cmd
}

#[test]
fn test_config_prints_resolved_values() {
    let output = rabbitenv()
        .arg("config")
        .env("RABBITMQ_HOST", "localhost")
        .output()
        .expect("failed to run rabbitenv");

    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["queue"], "signature");
    assert_eq!(json["host"], "localhost");
    assert_eq!(json["durable"], true);
    assert!(json.get("pass").is_none());
}

#[test]
fn test_invalid_bool_terminates_process() {
    let output = rabbitenv()
        .arg("config")
        .env("RABBITMQ_DURABLE", "notabool")
        .output()
        .expect("failed to run rabbitenv");

    assert_eq!(output.status.code(), Some(1));
    let logged = String::from_utf8_lossy(&output.stdout);
    assert!(logged.contains("notabool"), "log output: {}", logged);
}

#[test]
fn test_config_prints_single_key() {
    let output = rabbitenv()
        .args(["config", "--key", "queue"])
        .env("RABBITMQ_QUEUE_OWN", "orders")
        .output()
        .expect("failed to run rabbitenv");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "orders");

    let output = rabbitenv()
        .args(["config", "--key", "durable"])
        .output()
        .expect("failed to run rabbitenv");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "true");
}

#[test]
fn test_publish_rejects_invalid_bool_before_connecting() {
    let output = rabbitenv()
        .args(["publish", "test"])
        .env("RABBITMQ_MANDATORY", "notabool")
        // nothing listens here; a connection attempt would fail differently
        .env("RABBITMQ_PORT", "1")
        .output()
        .expect("failed to run rabbitenv");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"), "stderr: {}", stderr);
    assert!(stderr.contains("notabool"), "stderr: {}", stderr);
}
