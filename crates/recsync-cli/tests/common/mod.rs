use std::path::Path;
use std::process::Output;

use tokio::process::Command;
use wiremock::MockServer;

/// Endpoint URL of a mock store.
pub fn endpoint(server: &MockServer) -> String {
    format!("http://127.0.0.1:{}", server.address().port())
}

/// Run the CLI with an isolated HOME so profile storage never leaks.
pub async fn run_cli(args: &[&str], home: &Path, env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_recsync"));
    cmd.args(args);
    cmd.env("HOME", home);
    cmd.env("XDG_DATA_HOME", home.join("data"));
    cmd.env_remove("RECSYNC_ENDPOINT");
    cmd.env_remove("RECSYNC_TOKEN");
    cmd.env_remove("RUST_LOG");
    cmd.env("NO_COLOR", "1");
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().await.expect("Failed to execute CLI")
}

/// Run the CLI against `server` and expect success.
pub async fn run_cli_success(args: &[&str], home: &Path, server: &MockServer) -> String {
    let endpoint = endpoint(server);
    let output = run_cli(
        args,
        home,
        &[("RECSYNC_ENDPOINT", &endpoint), ("RECSYNC_TOKEN", "test-token")],
    )
    .await;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        panic!("CLI command failed: {:?}\nstderr: {}", args, stderr);
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Run the CLI against `server` and expect failure, returning stderr.
pub async fn run_cli_failure(args: &[&str], home: &Path, server: &MockServer) -> String {
    let endpoint = endpoint(server);
    let output = run_cli(
        args,
        home,
        &[("RECSYNC_ENDPOINT", &endpoint), ("RECSYNC_TOKEN", "test-token")],
    )
    .await;
    if output.status.success() {
        panic!("CLI command should have failed: {:?}", args);
    }
    String::from_utf8_lossy(&output.stderr).to_string()
}
