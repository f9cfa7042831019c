//! Common test utilities for chainpulse integration tests
//!
//! - Mock chain backend setup using wiremock
//! - CLI invocation helpers
//! - Canned backend replies

#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use chainpulse::config::Config;
use chainpulse::HttpBackend;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const EXECUTE_STEP: &str = "/api/chains/execute_step";
pub const TEST_STEP: &str = "/api/chains/test_step_in_isolation";

/// Client pointed at the mock server
pub fn backend(server: &MockServer) -> HttpBackend {
    let mut config = Config::default();
    config.set_base_url(&server.uri()).expect("mock server URI is a valid base");
    HttpBackend::new(&config.server).expect("failed to build backend")
}

/// Successful `execute_step` reply
pub fn step_reply(new_vars: Value, body: Value) -> Value {
    json!({
        "new_context_variables": new_vars,
        "request": {"payload": {}},
        "response": {"status_code": 200, "body": body}
    })
}

/// Answer `execute_step` for `step_id` with `reply`
pub async fn mount_step(server: &MockServer, step_id: &str, reply: Value) {
    Mock::given(method("POST"))
        .and(path(EXECUTE_STEP))
        .and(body_partial_json(json!({"step_id": step_id})))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply))
        .mount(server)
        .await;
}

/// The chainpulse binary with an isolated, empty config directory
pub struct Cli {
    config_home: TempDir,
}

impl Default for Cli {
    fn default() -> Self {
        Self::new()
    }
}

impl Cli {
    pub fn new() -> Self {
        Self {
            config_home: TempDir::new().expect("Failed to create temp config dir"),
        }
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("chainpulse").expect("chainpulse binary is built");
        cmd.env("XDG_CONFIG_HOME", self.config_home.path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .env_remove("CHAINPULSE_BASE_URL");
        cmd
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_home.path().to_path_buf()
    }
}

/// Write `content` to a file inside a fresh temp dir
pub fn temp_file(name: &str, content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let file_path = dir.path().join(name);
    std::fs::write(&file_path, content).expect("Failed to write temp file");
    (dir, file_path)
}

/// Strip ANSI color codes from a string
pub fn strip_colors(s: &str) -> String {
    let re = regex::Regex::new(r"\x1b\[[\d;]*m").unwrap();
    re.replace_all(s, "").to_string()
}

/// Test fixture paths
pub mod fixtures {
    use once_cell::sync::Lazy;
    use std::path::PathBuf;

    pub static FIXTURES_DIR: Lazy<PathBuf> = Lazy::new(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
    });

    pub fn fixture_path(name: &str) -> PathBuf {
        FIXTURES_DIR.join(name)
    }
}
