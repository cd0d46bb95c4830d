// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration tests.

use super::types::{AuthMethodKind, Config, ServerOptions};
use super::ConfigError;

#[test]
fn test_config_parsing() {
    let json = r#"
{
    "show_detail": true,
    "servers": [
        {"name": "alpha", "ip": "10.0.0.1", "user": "root"},
        {"name": "bravo", "ip": "10.0.0.2", "port": 2222, "user": "admin", "method": "k", "key": "~/.ssh/bravo"}
    ],
    "groups": [
        {
            "group_name": "staging",
            "prefix": "s",
            "servers": [
                {"name": "stage1", "ip": "10.1.0.1", "user": "deploy", "options": {"ServerAliveInterval": 15}}
            ]
        }
    ],
    "options": {"ServerAliveInterval": 30, "Compression": "yes"}
}
"#;

    let config: Config = serde_json::from_str(json).unwrap();
    assert!(config.show_detail);
    assert_eq!(config.servers.len(), 2);
    assert_eq!(config.groups.len(), 1);

    // Port defaults to 22 when absent.
    assert_eq!(config.servers[0].port, 22);
    assert_eq!(config.servers[1].port, 2222);

    // Method parses leniently: absent -> password, "k" -> key.
    assert_eq!(config.servers[0].method, AuthMethodKind::Password);
    assert_eq!(config.servers[1].method, AuthMethodKind::Key);

    assert_eq!(config.options.server_alive_interval, Some(30));
    assert!(config.options.extra.contains_key("Compression"));
    assert_eq!(
        config.groups[0].servers[0].options.server_alive_interval,
        Some(15)
    );
}

#[test]
fn test_unknown_method_falls_back_to_password() {
    let json = r#"{"servers": [{"name": "a", "ip": "h", "method": "weird"}]}"#;
    let config: Config = serde_json::from_str(json).unwrap();
    assert_eq!(config.servers[0].method, AuthMethodKind::Password);
}

#[test]
fn test_merge_defaults_does_not_overwrite() {
    let mut local = ServerOptions {
        server_alive_interval: Some(5),
        ..ServerOptions::default()
    };
    let global: ServerOptions = serde_json::from_str(
        r#"{"ServerAliveInterval": 60, "Compression": "yes"}"#,
    )
    .unwrap();

    local.merge_defaults(&global);

    // Local value wins; missing keys come from the global bag.
    assert_eq!(local.server_alive_interval, Some(5));
    assert_eq!(
        local.extra.get("Compression").and_then(|v| v.as_str()),
        Some("yes")
    );
}

#[test]
fn test_merge_defaults_fills_absent_interval() {
    let mut local = ServerOptions::default();
    let global = ServerOptions {
        server_alive_interval: Some(60),
        ..ServerOptions::default()
    };

    local.merge_defaults(&global);
    assert_eq!(local.server_alive_interval, Some(60));
}

#[test]
fn test_options_round_trip_preserves_extra_keys() {
    let json = r#"{"ServerAliveInterval": 10, "ForwardAgent": true}"#;
    let options: ServerOptions = serde_json::from_str(json).unwrap();
    let back = serde_json::to_value(&options).unwrap();
    assert_eq!(back["ServerAliveInterval"], 10);
    assert_eq!(back["ForwardAgent"], true);
}

#[tokio::test]
async fn test_load_missing_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.json");
    match Config::load(&path).await {
        Err(ConfigError::NotFound(p)) => assert_eq!(p, path),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_load_malformed_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    tokio::fs::write(&path, "{ not json").await.unwrap();
    assert!(matches!(
        Config::load(&path).await,
        Err(ConfigError::Malformed { .. })
    ));
}

#[tokio::test]
async fn test_save_writes_backup_before_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let config = Config::default();
    config.save(&path).await.unwrap();

    // First save: no prior file, so no backup.
    let count = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(count, 1);

    config.save(&path).await.unwrap();

    // Second save: the previous file was copied aside first.
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.iter().any(|n| n.starts_with("sshm-")));
}

#[tokio::test]
async fn test_save_then_load_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");

    let json = r#"{"servers": [{"name": "alpha", "ip": "10.0.0.1", "user": "root"}]}"#;
    let config: Config = serde_json::from_str(json).unwrap();
    config.save(&path).await.unwrap();

    let reloaded = Config::load(&path).await.unwrap();
    assert_eq!(reloaded.servers.len(), 1);
    assert_eq!(reloaded.servers[0].name, "alpha");
    assert_eq!(reloaded.servers[0].port, 22);
}
