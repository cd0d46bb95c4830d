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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Main configuration structure, the root of the config artifact.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub show_detail: bool,

    #[serde(default)]
    pub servers: Vec<ServerProfile>,

    #[serde(default)]
    pub groups: Vec<Group>,

    /// Global defaults merged into every profile without overwriting
    /// profile-local values.
    #[serde(default)]
    pub options: ServerOptions,
}

/// A named collection of servers sharing an addressing prefix.
///
/// A member's address flag is the group prefix concatenated with its
/// 1-based position, e.g. prefix `g` and position 2 yield `g2`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct Group {
    pub group_name: String,
    pub prefix: String,
    #[serde(default)]
    pub servers: Vec<ServerProfile>,
}

/// Connection profile for one remote server.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerProfile {
    pub name: String,
    pub ip: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    /// Obfuscated password (see the `secret` module). May be empty when
    /// `method` is `key` or when key auth is the intended fallback.
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub method: AuthMethodKind,

    /// Private key file path, only consulted for key auth.
    /// Empty means `~/.ssh/id_rsa`.
    #[serde(default)]
    pub key: String,

    #[serde(default)]
    pub options: ServerOptions,
}

impl ServerProfile {
    /// A blank profile used as the starting point for `add`.
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            ip: String::new(),
            port: default_port(),
            user: String::new(),
            password: String::new(),
            method: AuthMethodKind::default(),
            key: String::new(),
            options: ServerOptions::default(),
        }
    }

    /// Apply profile defaults: port 22 and password auth.
    pub fn apply_defaults(&mut self) {
        if self.port == 0 {
            self.port = default_port();
        }
    }
}

/// Authentication method for a profile.
///
/// Anything that is not recognizably key-based is treated as password
/// auth; config files in the wild carry values like `k` for key.
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum AuthMethodKind {
    #[default]
    Password,
    Key,
}

impl From<String> for AuthMethodKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "key" | "k" => AuthMethodKind::Key,
            _ => AuthMethodKind::Password,
        }
    }
}

impl From<AuthMethodKind> for String {
    fn from(m: AuthMethodKind) -> Self {
        match m {
            AuthMethodKind::Password => "password".to_string(),
            AuthMethodKind::Key => "key".to_string(),
        }
    }
}

/// Per-server option bag.
///
/// Recognized options are typed fields; anything else is carried through
/// `extra` untouched so future options survive an edit round-trip.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct ServerOptions {
    /// Keepalive heartbeat interval in seconds. Absent means the
    /// keepalive loop is disabled for interactive sessions.
    #[serde(
        rename = "ServerAliveInterval",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub server_alive_interval: Option<u64>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ServerOptions {
    /// Merge global defaults into this bag without overwriting local values.
    pub fn merge_defaults(&mut self, global: &ServerOptions) {
        if self.server_alive_interval.is_none() {
            self.server_alive_interval = global.server_alive_interval;
        }
        for (k, v) in &global.extra {
            self.extra.entry(k.clone()).or_insert_with(|| v.clone());
        }
    }

    /// Heartbeat interval, if keepalive is enabled.
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.server_alive_interval.map(Duration::from_secs)
    }
}

pub(super) fn default_port() -> u16 {
    22
}
