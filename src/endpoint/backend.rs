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

//! Path classification backends.
//!
//! The remote backend has no filesystem API to call, so it derives
//! answers from short marker commands run over the connection. The
//! probe strings are part of the external contract and must work on
//! any POSIX shell.

use async_trait::async_trait;
use std::path::Path;

use super::ResolveError;
use crate::ssh::{exec_capture, Connection};
use crate::utils::{absolutize, expand_tilde};

#[async_trait]
pub trait PathBackend: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool, ResolveError>;
    async fn is_file(&self, path: &str) -> Result<bool, ResolveError>;
    /// Resolve to an absolute path. Never requires the path to exist.
    async fn canonicalize(&self, path: &str) -> Result<String, ResolveError>;
}

/// The local filesystem.
pub struct LocalBackend;

#[async_trait]
impl PathBackend for LocalBackend {
    async fn exists(&self, path: &str) -> Result<bool, ResolveError> {
        Ok(Path::new(path).exists())
    }

    async fn is_file(&self, path: &str) -> Result<bool, ResolveError> {
        Ok(Path::new(path).is_file())
    }

    async fn canonicalize(&self, path: &str) -> Result<String, ResolveError> {
        let expanded = expand_tilde(Path::new(path));
        let absolute = absolutize(&expanded).map_err(|e| ResolveError::Probe {
            path: path.to_string(),
            detail: e.to_string(),
        })?;
        Ok(absolute.to_string_lossy().into_owned())
    }
}

/// A remote filesystem reached through shell probes on a connection.
pub struct RemoteBackend<'a> {
    conn: &'a Connection,
}

impl<'a> RemoteBackend<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    async fn probe(&self, command: String, path: &str) -> Result<String, ResolveError> {
        let output = exec_capture(self.conn, &command)
            .await
            .map_err(|e| ResolveError::Probe {
                path: path.to_string(),
                detail: e.to_string(),
            })?;
        Ok(output.stdout)
    }
}

#[async_trait]
impl PathBackend for RemoteBackend<'_> {
    async fn exists(&self, path: &str) -> Result<bool, ResolveError> {
        let reply = self.probe(exists_probe(path), path).await?;
        parse_probe_token(&reply, path)
    }

    async fn is_file(&self, path: &str) -> Result<bool, ResolveError> {
        let reply = self.probe(file_probe(path), path).await?;
        parse_probe_token(&reply, path)
    }

    async fn canonicalize(&self, path: &str) -> Result<String, ResolveError> {
        if path.starts_with('/') {
            return Ok(path.to_string());
        }

        let reply = self.probe(resolve_probe(path), path).await?;
        let resolved = reply.trim_matches(['\n', '\r', ' ']);
        if resolved.is_empty() {
            return Err(ResolveError::Probe {
                path: path.to_string(),
                detail: "empty reply to path resolution".to_string(),
            });
        }
        Ok(resolved.to_string())
    }
}

/// The probe command strings are an interoperability contract with
/// arbitrary POSIX remote shells; they must be emitted exactly as below.
pub(super) fn exists_probe(path: &str) -> String {
    format!("[ -e {path} ] && echo 1 || echo 2")
}

pub(super) fn file_probe(path: &str) -> String {
    format!("[ -f {path} ] && echo 1 || echo 2")
}

/// Relative paths resolve against the login shell's working directory.
/// A leading `.` or `~` is dropped so `./x` and `~/x` both become
/// `$PWD/x`. Absolute paths never reach this.
pub(super) fn resolve_probe(path: &str) -> String {
    if path.starts_with('.') || path.starts_with('~') {
        format!("echo $PWD{}", &path[1..])
    } else {
        format!("echo $PWD/{path}")
    }
}

/// Probe replies are a single marker token, `1` for yes and `2` for no,
/// possibly wrapped in shell line-ending noise.
pub(super) fn parse_probe_token(raw: &str, path: &str) -> Result<bool, ResolveError> {
    match raw.trim_matches(['\n', '\r', ' ']) {
        "1" => Ok(true),
        "2" => Ok(false),
        other => Err(ResolveError::Probe {
            path: path.to_string(),
            detail: format!("unexpected probe reply {other:?}"),
        }),
    }
}
