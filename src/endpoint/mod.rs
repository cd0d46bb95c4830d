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

//! Copy endpoint parsing and path classification.
//!
//! A raw `[host:]path` argument becomes a canonical `(directory, file
//! name)` pair resolved against the backend that owns the path. An empty
//! file name means the endpoint denotes a directory.

mod backend;


pub use backend::{LocalBackend, PathBackend, RemoteBackend};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("source path not found: {0}")]
    SourceNotFound(String),

    /// Overwriting an existing file is not supported; the user must
    /// remove the file first.
    #[error("destination already exists: {0}")]
    DestinationAlreadyExists(String),

    #[error("destination parent directory does not exist: {0}")]
    DestinationParentMissing(String),

    #[error("cannot copy a directory onto a file: {0}")]
    DirectoryToFileMismatch(String),

    /// The check itself failed to execute, as opposed to answering no.
    #[error("remote check execution error on {path}: {detail}")]
    Probe { path: String, detail: String },
}

/// Which machine a path lives on. A remote selector carries the registry
/// flag or display name of the server, unresolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSelector {
    Local,
    Remote(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Destination,
}

/// One side of a copy, as written on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEndpoint {
    pub host: HostSelector,
    pub path: String,
}

/// Split `[host:]path`. No selector or an empty one means local; an
/// empty path means the backend's working directory.
pub fn parse(arg: &str) -> RawEndpoint {
    let (host, path) = match arg.split_once(':') {
        Some(("", path)) => (HostSelector::Local, path),
        Some((host, path)) => (HostSelector::Remote(host.to_string()), path),
        None => (HostSelector::Local, arg),
    };
    let path = if path.is_empty() { "./" } else { path };
    RawEndpoint {
        host,
        path: path.to_string(),
    }
}

/// A classified endpoint: canonical directory plus optional file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub dir: String,
    pub file_name: String,
}

impl Endpoint {
    /// An empty file name means this endpoint denotes a directory.
    pub fn is_dir(&self) -> bool {
        self.file_name.is_empty()
    }

    /// The full path this endpoint denotes.
    pub fn full_path(&self) -> String {
        if self.is_dir() {
            self.dir.clone()
        } else {
            join_path(&self.dir, &self.file_name)
        }
    }
}

/// Resolve a path against its backend for the given role.
pub async fn resolve(
    backend: &dyn PathBackend,
    path: &str,
    role: Role,
) -> Result<Endpoint, ResolveError> {
    let canonical = backend.canonicalize(path).await?;
    let exists = backend.exists(&canonical).await?;

    match role {
        Role::Source => {
            if !exists {
                return Err(ResolveError::SourceNotFound(canonical));
            }
            if backend.is_file(&canonical).await? {
                Ok(split_endpoint(&canonical))
            } else {
                Ok(dir_endpoint(&canonical))
            }
        }
        Role::Destination => {
            if exists {
                if backend.is_file(&canonical).await? {
                    return Err(ResolveError::DestinationAlreadyExists(canonical));
                }
                return Ok(dir_endpoint(&canonical));
            }
            let parent = posix_parent(&canonical);
            if !backend.exists(&parent).await? {
                return Err(ResolveError::DestinationParentMissing(parent));
            }
            Ok(Endpoint {
                dir: parent,
                file_name: posix_base(&canonical),
            })
        }
    }
}

/// Checked after both sides resolve, before any transfer starts.
pub fn check_compatible(source: &Endpoint, dest: &Endpoint) -> Result<(), ResolveError> {
    if source.is_dir() && !dest.is_dir() {
        return Err(ResolveError::DirectoryToFileMismatch(dest.full_path()));
    }
    Ok(())
}

fn dir_endpoint(canonical: &str) -> Endpoint {
    Endpoint {
        dir: trim_trailing_slashes(canonical).to_string(),
        file_name: String::new(),
    }
}

fn split_endpoint(canonical: &str) -> Endpoint {
    Endpoint {
        dir: posix_parent(canonical),
        file_name: posix_base(canonical),
    }
}

/// POSIX string-level path helpers. Canonical remote paths never pass
/// through std::path, which would apply host-platform rules.
fn trim_trailing_slashes(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

pub fn posix_base(path: &str) -> String {
    let trimmed = trim_trailing_slashes(path);
    match trimmed.rfind('/') {
        Some(i) if trimmed != "/" => trimmed[i + 1..].to_string(),
        _ => trimmed.to_string(),
    }
}

pub fn posix_parent(path: &str) -> String {
    let trimmed = trim_trailing_slashes(path);
    match trimmed.rfind('/') {
        Some(0) => "/".to_string(),
        Some(i) => trimmed[..i].to_string(),
        None => ".".to_string(),
    }
}

pub fn join_path(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}
