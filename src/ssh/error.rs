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

//! SSH error types.

use thiserror::Error;

/// Low-level SSH failures, before they are attributed to a connection
/// phase.
#[derive(Debug, Error)]
pub enum SshError {
    #[error("server rejected the password")]
    PasswordRejected,

    #[error("server rejected the private key")]
    KeyRejected,

    #[error("unusable private key: {0}")]
    KeyInvalid(#[from] russh::keys::Error),

    #[error("ssh protocol error: {0}")]
    Ssh(#[from] russh::Error),

    #[error("sftp error: {0}")]
    Sftp(#[from] russh_sftp::client::error::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SshError {
    /// Whether this failure happened in the authentication phase rather
    /// than transport establishment.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            SshError::PasswordRejected | SshError::KeyRejected | SshError::KeyInvalid(_)
        )
    }
}

/// Connection establishment failure, attributed to the phase that broke.
///
/// Callers branch on this distinction: an auth failure points at the
/// profile's credentials, a dial failure at the network or address.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("authentication failed for {user}@{host}: {source}")]
    Auth {
        host: String,
        user: String,
        source: SshError,
    },

    #[error("could not reach {host}:{port}: {source}")]
    Dial {
        host: String,
        port: u16,
        source: SshError,
    },
}
