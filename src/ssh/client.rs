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

//! Connection establishment and authentication.
//!
//! One profile in, one authenticated [`Connection`] out. Failures are
//! attributed to the phase that broke: dial (TCP/handshake) or auth.

use russh::client::{Config, Handle, Handler, Msg};
use russh::keys::PrivateKeyWithHashAlg;
use russh::{Channel, Disconnect};
use russh_sftp::client::SftpSession;
use std::path::Path;
use std::sync::Arc;
use zeroize::Zeroizing;

use super::error::{ConnectError, SshError};
use crate::config::{AuthMethodKind, ServerProfile};
use crate::secret;
use crate::utils::expand_tilde;

const DEFAULT_KEY_PATH: &str = "~/.ssh/id_rsa";

/// An authenticated SSH connection to one server.
pub struct Connection {
    handle: Handle<ClientHandler>,
    host: String,
    port: u16,
    user: String,
}

impl Connection {
    /// Dial and authenticate according to the profile.
    ///
    /// Password profiles with an empty password fall through to key auth
    /// with the default key; stored passwords are deobfuscated first and
    /// used verbatim when deobfuscation fails, so pre-obfuscation configs
    /// keep working.
    pub async fn connect(profile: &ServerProfile) -> Result<Self, ConnectError> {
        let host = profile.ip.clone();
        let port = profile.port;
        let user = profile.user.clone();

        let config = Arc::new(Config::default());
        let mut handle =
            russh::client::connect(config, (host.as_str(), port), ClientHandler)
                .await
                .map_err(|e| ConnectError::Dial {
                    host: host.clone(),
                    port,
                    source: SshError::Ssh(e),
                })?;

        tracing::debug!(%host, port, %user, "transport established");

        let auth = |source: SshError| ConnectError::Auth {
            host: host.clone(),
            user: user.clone(),
            source,
        };

        match profile.method {
            AuthMethodKind::Password if !profile.password.is_empty() => {
                let password = resolve_password(&profile.password);
                let result = handle
                    .authenticate_password(&user, password.as_str())
                    .await
                    .map_err(|e| auth(SshError::Ssh(e)))?;
                if !result.success() {
                    return Err(auth(SshError::PasswordRejected));
                }
            }
            _ => {
                authenticate_with_key(&mut handle, &user, &profile.key)
                    .await
                    .map_err(auth)?;
            }
        }

        tracing::debug!(%host, %user, "authenticated");

        Ok(Self {
            handle,
            host,
            port,
            user,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Open a fresh session channel on this connection.
    pub async fn open_channel(&self) -> Result<Channel<Msg>, SshError> {
        Ok(self.handle.channel_open_session().await?)
    }

    /// Open an SFTP subsystem session on a fresh channel.
    pub async fn sftp(&self) -> Result<SftpSession, SshError> {
        let channel = self.open_channel().await?;
        channel.request_subsystem(true, "sftp").await?;
        Ok(SftpSession::new(channel.into_stream()).await?)
    }

    /// Tell the server we are leaving. Errors here are of no consequence
    /// to the caller; the transport is going away either way.
    pub async fn disconnect(&self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "")
            .await
        {
            tracing::debug!("disconnect: {e}");
        }
    }
}

/// Stored passwords are obfuscated at rest; configs written before
/// obfuscation existed carry them raw.
fn resolve_password(stored: &str) -> Zeroizing<String> {
    match secret::decrypt(stored) {
        Ok(plain) => plain,
        Err(e) => {
            tracing::warn!("stored password is not in the obfuscated form ({e}), using it as-is");
            Zeroizing::new(stored.to_string())
        }
    }
}

async fn authenticate_with_key(
    handle: &mut Handle<ClientHandler>,
    user: &str,
    key: &str,
) -> Result<(), SshError> {
    let path = if key.is_empty() { DEFAULT_KEY_PATH } else { key };
    let path = expand_tilde(Path::new(path));
    let secret_key = russh::keys::load_secret_key(&path, None)?;

    let result = handle
        .authenticate_publickey(
            user,
            PrivateKeyWithHashAlg::new(
                Arc::new(secret_key),
                handle.best_supported_rsa_hash().await?.flatten(),
            ),
        )
        .await?;
    if !result.success() {
        return Err(SshError::KeyRejected);
    }
    Ok(())
}

/// Client-side handler. Host keys are accepted unconditionally; this tool
/// targets lab fleets where hosts are reimaged often and known_hosts
/// churn would make every command interactive.
pub struct ClientHandler;

impl Handler for ClientHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh::keys::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn obfuscated_password_is_recovered() {
        let stored = secret::encrypt("hunter2");
        assert_eq!(resolve_password(&stored).as_str(), "hunter2");
    }

    #[test]
    fn raw_password_passes_through() {
        // Not valid base64, so deobfuscation fails and the stored value
        // is used as-is.
        assert_eq!(resolve_password("plain pass!").as_str(), "plain pass!");
    }
}
