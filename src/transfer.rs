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

//! File transfer over SFTP.
//!
//! The engine receives already-classified endpoints; it never second-
//! guesses path resolution. Progress is reported per file as a name and
//! a percentage.
//!
//! Some sshd_config files do not enable sftp by default; the remote side
//! needs a `Subsystem sftp` line for any of this to work.

use async_trait::async_trait;
use russh_sftp::{client::SftpSession, protocol::OpenFlags};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::ssh::{Connection, SshError};

const CHUNK_SIZE: usize = 64 * 1024;

/// Per-file progress callback: file name and completed percentage.
pub type Progress<'a> = &'a (dyn Fn(&str, u8) + Send + Sync);

/// The four transfer operations the copy command dispatches to.
#[async_trait]
pub trait TransferEngine {
    async fn send_file(&self, local: &Path, remote: &str, progress: Progress<'_>)
        -> Result<(), SshError>;
    async fn send_dir(&self, local: &Path, remote: &str, progress: Progress<'_>)
        -> Result<(), SshError>;
    async fn recv_file(&self, remote: &str, local: &Path, progress: Progress<'_>)
        -> Result<(), SshError>;
    async fn recv_dir(&self, remote: &str, local: &Path, progress: Progress<'_>)
        -> Result<(), SshError>;
}

/// SFTP-backed engine. Each operation runs on its own subsystem channel
/// so a failed transfer never poisons the connection.
pub struct SftpEngine<'a> {
    conn: &'a Connection,
}

impl<'a> SftpEngine<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl TransferEngine for SftpEngine<'_> {
    async fn send_file(
        &self,
        local: &Path,
        remote: &str,
        progress: Progress<'_>,
    ) -> Result<(), SshError> {
        let sftp = self.conn.sftp().await?;
        upload_one(&sftp, local, remote, progress).await
    }

    async fn send_dir(
        &self,
        local: &Path,
        remote: &str,
        progress: Progress<'_>,
    ) -> Result<(), SshError> {
        let sftp = self.conn.sftp().await?;
        // Already exists is fine; the write below will tell us otherwise.
        let _ = sftp.create_dir(remote).await;
        upload_dir_recursive(&sftp, local, remote, progress).await
    }

    async fn recv_file(
        &self,
        remote: &str,
        local: &Path,
        progress: Progress<'_>,
    ) -> Result<(), SshError> {
        let sftp = self.conn.sftp().await?;
        download_one(&sftp, remote, local, progress).await
    }

    async fn recv_dir(
        &self,
        remote: &str,
        local: &Path,
        progress: Progress<'_>,
    ) -> Result<(), SshError> {
        let sftp = self.conn.sftp().await?;
        tokio::fs::create_dir_all(local).await?;
        download_dir_recursive(&sftp, remote, local, progress).await
    }
}

async fn upload_one(
    sftp: &SftpSession,
    local: &Path,
    remote: &str,
    progress: Progress<'_>,
) -> Result<(), SshError> {
    let name = file_label(local);
    let total = tokio::fs::metadata(local).await?.len();
    let mut src = tokio::fs::File::open(local).await?;

    let mut dst = sftp
        .open_with_flags(
            remote,
            OpenFlags::CREATE | OpenFlags::TRUNCATE | OpenFlags::WRITE,
        )
        .await?;

    let mut done: u64 = 0;
    let mut chunk = vec![0u8; CHUNK_SIZE];
    progress(&name, percent(done, total));
    loop {
        let n = src.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        dst.write_all(&chunk[..n]).await?;
        done += n as u64;
        progress(&name, percent(done, total));
    }

    dst.flush().await?;
    dst.shutdown().await?;
    progress(&name, 100);
    Ok(())
}

async fn download_one(
    sftp: &SftpSession,
    remote: &str,
    local: &Path,
    progress: Progress<'_>,
) -> Result<(), SshError> {
    let name = crate::endpoint::posix_base(remote);
    let total = sftp.metadata(remote).await?.size.unwrap_or(0);

    let mut src = sftp.open_with_flags(remote, OpenFlags::READ).await?;
    let mut dst = tokio::fs::File::create(local).await?;

    let mut done: u64 = 0;
    let mut chunk = vec![0u8; CHUNK_SIZE];
    progress(&name, percent(done, total));
    loop {
        let n = src.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        dst.write_all(&chunk[..n]).await?;
        done += n as u64;
        progress(&name, percent(done, total));
    }

    dst.flush().await?;
    progress(&name, 100);
    Ok(())
}

fn upload_dir_recursive<'a>(
    sftp: &'a SftpSession,
    local: &'a Path,
    remote: &'a str,
    progress: Progress<'a>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), SshError>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = tokio::fs::read_dir(local).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            let remote_path = format!("{remote}/{name}");
            let metadata = entry.metadata().await?;

            if metadata.is_dir() {
                let _ = sftp.create_dir(&remote_path).await;
                upload_dir_recursive(sftp, &path, &remote_path, progress).await?;
            } else if metadata.is_file() {
                upload_one(sftp, &path, &remote_path, progress).await?;
            }
        }
        Ok(())
    })
}

fn download_dir_recursive<'a>(
    sftp: &'a SftpSession,
    remote: &'a str,
    local: &'a Path,
    progress: Progress<'a>,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<(), SshError>> + Send + 'a>> {
    Box::pin(async move {
        for entry in sftp.read_dir(remote).await? {
            let name = entry.file_name();
            if name == "." || name == ".." {
                continue;
            }

            let remote_path = format!("{remote}/{name}");
            let local_path = local.join(&name);
            let file_type = entry.metadata().file_type();

            if file_type.is_dir() {
                tokio::fs::create_dir_all(&local_path).await?;
                download_dir_recursive(sftp, &remote_path, &local_path, progress).await?;
            } else if file_type.is_file() {
                download_one(sftp, &remote_path, &local_path, progress).await?;
            }
        }
        Ok(())
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.saturating_mul(100)) / total).min(100) as u8
}
