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

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use std::io::Write;
use std::path::Path;

use crate::endpoint::{
    self, check_compatible, join_path, posix_base, Endpoint, HostSelector, LocalBackend,
    RemoteBackend, Role,
};
use crate::registry::Registry;
use crate::ssh::Connection;
use crate::transfer::{SftpEngine, TransferEngine};

enum Direction {
    Send,
    Recv,
}

/// Copy between the local machine and one remote server. Exactly one
/// side must carry a `server:` selector.
pub async fn copy(registry: &Registry, source_arg: &str, dest_arg: &str) -> Result<()> {
    let src = endpoint::parse(source_arg);
    let dst = endpoint::parse(dest_arg);

    let (remote_key, direction) = match (&src.host, &dst.host) {
        (HostSelector::Local, HostSelector::Local) => {
            bail!("one endpoint must name a server, e.g. '1:/path' or 'alpha:/path'")
        }
        (HostSelector::Remote(_), HostSelector::Remote(_)) => {
            bail!("copying between two remote servers is not supported")
        }
        (HostSelector::Local, HostSelector::Remote(key)) => (key.clone(), Direction::Send),
        (HostSelector::Remote(key), HostSelector::Local) => (key.clone(), Direction::Recv),
    };

    let profile = registry.resolve(&remote_key)?;
    let conn = Connection::connect(profile)
        .await
        .with_context(|| format!("cannot connect to '{}'", profile.name))?;

    let result = copy_on(&conn, &direction, &src.path, &dst.path).await;
    conn.disconnect().await;
    result
}

async fn copy_on(
    conn: &Connection,
    direction: &Direction,
    src_path: &str,
    dst_path: &str,
) -> Result<()> {
    let local = LocalBackend;
    let remote = RemoteBackend::new(conn);

    let (src_ep, dst_ep) = match direction {
        Direction::Send => (
            endpoint::resolve(&local, src_path, Role::Source).await?,
            endpoint::resolve(&remote, dst_path, Role::Destination).await?,
        ),
        Direction::Recv => (
            endpoint::resolve(&remote, src_path, Role::Source).await?,
            endpoint::resolve(&local, dst_path, Role::Destination).await?,
        ),
    };
    check_compatible(&src_ep, &dst_ep)?;

    println!(
        "{} {} {} {}",
        "copy".bold(),
        src_ep.full_path().cyan(),
        "->".dimmed(),
        dst_ep.full_path().cyan()
    );

    let engine = SftpEngine::new(conn);
    let progress = &print_progress as &(dyn Fn(&str, u8) + Send + Sync);

    if src_ep.is_dir() {
        // Directory copies land inside the destination directory under
        // the source directory's own name.
        let target = join_path(&dst_ep.dir, &posix_base(&src_ep.dir));
        match direction {
            Direction::Send => {
                engine
                    .send_dir(Path::new(&src_ep.dir), &target, progress)
                    .await
            }
            Direction::Recv => {
                engine
                    .recv_dir(&src_ep.dir, Path::new(&target), progress)
                    .await
            }
        }
    } else {
        let target = file_target(&src_ep, &dst_ep);
        let src_full = src_ep.full_path();
        match direction {
            Direction::Send => {
                engine
                    .send_file(Path::new(&src_full), &target, progress)
                    .await
            }
            Direction::Recv => {
                engine
                    .recv_file(&src_full, Path::new(&target), progress)
                    .await
            }
        }
    }
    .context("transfer failed")?;

    println!("{}", "done".green());
    Ok(())
}

/// A directory destination keeps the source file's name; an explicit
/// destination name renames.
fn file_target(src: &Endpoint, dst: &Endpoint) -> String {
    if dst.is_dir() {
        join_path(&dst.dir, &src.file_name)
    } else {
        join_path(&dst.dir, &dst.file_name)
    }
}

fn print_progress(name: &str, pct: u8) {
    print!("\r  {name}  {pct:>3}%");
    let _ = std::io::stdout().flush();
    if pct == 100 {
        println!();
    }
}
