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

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::registry::Registry;
use crate::session::InteractiveSession;
use crate::ssh::Connection;

/// Open an interactive shell on the selected server.
pub async fn login(registry: &Registry, server: &str) -> Result<()> {
    let profile = registry.resolve(server)?;

    println!(
        "{} {} {}",
        ">>".green().bold(),
        "logging into".bold(),
        profile.name.cyan().bold()
    );

    let conn = Connection::connect(profile)
        .await
        .with_context(|| format!("cannot connect to '{}'", profile.name))?;

    let session = InteractiveSession::new(conn, profile.options.heartbeat_interval());
    session
        .run()
        .await
        .with_context(|| format!("session on '{}' failed", profile.name))?;

    Ok(())
}
