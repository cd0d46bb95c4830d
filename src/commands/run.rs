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
use std::io::Write;

use crate::registry::Registry;
use crate::ssh::{run_remote, Connection, ExitClass};

/// Run commands on the selected server. The returned value is the
/// process exit code, mirroring the outcome classification.
pub async fn run_commands(registry: &Registry, server: &str, commands: &[String]) -> Result<i32> {
    let profile = registry.resolve(server)?;

    let conn = Connection::connect(profile)
        .await
        .with_context(|| format!("cannot connect to '{}'", profile.name))?;

    let outcome = run_remote(&conn, commands).await;
    conn.disconnect().await;

    if !outcome.stdout.is_empty() {
        let mut stdout = std::io::stdout();
        let _ = stdout.write_all(outcome.stdout.as_bytes());
        let _ = stdout.flush();
    }

    if outcome.class != ExitClass::Success {
        eprintln!(
            "{} [{}] {}",
            "Error:".red().bold(),
            profile.name,
            outcome.message
        );
    }

    Ok(outcome.class.code())
}
