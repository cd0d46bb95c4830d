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

//! Registry mutations: add, edit, remove.
//!
//! Each mutation prompts on stdin with current values as defaults, then
//! goes through the full persist, backup, reload, rebuild round-trip
//! before re-rendering the listing.

use anyhow::{anyhow, Context, Result};
use owo_colors::OwoColorize;
use std::io::{self, Write};

use crate::config::{AuthMethodKind, ServerProfile};
use crate::registry::Registry;
use crate::secret;

pub async fn add(registry: &mut Registry, group: Option<&str>) -> Result<()> {
    let profile = prompt_profile(&ServerProfile::blank())?;
    registry.add(profile, group)?;
    registry.commit().await?;
    println!("{}", registry.render_listing());
    Ok(())
}

pub async fn edit(registry: &mut Registry, flag: &str) -> Result<()> {
    let current = registry
        .resolve_flag(flag)
        .ok_or_else(|| anyhow!("no server at flag '{flag}'"))?
        .clone();
    let updated = prompt_profile(&current)?;
    registry.edit(flag, updated)?;
    registry.commit().await?;
    println!("{}", registry.render_listing());
    Ok(())
}

pub async fn remove(registry: &mut Registry, flag: &str) -> Result<()> {
    let name = registry
        .resolve_flag(flag)
        .ok_or_else(|| anyhow!("no server at flag '{flag}'"))?
        .name
        .clone();

    let answer = prompt(&format!("remove '{name}'? (y/N)"), "")?;
    if !answer.eq_ignore_ascii_case("y") {
        println!("aborted");
        return Ok(());
    }

    registry.remove(flag)?;
    registry.commit().await?;
    println!("{}", registry.render_listing());
    Ok(())
}

fn prompt_profile(base: &ServerProfile) -> Result<ServerProfile> {
    let mut profile = base.clone();

    profile.name = prompt("name", &base.name)?;
    profile.ip = prompt("ip", &base.ip)?;
    let port = prompt("port", &base.port.to_string())?;
    profile.port = port
        .parse()
        .with_context(|| format!("invalid port '{port}'"))?;
    profile.user = prompt("user", &base.user)?;

    let method = prompt("method (password/key)", &String::from(base.method))?;
    profile.method = AuthMethodKind::from(method);

    match profile.method {
        AuthMethodKind::Key => {
            profile.key = prompt("key file (empty for ~/.ssh/id_rsa)", &base.key)?;
        }
        AuthMethodKind::Password => {
            // Stored obfuscated; an empty answer keeps the current secret.
            let entered = prompt("password (empty keeps current)", "")?;
            if !entered.is_empty() {
                profile.password = secret::encrypt(&entered);
            }
        }
    }

    Ok(profile)
}

fn prompt(label: &str, default: &str) -> Result<String> {
    if default.is_empty() {
        print!("{}: ", label.bold());
    } else {
        print!("{} [{}]: ", label.bold(), default.dimmed());
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let value = line.trim();
    Ok(if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    })
}
