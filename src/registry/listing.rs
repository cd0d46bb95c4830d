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

//! Registry listing rendered for the terminal.

use owo_colors::OwoColorize;
use std::fmt::Write;

use super::Registry;
use crate::config::ServerProfile;

const WIDTH: usize = 46;

impl Registry {
    /// Render the full listing: flat servers first, then every non-empty
    /// group under its own separator, all in declaration order.
    pub fn render_listing(&self) -> String {
        let mut out = String::new();
        let detail = self.config().show_detail;

        writeln!(out, "{}", banner("sshm", '=')).ok();

        for (i, server) in self.config().servers.iter().enumerate() {
            let flag = (i + 1).to_string();
            writeln!(out, "{}", row(&flag, server, detail)).ok();
        }

        for group in &self.config().groups {
            if group.servers.is_empty() {
                continue;
            }
            writeln!(out, "{}", banner(&group.group_name, '_')).ok();
            for (m, server) in group.servers.iter().enumerate() {
                let flag = format!("{}{}", group.prefix, m + 1);
                writeln!(out, "{}", row(&flag, server, detail)).ok();
            }
        }

        write!(out, "{}", "=".repeat(WIDTH)).ok();
        out
    }
}

/// A title centered in a run of `fill` characters.
fn banner(title: &str, fill: char) -> String {
    let label = format!(" {title} ");
    let pad = WIDTH.saturating_sub(label.chars().count());
    let left = pad / 2;
    let right = pad - left;
    format!(
        "{}{}{}",
        fill.to_string().repeat(left),
        label.bold(),
        fill.to_string().repeat(right)
    )
}

fn row(flag: &str, server: &ServerProfile, detail: bool) -> String {
    // Pad before styling: format width would count the escape bytes.
    let padded = format!("{flag:>3}");
    let mut line = format!(" [{}]  {}", padded.green(), server.name);
    if detail {
        let target = format!("{}@{}:{}", server.user, server.ip, server.port);
        write!(line, "  ({})", target.dimmed()).ok();
    }
    line
}
