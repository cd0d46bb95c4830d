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

//! Local terminal state for interactive sessions.

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io;

/// RAII guard around raw mode. Restoration runs on every exit path,
/// including panics, so a dying session never leaves the user's shell
/// unusable.
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { active: true })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            if let Err(e) = disable_raw_mode() {
                eprintln!("warning: failed to restore terminal state: {e}");
            }
        }
    }
}

/// Current terminal dimensions in character cells, or `None` when the
/// query fails (e.g. output is not a tty).
pub fn query_dimensions() -> Option<(u32, u32)> {
    crossterm::terminal::size()
        .ok()
        .map(|(w, h)| (u32::from(w), u32::from(h)))
}

/// Dimensions with a conventional fallback. Only the initial PTY request
/// uses this; mid-session polling must not mistake a failed query for a
/// real size.
pub fn dimensions() -> (u32, u32) {
    query_dimensions().unwrap_or((80, 24))
}
