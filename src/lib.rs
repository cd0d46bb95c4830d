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

//! sshm - a session manager for a registry of SSH servers.
//!
//! Servers live in a JSON config and are addressed by short flags
//! (`1`, `2`, ... for flat entries, `<prefix><n>` for group members).
//! On top of that registry sit four operations: interactive login,
//! one-shot command execution, file copy over SFTP, and registry
//! mutation.

pub mod cli;
pub mod commands;
pub mod config;
pub mod endpoint;
pub mod registry;
pub mod secret;
pub mod session;
pub mod ssh;
pub mod transfer;
pub mod utils;
