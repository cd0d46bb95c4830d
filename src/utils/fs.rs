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

//! Filesystem path helpers.

use std::path::{Path, PathBuf};

/// Expand tilde (~) in path to home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if path_str == "~" {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(home);
            }
        }
        if path_str.starts_with("~/") {
            if let Ok(home) = std::env::var("HOME") {
                return PathBuf::from(path_str.replacen('~', &home, 1));
            }
        }
    }
    path.to_path_buf()
}

/// Resolve a path to an absolute form without requiring it to exist.
///
/// Tilde is expanded first, then relative paths are resolved against the
/// current working directory. Symlinks are left alone on purpose: a copy
/// destination may not exist yet, so `fs::canonicalize` is unusable here.
pub fn absolutize(path: &Path) -> std::io::Result<PathBuf> {
    let expanded = expand_tilde(path);
    std::path::absolute(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_tilde_replaces_home_prefix() {
        let original_home = std::env::var("HOME").ok();
        std::env::set_var("HOME", "/home/user");

        let expanded = expand_tilde(Path::new("~/.ssh/id_rsa"));

        if let Some(home) = original_home {
            std::env::set_var("HOME", home);
        } else {
            std::env::remove_var("HOME");
        }

        assert_eq!(expanded, PathBuf::from("/home/user/.ssh/id_rsa"));
    }

    #[test]
    fn expand_tilde_leaves_other_paths_alone() {
        assert_eq!(expand_tilde(Path::new("/etc/hosts")), PathBuf::from("/etc/hosts"));
        assert_eq!(expand_tilde(Path::new("relative/path")), PathBuf::from("relative/path"));
    }

    #[test]
    fn absolutize_keeps_absolute_paths() {
        let abs = absolutize(Path::new("/tmp/somewhere")).unwrap();
        assert_eq!(abs, PathBuf::from("/tmp/somewhere"));
    }

    #[test]
    fn absolutize_resolves_relative_against_cwd() {
        let abs = absolutize(Path::new("some/file.txt")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("some/file.txt"));
    }
}
