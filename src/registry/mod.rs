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

//! Flag-addressable server registry.
//!
//! Flat servers get the flags `1..n` in declaration order; group members
//! get `<prefix><1-based position>`. Flags must be unique across the whole
//! config; a collision means the address space is ambiguous and the
//! process must not continue.

mod listing;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{Config, ConfigError, ServerProfile};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Two entries computed the same address flag. This is a configuration
    /// authoring bug, not something the process can work around.
    #[error("address flag [{0}] is assigned more than once, check your configuration")]
    DuplicateFlag(String),

    #[error("no server matches '{0}'")]
    NotFound(String),

    #[error("no group with prefix '{0}'")]
    NoSuchGroup(String),
}

/// Where a flag points inside the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryRef {
    Flat(usize),
    Grouped { group: usize, member: usize },
}

/// The registry: one config artifact plus its flag index.
///
/// The index is rebuilt wholesale after every mutation rather than patched
/// incrementally; registries are small (tens to low hundreds of entries)
/// and a full rebuild cannot leave a half-updated address space behind.
pub struct Registry {
    config: Config,
    path: PathBuf,
    index: HashMap<String, EntryRef>,
}

impl Registry {
    /// Load the config artifact and build the flag index.
    pub async fn load(path: &Path) -> Result<Self, RegistryError> {
        let config = Config::load(path).await?;
        Self::build(config, path.to_path_buf())
    }

    /// Build a registry from an already-parsed config.
    ///
    /// Applies profile defaults (port 22, password auth) and merges the
    /// global option bag into each profile without overwriting local
    /// options, then indexes every entry by its address flag.
    pub fn build(mut config: Config, path: PathBuf) -> Result<Self, RegistryError> {
        let mut index = HashMap::new();

        for (i, server) in config.servers.iter_mut().enumerate() {
            server.apply_defaults();
            server.options.merge_defaults(&config.options);
            let flag = (i + 1).to_string();
            if index.insert(flag.clone(), EntryRef::Flat(i)).is_some() {
                return Err(RegistryError::DuplicateFlag(flag));
            }
        }

        for (g, group) in config.groups.iter_mut().enumerate() {
            for (m, server) in group.servers.iter_mut().enumerate() {
                server.apply_defaults();
                server.options.merge_defaults(&config.options);
                let flag = format!("{}{}", group.prefix, m + 1);
                if index
                    .insert(flag.clone(), EntryRef::Grouped { group: g, member: m })
                    .is_some()
                {
                    return Err(RegistryError::DuplicateFlag(flag));
                }
            }
        }

        tracing::debug!(
            servers = config.servers.len(),
            groups = config.groups.len(),
            flags = index.len(),
            "registry built"
        );

        Ok(Self { config, path, index })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve a server by address flag, falling back to a linear scan by
    /// display name.
    pub fn resolve(&self, key: &str) -> Result<&ServerProfile, RegistryError> {
        if let Some(entry) = self.index.get(key) {
            return Ok(self.profile(*entry));
        }

        self.profiles()
            .find(|p| p.name == key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    /// Look a flag up without the name fallback; used by the interactive
    /// menu which distinguishes flags from free-form input.
    pub fn resolve_flag(&self, flag: &str) -> Option<&ServerProfile> {
        self.index.get(flag).map(|e| self.profile(*e))
    }

    /// All profiles in declaration order: flat servers first, then each
    /// group's members.
    pub fn profiles(&self) -> impl Iterator<Item = &ServerProfile> {
        self.config
            .servers
            .iter()
            .chain(self.config.groups.iter().flat_map(|g| g.servers.iter()))
    }

    fn profile(&self, entry: EntryRef) -> &ServerProfile {
        match entry {
            EntryRef::Flat(i) => &self.config.servers[i],
            EntryRef::Grouped { group, member } => &self.config.groups[group].servers[member],
        }
    }

    /// Append a profile to the flat list, or to the group with the given
    /// prefix.
    pub fn add(
        &mut self,
        mut profile: ServerProfile,
        group_prefix: Option<&str>,
    ) -> Result<(), RegistryError> {
        profile.apply_defaults();
        match group_prefix {
            None => self.config.servers.push(profile),
            Some(prefix) => {
                let group = self
                    .config
                    .groups
                    .iter_mut()
                    .find(|g| g.prefix == prefix)
                    .ok_or_else(|| RegistryError::NoSuchGroup(prefix.to_string()))?;
                group.servers.push(profile);
            }
        }
        Ok(())
    }

    /// Replace the profile addressed by `flag` in place.
    pub fn edit(&mut self, flag: &str, mut profile: ServerProfile) -> Result<(), RegistryError> {
        profile.apply_defaults();
        let entry = *self
            .index
            .get(flag)
            .ok_or_else(|| RegistryError::NotFound(flag.to_string()))?;
        match entry {
            EntryRef::Flat(i) => self.config.servers[i] = profile,
            EntryRef::Grouped { group, member } => {
                self.config.groups[group].servers[member] = profile;
            }
        }
        Ok(())
    }

    /// Delete the profile addressed by `flag` from its owning sequence,
    /// preserving the relative order of the remaining entries.
    pub fn remove(&mut self, flag: &str) -> Result<(), RegistryError> {
        let entry = *self
            .index
            .get(flag)
            .ok_or_else(|| RegistryError::NotFound(flag.to_string()))?;
        match entry {
            EntryRef::Flat(i) => {
                self.config.servers.remove(i);
            }
            EntryRef::Grouped { group, member } => {
                self.config.groups[group].servers.remove(member);
            }
        }
        Ok(())
    }

    /// Persist a mutation: save (with backup), then reload from storage and
    /// rebuild the index.
    ///
    /// The reload-after-write round-trip is deliberate: the in-memory view
    /// afterwards is exactly what was durably written, so a serialization
    /// bug surfaces on the very next listing instead of much later.
    pub async fn commit(&mut self) -> Result<(), RegistryError> {
        self.config.save(&self.path).await?;
        let reloaded = Config::load(&self.path).await?;
        let rebuilt = Self::build(reloaded, self.path.clone())?;
        self.config = rebuilt.config;
        self.index = rebuilt.index;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn registry_from(json: &str) -> Result<Registry, RegistryError> {
        let config: Config = serde_json::from_str(json).unwrap();
        Registry::build(config, PathBuf::from("/tmp/test-config.json"))
    }

    const BASIC: &str = r#"
    {
        "servers": [{"name": "alpha", "ip": "10.0.0.1", "user": "root"}],
        "groups": [
            {"group_name": "general", "prefix": "g",
             "servers": [{"name": "beta", "ip": "10.0.0.2", "user": "root"}]}
        ]
    }"#;

    #[test]
    fn flat_and_grouped_flags_resolve() {
        let registry = registry_from(BASIC).unwrap();
        assert_eq!(registry.resolve("1").unwrap().name, "alpha");
        assert_eq!(registry.resolve("g1").unwrap().name, "beta");
        assert!(matches!(
            registry.resolve("g2"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn resolve_falls_back_to_display_name() {
        let registry = registry_from(BASIC).unwrap();
        assert_eq!(registry.resolve("beta").unwrap().ip, "10.0.0.2");
        assert!(registry.resolve_flag("beta").is_none());
    }

    #[test]
    fn duplicate_flags_are_fatal() {
        // Group prefix "1" makes its first member collide with flat flag "1".
        let json = r#"
        {
            "servers": [{"name": "alpha", "ip": "h1"}],
            "groups": [
                {"group_name": "bad", "prefix": "1", "servers": []},
                {"group_name": "worse", "prefix": "", "servers": [{"name": "x", "ip": "h2"}]}
            ]
        }"#;
        match registry_from(json) {
            Err(RegistryError::DuplicateFlag(flag)) => assert_eq!(flag, "1"),
            other => panic!("expected DuplicateFlag, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn every_flag_is_unique_after_build() {
        let json = r#"
        {
            "servers": [
                {"name": "a", "ip": "h1"}, {"name": "b", "ip": "h2"}, {"name": "c", "ip": "h3"}
            ],
            "groups": [
                {"group_name": "g1", "prefix": "g", "servers": [{"name": "d", "ip": "h4"}, {"name": "e", "ip": "h5"}]},
                {"group_name": "g2", "prefix": "x", "servers": [{"name": "f", "ip": "h6"}]}
            ]
        }"#;
        let registry = registry_from(json).unwrap();
        assert_eq!(registry.index.len(), 6);
        for flag in ["1", "2", "3", "g1", "g2", "x1"] {
            assert!(registry.resolve_flag(flag).is_some(), "missing flag {flag}");
        }
    }

    #[test]
    fn defaults_and_global_options_are_applied() {
        let json = r#"
        {
            "servers": [
                {"name": "a", "ip": "h1"},
                {"name": "b", "ip": "h2", "options": {"ServerAliveInterval": 5}}
            ],
            "options": {"ServerAliveInterval": 60}
        }"#;
        let registry = registry_from(json).unwrap();

        let a = registry.resolve("1").unwrap();
        assert_eq!(a.port, 22);
        assert_eq!(a.options.server_alive_interval, Some(60));

        // Profile-local options win over the global bag.
        let b = registry.resolve("2").unwrap();
        assert_eq!(b.options.server_alive_interval, Some(5));
    }

    #[test]
    fn remove_preserves_relative_order() {
        let json = r#"
        {
            "servers": [
                {"name": "a", "ip": "h1"}, {"name": "b", "ip": "h2"}, {"name": "c", "ip": "h3"}
            ]
        }"#;
        let mut registry = registry_from(json).unwrap();
        registry.remove("2").unwrap();

        let names: Vec<&str> = registry.config.servers.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "c"]);
    }

    #[test]
    fn add_to_group_by_prefix() {
        let mut registry = registry_from(BASIC).unwrap();
        let mut profile = ServerProfile::blank();
        profile.name = "gamma".into();
        profile.ip = "10.0.0.3".into();
        registry.add(profile, Some("g")).unwrap();
        assert_eq!(registry.config.groups[0].servers.len(), 2);

        let mut other = ServerProfile::blank();
        other.name = "delta".into();
        other.ip = "10.0.0.4".into();
        assert!(matches!(
            registry.add(other, Some("zz")),
            Err(RegistryError::NoSuchGroup(_))
        ));
    }

    #[tokio::test]
    async fn commit_round_trips_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config: Config = serde_json::from_str(BASIC).unwrap();
        config.save(&path).await.unwrap();

        let mut registry = Registry::load(&path).await.unwrap();
        let mut profile = ServerProfile::blank();
        profile.name = "gamma".into();
        profile.ip = "10.0.0.3".into();
        registry.add(profile, None).unwrap();
        registry.commit().await.unwrap();

        // The index now reflects what storage holds.
        assert_eq!(registry.resolve("2").unwrap().name, "gamma");
        let reloaded = Registry::load(&path).await.unwrap();
        assert_eq!(reloaded.resolve("2").unwrap().name, "gamma");
    }
}
