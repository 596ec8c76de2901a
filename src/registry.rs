use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{PipestatError, Result};

/// Environment fallback for running with zero persisted configuration.
pub const URL_ENV: &str = "PIPESTAT_URL";
pub const TOKEN_ENV: &str = "PIPESTAT_TOKEN";

const STORE_FILE: &str = ".pipestat.toml";

/// One named server entry in the profile store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub url: String,

    /// Personal access token, stored as plaintext; absent means anonymous
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Invariant: at most one profile in a registry has this set
    #[serde(default)]
    pub active: bool,
}

/// On-disk layout of `~/.pipestat.toml`: a single `[servers]` table keyed
/// by alias. Insertion order is preserved and defines the registry's
/// natural key order.
#[derive(Debug, Default, Deserialize)]
struct StoreFile {
    #[serde(default)]
    servers: IndexMap<String, Profile>,
}

#[derive(Serialize)]
struct StoreFileRef<'a> {
    servers: &'a IndexMap<String, Profile>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    Updated,
}

#[derive(Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
    Switched,
    UnknownAlias,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RemoveOutcome {
    UnknownAlias,
    Removed {
        /// Alias promoted to active to repair the invariant, if any
        promoted: Option<String>,
        remaining: bool,
    },
}

/// Connection settings resolved for a `run` invocation. A missing URL falls
/// back to the public default at connection time.
#[derive(Debug, PartialEq, Eq)]
pub struct ActiveServer {
    pub url: Option<String>,
    pub token: Option<String>,
}

/// The registry of server profiles.
///
/// Loaded once at startup, mutated in memory, and flushed back to its store
/// file at the end of the invocation only if something changed. Sole writer
/// of that file.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    servers: IndexMap<String, Profile>,
    dirty: bool,
}

impl Registry {
    pub fn load_default() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| PipestatError::Config("Cannot determine home directory".to_string()))?;
        Self::load(home.join(STORE_FILE))
    }

    /// Load the registry from `path`; a missing file yields an empty registry.
    pub fn load(path: PathBuf) -> Result<Self> {
        let servers = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            toml::from_str::<StoreFile>(&contents)?.servers
        } else {
            IndexMap::new()
        };
        debug!("Loaded {} profile(s) from {}", servers.len(), path.display());

        Ok(Self {
            path,
            servers,
            dirty: false,
        })
    }

    /// Flush the registry back to its store file, if anything changed.
    pub fn save(&self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let contents = toml::to_string_pretty(&StoreFileRef {
            servers: &self.servers,
        })?;
        std::fs::write(&self.path, contents)?;
        debug!("Wrote profile store to {}", self.path.display());
        Ok(())
    }

    /// Insert a profile, or fully overwrite the entry if the alias exists.
    /// The target becomes the active profile either way.
    pub fn add(&mut self, alias: &str, url: &str, token: Option<&str>) -> AddOutcome {
        let existed = self.servers.contains_key(alias);
        self.servers.insert(
            alias.to_string(),
            Profile {
                url: url.to_string(),
                token: token.map(str::to_string),
                active: true,
            },
        );
        self.activate(alias);
        self.dirty = true;

        if existed {
            AddOutcome::Updated
        } else {
            AddOutcome::Added
        }
    }

    /// Make an existing profile the active one. An unknown alias is a
    /// recoverable condition, not an error.
    pub fn switch(&mut self, alias: &str) -> SwitchOutcome {
        if !self.servers.contains_key(alias) {
            return SwitchOutcome::UnknownAlias;
        }
        self.activate(alias);
        self.dirty = true;
        SwitchOutcome::Switched
    }

    fn activate(&mut self, alias: &str) {
        for (key, profile) in &mut self.servers {
            profile.active = key == alias;
        }
    }

    /// Delete a profile. If the active one was removed and profiles remain,
    /// the first profile in natural key order is promoted to repair the
    /// single-active invariant.
    pub fn remove(&mut self, alias: &str) -> RemoveOutcome {
        if self.servers.shift_remove(alias).is_none() {
            return RemoveOutcome::UnknownAlias;
        }
        self.dirty = true;

        let any_active = self.servers.values().any(|profile| profile.active);
        let mut promoted = None;
        if !any_active {
            if let Some((key, profile)) = self.servers.get_index_mut(0) {
                profile.active = true;
                promoted = Some(key.clone());
            }
        }

        RemoveOutcome::Removed {
            promoted,
            remaining: !self.servers.is_empty(),
        }
    }

    /// Profiles ordered by alias ascending, for listing.
    pub fn profiles(&self) -> Vec<(&str, &Profile)> {
        let mut rows: Vec<_> = self
            .servers
            .iter()
            .map(|(alias, profile)| (alias.as_str(), profile))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }

    /// The active profile's connection settings, or the environment fallback
    /// when no profile is marked active.
    pub fn resolve_active(&self) -> ActiveServer {
        match self.servers.values().find(|profile| profile.active) {
            Some(profile) => ActiveServer {
                url: Some(profile.url.clone()),
                token: profile.token.clone(),
            },
            None => ActiveServer {
                url: std::env::var(URL_ENV).ok(),
                token: std::env::var(TOKEN_ENV).ok(),
            },
        }
    }

    #[cfg(test)]
    fn active_aliases(&self) -> Vec<&str> {
        self.servers
            .iter()
            .filter(|(_, profile)| profile.active)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }
}
