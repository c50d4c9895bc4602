//! Resolving a service identifier into a process to spawn.
//!
//! The identifier is a path to a server entry point. Its extension picks the
//! interpreter, so `weather.py` runs as `python weather.py`. Unknown kinds
//! are rejected here, before anything is spawned.

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::server::{DEFAULT_TIMEOUT, ServerConfig};

/// How to run one kind of server entry point.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Launcher {
    /// Interpreter to execute.
    pub command: String,
    /// Arguments placed before the entry point path.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Launcher {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
        }
    }
}

/// Extension → launcher table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launchers {
    kinds: BTreeMap<String, Launcher>,
}

impl Default for Launchers {
    fn default() -> Self {
        let mut kinds = BTreeMap::new();
        kinds.insert("py".to_string(), Launcher::new("python"));
        kinds.insert("js".to_string(), Launcher::new("node"));
        Self { kinds }
    }
}

impl Launchers {
    /// An empty table that accepts nothing.
    pub fn empty() -> Self {
        Self {
            kinds: BTreeMap::new(),
        }
    }

    /// Add or replace the launcher for an extension (without the dot).
    pub fn with_kind(mut self, extension: impl Into<String>, launcher: Launcher) -> Self {
        let extension = extension.into().trim_start_matches('.').to_ascii_lowercase();
        self.kinds.insert(extension, launcher);
        self
    }

    /// Supported extensions, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    /// Look up the launcher for an identifier.
    pub fn launcher_for(&self, identifier: &str) -> Result<&Launcher> {
        let kind = Path::new(identifier)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        self.kinds.get(&kind).ok_or_else(|| Error::UnsupportedKind {
            identifier: identifier.to_string(),
            kind: if kind.is_empty() { "<none>".to_string() } else { kind },
            supported: self.kinds().collect::<Vec<_>>().join(", "),
        })
    }

    /// Build the spawn configuration for an identifier.
    pub fn resolve(&self, identifier: &str) -> Result<ServerConfig> {
        let launcher = self.launcher_for(identifier)?;
        let name = Path::new(identifier)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or(identifier)
            .to_string();

        let mut args = launcher.args.clone();
        args.push(identifier.to_string());

        Ok(ServerConfig {
            name,
            command: launcher.command.clone(),
            args,
            env: HashMap::new(),
            timeout: DEFAULT_TIMEOUT,
        })
    }
}

impl From<BTreeMap<String, Launcher>> for Launchers {
    fn from(kinds: BTreeMap<String, Launcher>) -> Self {
        kinds
            .into_iter()
            .fold(Self::empty(), |table, (ext, launcher)| table.with_kind(ext, launcher))
    }
}
