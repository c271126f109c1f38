use crate::error::{RestackError, Result};
use graph::RootPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the per-repository config file inside the git directory
pub const CONFIG_FILE_NAME: &str = "restack.toml";

const MIN_HASH_WIDTH: usize = 4;
const MAX_HASH_WIDTH: usize = 40;

/// Handling of a parentless commit met before the requested ancestor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootHandling {
    #[default]
    Fail,
    Synthesize,
}

impl From<RootHandling> for RootPolicy {
    fn from(handling: RootHandling) -> Self {
        match handling {
            RootHandling::Fail => RootPolicy::Fail,
            RootHandling::Synthesize => RootPolicy::Synthesize,
        }
    }
}

/// Fallback committer identity when git config has none
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            name: "Restack User".to_string(),
            email: "restack@local".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestackConfig {
    /// Abbreviated hash length used in rebase scripts
    pub short_hash_width: usize,
    pub root_policy: RootHandling,
    pub identity: Identity,
}

impl Default for RestackConfig {
    fn default() -> Self {
        Self {
            short_hash_width: 7,
            root_policy: RootHandling::default(),
            identity: Identity::default(),
        }
    }
}

impl RestackConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RestackError::io(path, e))?;
        Self::from_toml_str(&content)
            .map_err(|e| RestackError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load `restack.toml` from a git directory, or fall back to defaults
    pub fn discover(git_dir: &Path) -> Result<Self> {
        let path = git_dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Hash width clamped to what git can resolve unambiguously
    pub fn hash_width(&self) -> usize {
        self.short_hash_width.clamp(MIN_HASH_WIDTH, MAX_HASH_WIDTH)
    }

    pub fn graph_policy(&self) -> RootPolicy {
        self.root_policy.into()
    }
}
