use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

const CONFIG_FILE: &str = ".git-checkout-pr.toml";
const DEFAULT_GIT_PROGRAM: &str = "git";
const DEFAULT_BRANCH_PREFIX: &str = "pull";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Optional settings loaded from .git-checkout-pr.toml.
/// Every field may be left out; the tool works with no file at all.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Log each git command as if `-v` were always given
    #[serde(default)]
    pub verbose: bool,

    #[serde(default)]
    pub git: GitConfig,

    #[serde(default)]
    pub branch: BranchConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitConfig {
    /// Executable to run instead of `git` from PATH
    pub program: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BranchConfig {
    /// Prefix for generated branch names (`pull` gives `pull42`)
    pub prefix: Option<String>,
}

impl Config {
    /// Load configuration from .git-checkout-pr.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn git_program(&self) -> &str {
        self.git.program.as_deref().unwrap_or(DEFAULT_GIT_PROGRAM)
    }

    pub fn branch_prefix(&self) -> &str {
        self.branch.prefix.as_deref().unwrap_or(DEFAULT_BRANCH_PREFIX)
    }
}

/// Everything one run needs, fixed at startup from the command line and
/// the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Pull request URL as typed by the user
    pub url: String,
    pub verbose: bool,
    /// Local branch name from `-branch`. Never `Some("")`.
    pub branch_override: Option<String>,
    pub git_program: String,
    pub branch_prefix: String,
}

impl Options {
    /// Combine command-line values with the config file. The `-v` flag and
    /// the config's `verbose` are OR-ed; an empty `-branch` counts as unset.
    pub fn new(url: String, verbose: bool, branch: Option<String>, config: &Config) -> Self {
        Options {
            url,
            verbose: verbose || config.verbose,
            branch_override: branch.filter(|name| !name.is_empty()),
            git_program: config.git_program().to_string(),
            branch_prefix: config.branch_prefix().to_string(),
        }
    }
}
