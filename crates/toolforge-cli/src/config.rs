//! `toolforge.toml` loading
//!
//! Precedence, lowest first: built-in defaults, the config file,
//! environment variables, command-line flags.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use toolforge_store::github::DEFAULT_API_BASE;
use toolforge_store::GitHubConfig;
use toolforge_upsert::UpsertConfig;

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "toolforge.toml";

/// Environment variables read on top of the file
pub const ENV_TOKEN: &str = "TOOLFORGE_TOKEN";
pub const ENV_TOKEN_FALLBACK: &str = "GITHUB_TOKEN";
pub const ENV_OWNER: &str = "TOOLFORGE_OWNER";
pub const ENV_REPO: &str = "TOOLFORGE_REPO";
pub const ENV_BRANCH: &str = "TOOLFORGE_BRANCH";

/// `[store]` section
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Overrides the default `toolforge/<version>`
    pub user_agent: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Never read from the file
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            user_agent: None,
            connect_timeout_secs: 5,
            request_timeout_secs: 30,
            token: None,
        }
    }
}

impl fmt::Debug for StoreSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSection")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("branch", &self.branch)
            .field("user_agent", &self.user_agent)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Whole configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForgeConfig {
    pub store: StoreSection,
    pub manifest: UpsertConfig,
}

impl ForgeConfig {
    /// Parse config text
    ///
    /// # Errors
    /// Fails on invalid TOML or unknown fields.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid toolforge config")
    }

    /// Load from `path`, or from `toolforge.toml` if it exists, else defaults
    ///
    /// # Errors
    /// Fails if an explicitly given file cannot be read, or any file does
    /// not parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
            None => {
                tracing::debug!("no config file, using defaults");
                return Ok(Self::default());
            }
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config =
            Self::from_toml(&text).with_context(|| format!("in {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Apply environment overrides from `lookup`
    #[must_use]
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = non_empty(ENV_TOKEN).or_else(|| non_empty(ENV_TOKEN_FALLBACK)) {
            self.store.token = Some(token);
        }
        if let Some(owner) = non_empty(ENV_OWNER) {
            self.store.owner = owner;
        }
        if let Some(repo) = non_empty(ENV_REPO) {
            self.store.repo = repo;
        }
        if let Some(branch) = non_empty(ENV_BRANCH) {
            self.store.branch = branch;
        }
        self
    }

    /// Apply process environment overrides
    #[must_use]
    pub fn with_process_env(self) -> Self {
        self.with_env(|name| std::env::var(name).ok())
    }

    /// Store connection settings
    ///
    /// # Errors
    /// Fails when owner or repo is missing, or the API root is not a URL.
    pub fn github(&self) -> Result<GitHubConfig> {
        let store = &self.store;
        if store.owner.trim().is_empty() || store.repo.trim().is_empty() {
            bail!(
                "repository not configured: set [store] owner and repo in {DEFAULT_CONFIG_FILE}, \
                 {ENV_OWNER}/{ENV_REPO}, or --owner/--repo"
            );
        }

        let mut config = GitHubConfig::new(store.owner.trim(), store.repo.trim())
            .with_api_base(store.api_base.trim())
            .with_branch(store.branch.trim());
        if let Some(token) = &store.token {
            config = config.with_token(token.clone());
        }
        if let Some(agent) = &store.user_agent {
            config.user_agent = agent.clone();
        }
        config.connect_timeout = Duration::from_secs(store.connect_timeout_secs);
        config.request_timeout = Duration::from_secs(store.request_timeout_secs);

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use toolforge_upsert::ConflictRetry;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(ForgeConfig::from_toml("").unwrap(), ForgeConfig::default());
    }

    #[test]
    fn parses_both_sections() {
        let config = ForgeConfig::from_toml(
            r#"
            [store]
            owner = "acme"
            repo = "dashboard"
            branch = "dev"
            request_timeout_secs = 10

            [manifest]
            manifest_path = "config/tools.yaml"
            conflict_retry = "any_conflict"
            commit_prefix = ""
            "#,
        )
        .unwrap();

        assert_eq!(config.store.owner, "acme");
        assert_eq!(config.store.branch, "dev");
        assert_eq!(config.store.request_timeout_secs, 10);
        assert_eq!(config.store.connect_timeout_secs, 5);
        assert_eq!(config.manifest.manifest_path, "config/tools.yaml");
        assert_eq!(config.manifest.tools_dir, "streamlit_app/tools");
        assert_eq!(config.manifest.conflict_retry, ConflictRetry::AnyConflict);
        assert_eq!(config.manifest.commit_prefix, "");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(ForgeConfig::from_toml("[store]\nownr = \"x\"\n").is_err());
    }

    #[test]
    fn token_is_not_read_from_file() {
        assert!(ForgeConfig::from_toml("[store]\ntoken = \"secret\"\n").is_err());
    }

    #[test]
    fn env_overrides_file() {
        let config = ForgeConfig::from_toml("[store]\nowner = \"acme\"\nrepo = \"a\"\n")
            .unwrap()
            .with_env(env(&[
                (ENV_REPO, "b"),
                (ENV_BRANCH, "release"),
                (ENV_TOKEN_FALLBACK, "gh-token"),
            ]));

        assert_eq!(config.store.owner, "acme");
        assert_eq!(config.store.repo, "b");
        assert_eq!(config.store.branch, "release");
        assert_eq!(config.store.token.as_deref(), Some("gh-token"));
    }

    #[test]
    fn toolforge_token_wins_over_github_token() {
        let config = ForgeConfig::default().with_env(env(&[
            (ENV_TOKEN, "tf-token"),
            (ENV_TOKEN_FALLBACK, "gh-token"),
        ]));
        assert_eq!(config.store.token.as_deref(), Some("tf-token"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let config = ForgeConfig::default().with_env(env(&[(ENV_BRANCH, "  ")]));
        assert_eq!(config.store.branch, "main");
    }

    #[test]
    fn debug_redacts_token() {
        let config = ForgeConfig::default().with_env(env(&[(ENV_TOKEN, "hunter2")]));
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn github_config_requires_repository() {
        assert!(ForgeConfig::default().github().is_err());

        let mut config = ForgeConfig::default();
        config.store.owner = "acme".into();
        config.store.repo = "dashboard".into();
        config.store.token = Some("t".into());
        let github = config.github().unwrap();

        assert_eq!(github.owner, "acme");
        assert_eq!(github.branch, "main");
        assert_eq!(github.token.as_deref(), Some("t"));
        assert_eq!(github.request_timeout, Duration::from_secs(30));
    }
}
