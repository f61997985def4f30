//! Host configuration

use crate::utils::{FramescopeError, Result};
use std::time::Duration;

/// Host Controller configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Address loaded when nothing else is given
    pub home_url: String,
    /// How long a console command may stay unanswered
    pub eval_timeout: Duration,
    /// Elements listed after `<html>` in the tree view
    pub dom_tree_limit: usize,
    /// Origin the Host runs under; `None` grants direct access to any frame
    pub host_origin: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            home_url: "https://google.com".to_string(),
            eval_timeout: Duration::from_secs(5),
            dom_tree_limit: 100,
            host_origin: None,
        }
    }
}

impl HostConfig {
    /// Defaults overridden by `FRAMESCOPE_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("FRAMESCOPE_HOME_URL") {
            config.home_url = url;
        }
        if let Some(ms) = lookup("FRAMESCOPE_EVAL_TIMEOUT_MS") {
            let ms = ms
                .trim()
                .parse::<u64>()
                .map_err(|e| FramescopeError::Settings(format!("FRAMESCOPE_EVAL_TIMEOUT_MS: {}", e)))?;
            config.eval_timeout = Duration::from_millis(ms);
        }
        if let Some(limit) = lookup("FRAMESCOPE_DOM_TREE_LIMIT") {
            config.dom_tree_limit = limit
                .trim()
                .parse()
                .map_err(|e| FramescopeError::Settings(format!("FRAMESCOPE_DOM_TREE_LIMIT: {}", e)))?;
        }
        config.host_origin = lookup("FRAMESCOPE_HOST_ORIGIN").filter(|o| !o.trim().is_empty());

        Ok(config)
    }
}
