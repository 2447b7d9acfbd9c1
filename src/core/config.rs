use crate::errors::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub browser: BrowserConfig,
    pub navigation: NavigationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub user_agent: String,
    /// Sent with every request, after `User-Agent`.
    pub extra_headers: Vec<(String, String)>,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub max_redirects: usize,
    pub follow_meta_refresh: bool,
    pub send_referer: bool,
    pub max_history: usize,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.browser.user_agent = user_agent.into();
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.navigation.max_redirects = max_redirects;
        self
    }
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("minimech/", env!("CARGO_PKG_VERSION")).to_string(),
            extra_headers: vec![],
            timeout_ms: 30000,
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            max_redirects: 10,
            follow_meta_refresh: true,
            send_referer: true,
            max_history: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            Config::from_json(r#"{"navigation": {"max_redirects": 3}}"#).unwrap();
        assert_eq!(config.navigation.max_redirects, 3);
        assert!(config.navigation.follow_meta_refresh);
        assert_eq!(config.browser.timeout_ms, 30000);
    }

    #[test]
    fn test_invalid_json() {
        assert!(Config::from_json("{not json").is_err());
    }
}
