//! Runtime configuration for the core.
//!
//! Defaults come from build-time environment variables so a shell compiled
//! for a given deployment needs no extra wiring; the shell may still replace
//! the whole config with [`crate::Event::Configure`].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capabilities::{sdk_script_url, ApiBase, HttpError};
use crate::enrich::EnrichmentPolicy;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_PLACES_SCRIPT_URL: &str = "https://maps.googleapis.com/maps/api/js";
pub const DEFAULT_BOOKMARKS_PATH: &str = "/api/bookmarks";
pub const DEFAULT_PASSWORD_REDIRECT: &str = "/MyPage";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid API base URL: {0}")]
    ApiBase(#[from] HttpError),

    #[error("maps API key is not configured")]
    MissingPlacesKey,

    #[error("invalid maps script URL: {0}")]
    PlacesScript(String),
}

/// What happens in the presentation layer after a successful password change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AfterPasswordChange {
    #[serde(default = "default_true")]
    pub notify: bool,

    #[serde(default = "default_password_redirect")]
    pub redirect_to: Option<String>,
}

impl Default for AfterPasswordChange {
    fn default() -> Self {
        Self {
            notify: true,
            redirect_to: default_password_redirect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Backend origin, e.g. "https://api.example.com"
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Bookmark list path; a single bookmark is `{bookmarks_path}/{place_id}`
    #[serde(default = "default_bookmarks_path")]
    pub bookmarks_path: String,

    #[serde(default = "default_places_script_url")]
    pub places_script_url: String,

    #[serde(default = "default_places_api_key")]
    pub places_api_key: String,

    #[serde(default)]
    pub enrichment: EnrichmentPolicy,

    #[serde(default)]
    pub after_password_change: AfterPasswordChange,
}

fn default_true() -> bool {
    true
}

fn default_password_redirect() -> Option<String> {
    Some(DEFAULT_PASSWORD_REDIRECT.to_string())
}

fn default_api_base_url() -> String {
    option_env!("MEDIMAP_API_BASE_URL")
        .unwrap_or(DEFAULT_API_BASE_URL)
        .to_string()
}

fn default_bookmarks_path() -> String {
    DEFAULT_BOOKMARKS_PATH.to_string()
}

fn default_places_script_url() -> String {
    DEFAULT_PLACES_SCRIPT_URL.to_string()
}

fn default_places_api_key() -> String {
    option_env!("MEDIMAP_PLACES_API_KEY").unwrap_or_default().to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            bookmarks_path: default_bookmarks_path(),
            places_script_url: default_places_script_url(),
            places_api_key: default_places_api_key(),
            enrichment: EnrichmentPolicy::default(),
            after_password_change: AfterPasswordChange::default(),
        }
    }
}

impl AppConfig {
    pub fn api_base(&self) -> Result<ApiBase, ConfigError> {
        Ok(ApiBase::parse(&self.api_base_url)?)
    }

    pub fn places_script(&self) -> Result<String, ConfigError> {
        if self.places_api_key.trim().is_empty() {
            return Err(ConfigError::MissingPlacesKey);
        }
        sdk_script_url(&self.places_script_url, &self.places_api_key)
            .map_err(|e| ConfigError::PlacesScript(e.to_string()))
    }

    /// Checks everything the core will later need to build requests.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api_base()?;
        self.places_script()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::{DistancePolicy, ItemFailurePolicy};

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.bookmarks_path, DEFAULT_BOOKMARKS_PATH);
        assert_eq!(config.places_script_url, DEFAULT_PLACES_SCRIPT_URL);
        assert_eq!(config.enrichment, EnrichmentPolicy::default());
        assert!(config.after_password_change.notify);
        assert_eq!(
            config.after_password_change.redirect_to.as_deref(),
            Some(DEFAULT_PASSWORD_REDIRECT)
        );
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "api_base_url": "https://api.example.com",
                "places_api_key": "abc",
                "enrichment": { "on_item_failure": "abort_all" },
                "after_password_change": { "redirect_to": null }
            }"#,
        )
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.bookmarks_path, DEFAULT_BOOKMARKS_PATH);
        assert_eq!(config.enrichment.on_item_failure, ItemFailurePolicy::AbortAll);
        assert_eq!(config.enrichment.on_distance_unavailable, DistancePolicy::Drop);
        assert!(config.after_password_change.notify);
        assert_eq!(config.after_password_change.redirect_to, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_places_key_is_rejected() {
        let config = AppConfig {
            places_api_key: "  ".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.places_script(), Err(ConfigError::MissingPlacesKey));
    }

    #[test]
    fn test_bad_base_url_is_rejected() {
        let config = AppConfig {
            api_base_url: "not a url".into(),
            ..AppConfig::default()
        };
        assert!(matches!(config.api_base(), Err(ConfigError::ApiBase(_))));
    }
}
