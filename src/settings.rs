//! Settings consumed by the media pipeline.
//!
//! [`Settings`] is a flat key/value map using the usual upper-case keys.
//! [`MediaSettings`] is what one pipeline resolves out of it:
//!
//! | key                                | meaning                                    |
//! |------------------------------------|--------------------------------------------|
//! | `MEDIA_ALLOW_REDIRECTS`            | let the downloader follow 3xx redirects    |
//! | `<POLICYNAME>_MEDIA_ALLOW_REDIRECTS` | same, for one named policy only (wins)   |
//! | `MEDIA_LOG_FAILED_RESULTS`         | log failed media results on item completion |

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SpiderError;
use crate::policy::DEFAULT_POLICY_NAME;

pub const MEDIA_ALLOW_REDIRECTS: &str = "MEDIA_ALLOW_REDIRECTS";
pub const MEDIA_LOG_FAILED_RESULTS: &str = "MEDIA_LOG_FAILED_RESULTS";

/// Flat settings map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings {
    values: Map<String, Value>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON object such as `{"MEDIA_ALLOW_REDIRECTS": true}`.
    pub fn from_json_str(json: &str) -> Result<Self, SpiderError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Reads a boolean, accepting `true`/`false`, `0`/`1` and their string forms.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_i64().map(|n| n != 0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Media settings resolved for one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaSettings {
    pub allow_redirects: bool,
    pub log_failed_results: bool,
}

impl Default for MediaSettings {
    fn default() -> Self {
        MediaSettings {
            allow_redirects: false,
            log_failed_results: true,
        }
    }
}

impl MediaSettings {
    /// Resolves the settings for the policy called `policy_name`.
    ///
    /// The policy-specific key (`<POLICYNAME>_MEDIA_ALLOW_REDIRECTS`) takes
    /// precedence over the global one. A policy keeping the default name has
    /// no specific key.
    pub fn from_settings(settings: &Settings, policy_name: &str) -> Self {
        Self::resolve(settings, policy_name, None)
    }

    /// Like [`from_settings`](Self::from_settings), with a default coming from
    /// the policy itself. It ranks below the policy-specific key and above the
    /// global one.
    pub fn resolve(
        settings: &Settings,
        policy_name: &str,
        policy_allow_redirects: Option<bool>,
    ) -> Self {
        let defaults = MediaSettings::default();
        let specific = if policy_name == DEFAULT_POLICY_NAME {
            None
        } else {
            settings.get_bool(&policy_setting_key(policy_name, MEDIA_ALLOW_REDIRECTS))
        };
        let allow_redirects = specific
            .or(policy_allow_redirects)
            .or_else(|| settings.get_bool(MEDIA_ALLOW_REDIRECTS))
            .unwrap_or(defaults.allow_redirects);
        let log_failed_results = settings
            .get_bool(MEDIA_LOG_FAILED_RESULTS)
            .unwrap_or(defaults.log_failed_results);
        MediaSettings {
            allow_redirects,
            log_failed_results,
        }
    }
}

/// `("UserDefinedPipeline", "MEDIA_ALLOW_REDIRECTS")` becomes
/// `"USERDEFINEDPIPELINE_MEDIA_ALLOW_REDIRECTS"`.
pub fn policy_setting_key(policy_name: &str, key: &str) -> String {
    let prefix: String = policy_name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_ascii_uppercase();
    format!("{prefix}_{key}")
}
