//! Settings loaded from the environment and an optional `.env` file

use crate::runtime::{SessionConfig, DEFAULT_MAX_STEPS};
use crate::termination::{TerminationEvaluator, DEFAULT_FAREWELL_PHRASES};
use std::str::FromStr;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_GROUP_CHAT_ROUNDS: usize = 3;

#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>,
    /// `OpenAI`-compatible endpoint; the public API when unset
    pub openai_base_url: Option<String>,
    pub model: String,
    pub max_steps: usize,
    pub farewell_phrases: Vec<String>,
    pub group_chat_rounds: usize,
    /// Emit JSON log lines instead of the compact format
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            model: DEFAULT_MODEL.to_string(),
            max_steps: DEFAULT_MAX_STEPS,
            farewell_phrases: DEFAULT_FAREWELL_PHRASES
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
            group_chat_rounds: DEFAULT_GROUP_CHAT_ROUNDS,
            log_json: false,
        }
    }
}

impl Settings {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Self {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Could not load .env");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Self {
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("OPENAI_BASE_URL"),
            model: get("OPENAI_CHAT_MODEL_ID").unwrap_or(defaults.model),
            max_steps: parse_or(get("PM_COPILOT_MAX_STEPS"), "PM_COPILOT_MAX_STEPS", defaults.max_steps),
            farewell_phrases: get("PM_COPILOT_FAREWELL_PHRASES")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|p| !p.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(defaults.farewell_phrases),
            group_chat_rounds: parse_or(
                get("PM_COPILOT_GROUP_CHAT_ROUNDS"),
                "PM_COPILOT_GROUP_CHAT_ROUNDS",
                defaults.group_chat_rounds,
            ),
            log_json: get("PM_COPILOT_LOG_JSON").is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true")),
        }
    }

    pub fn termination(&self) -> TerminationEvaluator {
        TerminationEvaluator::new(self.farewell_phrases.iter().map(String::as_str))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            max_steps: self.max_steps,
            termination: self.termination(),
        }
    }
}

fn parse_or<T: FromStr + Copy>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring non-numeric setting");
            default
        }),
    }
}
