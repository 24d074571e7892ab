//! Service settings loaded from the environment
//!
//! Binaries call `dotenv::dotenv().ok()` first so a local `.env` file works.

use crate::audit::DEFAULT_AUDIT_CAPACITY;
use crate::error::CoachError;
use crate::Result;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub app_env: String,
    pub log_level: String,
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_temperature: f32,
    pub gemini_max_tokens: u32,
    pub rag_top_k: usize,
    pub history_window: usize,
    pub prompt_history_turns: usize,
    pub max_question_chars: usize,
    /// Answered turns kept in the audit log
    pub audit_capacity: usize,
    pub lexicon_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_env: "development".to_string(),
            log_level: "info".to_string(),
            port: 8080,
            gemini_api_key: String::new(),
            gemini_model: "gemini-1.5-pro".to_string(),
            gemini_temperature: 0.7,
            gemini_max_tokens: 2048,
            rag_top_k: 5,
            history_window: 5,
            prompt_history_turns: 3,
            max_question_chars: 500,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            lexicon_path: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or blank keys keep their default
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let port = match get("PORT").or_else(|| get("API_PORT")) {
            Some(raw) => parse_value("PORT", &raw)?,
            None => defaults.port,
        };

        Ok(Self {
            app_env: get("APP_ENV").unwrap_or(defaults.app_env),
            log_level: get("LOG_LEVEL").unwrap_or(defaults.log_level),
            port,
            gemini_api_key: get("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            gemini_temperature: parse_or("GEMINI_TEMPERATURE", get("GEMINI_TEMPERATURE"), defaults.gemini_temperature)?,
            gemini_max_tokens: parse_or("GEMINI_MAX_TOKENS", get("GEMINI_MAX_TOKENS"), defaults.gemini_max_tokens)?,
            rag_top_k: parse_or("RAG_TOP_K", get("RAG_TOP_K"), defaults.rag_top_k)?,
            history_window: parse_or("HISTORY_WINDOW", get("HISTORY_WINDOW"), defaults.history_window)?,
            prompt_history_turns: parse_or(
                "PROMPT_HISTORY_TURNS",
                get("PROMPT_HISTORY_TURNS"),
                defaults.prompt_history_turns,
            )?,
            max_question_chars: parse_or("MAX_QUESTION_CHARS", get("MAX_QUESTION_CHARS"), defaults.max_question_chars)?,
            audit_capacity: parse_or("AUDIT_CAPACITY", get("AUDIT_CAPACITY"), defaults.audit_capacity)?,
            lexicon_path: get("LEXICON_PATH").map(PathBuf::from),
        })
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    pub fn use_mock_generator(&self) -> bool {
        self.gemini_api_key.is_empty()
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.parse::<T>()
        .map_err(|_| CoachError::Config(format!("{} has invalid value '{}'", key, raw)))
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
