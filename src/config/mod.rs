// src/config/mod.rs

use once_cell::sync::Lazy;
use std::str::FromStr;
use std::time::Duration;

/// Process-wide configuration, loaded once from the environment (and `.env`
/// when present). Components take the values they need as constructor
/// parameters; only the binary reads `CONFIG` directly.
#[derive(Debug, Clone)]
pub struct OrionConfig {
    // ── Completion API
    pub api_base_url: String,
    pub model: String,

    // ── Session
    pub default_mode: String,
    pub turn_timeout_secs: u64,

    // ── Memory tiers
    pub short_term_cap: usize,
    pub medium_capacity: usize,
    pub decisions_cap: usize,
    pub medium_select_limit: usize,
    pub long_select_limit: usize,
    pub fact_reinforce_delta: f32,

    // ── Storage
    pub data_dir: String,

    // ── Logging
    pub log_level: String,
}

// Handles values with trailing inline comments and stray whitespace.
fn env_var_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(val) => {
            let clean = val.split('#').next().unwrap_or("").trim();
            match clean.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl OrionConfig {
    pub fn from_env() -> Self {
        // Best effort; a missing .env just means plain environment variables.
        let _ = dotenvy::dotenv();

        Self {
            api_base_url: env_var_or("OPENAI_BASE_URL", "https://api.openai.com/v1".to_string()),
            model: env_var_or("ORION_MODEL", "gpt-4o-mini".to_string()),
            default_mode: env_var_or("ORION_DEFAULT_MODE", "assistant".to_string()),
            turn_timeout_secs: env_var_or("ORION_TURN_TIMEOUT", 60),
            short_term_cap: env_var_or("ORION_SHORT_TERM_CAP", 50),
            medium_capacity: env_var_or("ORION_MEDIUM_CAPACITY", 24),
            decisions_cap: env_var_or("ORION_DECISIONS_CAP", 20),
            medium_select_limit: env_var_or("ORION_MEDIUM_SELECT", 3),
            long_select_limit: env_var_or("ORION_LONG_SELECT", 5),
            fact_reinforce_delta: env_var_or("ORION_FACT_DELTA", 0.4),
            data_dir: env_var_or("ORION_DATA_DIR", String::new()),
            log_level: env_var_or("ORION_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Bounded wait applied to every completion call.
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }

    /// Resolve the on-disk data directory.
    /// Priority: ORION_DATA_DIR > ~/.orion
    pub fn data_dir(&self) -> std::path::PathBuf {
        if !self.data_dir.trim().is_empty() {
            return std::path::PathBuf::from(self.data_dir.trim());
        }
        dirs::home_dir()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
            .join(".orion")
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<OrionConfig> = Lazy::new(OrionConfig::from_env);
