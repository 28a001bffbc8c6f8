//! Environment configuration, read once at process start.

use std::env;
use std::str::FromStr;
use taskpet_core::{CompletionRules, LedgerSeed};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    Invalid { name: String, value: String },
}

/// Everything the server reads from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Notion integration token. Absent means syncs degrade to cached state.
    pub api_key: Option<String>,

    /// Notion database holding the tasks.
    pub database_id: Option<String>,

    /// Completion detection rules.
    pub rules: CompletionRules,

    /// Points credited per newly-counted task.
    pub points_per_task: u64,

    /// Listen port.
    pub port: u16,

    /// Path of the ledger document file.
    pub data_file: String,

    /// Seed for ledgers created on first access.
    pub seed: LedgerSeed,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = CompletionRules::default();

        let rules = CompletionRules {
            checkbox_allowlist: env::var("NOTION_CHECKBOX_PROPERTIES")
                .map(|raw| parse_csv(&raw))
                .unwrap_or(defaults.checkbox_allowlist),
            status_property: env::var("NOTION_STATUS_PROPERTY")
                .unwrap_or(defaults.status_property),
            done_value: env::var("NOTION_DONE_VALUE").unwrap_or(defaults.done_value),
        };

        let seed = LedgerSeed {
            starting_points: parse_env("STARTING_POINTS", 0)?,
            starting_owned: env::var("STARTING_OWNED")
                .map(|raw| parse_csv(&raw))
                .unwrap_or_default(),
            starting_equipped: env::var("STARTING_EQUIPPED")
                .map(|raw| parse_csv(&raw))
                .unwrap_or_default(),
        };

        Ok(Self {
            api_key: non_empty(env::var("NOTION_API_KEY").ok()),
            database_id: non_empty(env::var("NOTION_DATABASE_ID").ok()),
            rules,
            points_per_task: parse_env("POINTS_PER_TASK", 10)?,
            port: parse_env("PORT", 4000)?,
            data_file: env::var("DATA_FILE")
                .unwrap_or_else(|_| "data/user_state.json".to_string()),
            seed,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
            name: name.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}

/// Split a comma-separated list, trimming whitespace and dropping empties.
fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_csv() {
        assert_eq!(
            parse_csv("Done, Completed ,Complete"),
            vec!["Done", "Completed", "Complete"]
        );
        assert_eq!(parse_csv("hat_basic"), vec!["hat_basic"]);
        assert!(parse_csv("").is_empty());
        assert!(parse_csv(" , ,").is_empty());
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty(Some("key".to_string())), Some("key".to_string()));
        assert_eq!(non_empty(Some("  ".to_string())), None);
        assert_eq!(non_empty(None), None);
    }
}
