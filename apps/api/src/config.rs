use std::time::Duration;

use anyhow::{Context, Result};

use crate::form::suggest::DEFAULT_ROLES;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Upper bound on concurrently open form sessions.
    pub max_sessions: usize,
    /// Sessions untouched for this long are dropped when a new one opens.
    pub session_idle_timeout: Duration,
    /// Known roles offered by the role autocomplete.
    pub role_suggestions: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_sessions: std::env::var("MAX_SESSIONS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse::<usize>()
                .context("MAX_SESSIONS must be a positive integer")?,
            session_idle_timeout: std::env::var("SESSION_IDLE_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse::<u64>()
                .map(Duration::from_secs)
                .context("SESSION_IDLE_SECS must be a whole number of seconds")?,
            role_suggestions: std::env::var("ROLE_SUGGESTIONS")
                .map(|raw| parse_role_list(&raw))
                .unwrap_or_else(|_| default_roles()),
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8080,
            rust_log: "info".to_string(),
            max_sessions: 1000,
            session_idle_timeout: Duration::from_secs(1800),
            role_suggestions: default_roles(),
        }
    }
}

fn default_roles() -> Vec<String> {
    DEFAULT_ROLES.iter().map(|r| r.to_string()).collect()
}

/// Comma-separated list; blank items are dropped. An empty list falls back to the defaults.
fn parse_role_list(raw: &str) -> Vec<String> {
    let roles: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect();
    if roles.is_empty() {
        default_roles()
    } else {
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role_list() {
        assert_eq!(
            parse_role_list(" Baker, ,Barista ,"),
            vec!["Baker".to_string(), "Barista".to_string()]
        );
    }

    #[test]
    fn test_blank_role_list_falls_back() {
        assert_eq!(parse_role_list(" , "), default_roles());
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_sessions, 1000);
        assert_eq!(config.session_idle_timeout, Duration::from_secs(1800));
        assert!(config.role_suggestions.iter().any(|r| r == "Electrician"));
    }
}
