use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }
}

/// Log output format; JSON lines in production unless overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn resolve(value: Option<&str>, env: &Environment) -> Self {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("json") => Self::Json,
            Some("pretty") => Self::Pretty,
            _ if matches!(env, Environment::Prod) => Self::Json,
            _ => Self::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,
    pub server_addr: String,
    pub log_format: LogFormat,

    // Session store
    pub redis_url: Option<String>,
    pub session_ttl_seconds: u64,

    // CORS
    pub cors_allow_origins: Vec<String>,

    // Generative API
    pub ai_api_url: String,
    pub ai_api_key: Option<String>,
    pub ai_model: String,
    pub ai_timeout_seconds: u64,

    // Lead relay
    pub lead_relay_url: Option<String>,
    pub lead_relay_token: Option<String>,
    pub lead_relay_max_elapsed_seconds: u64,

    // Submission
    pub sow_min_completeness: u8,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset or blank optional values
    /// become `None`; numbers that fail to parse keep their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str, default: u64| -> u64 {
            var(key).and_then(|s| s.trim().parse().ok()).unwrap_or(default)
        };

        let env = Environment::from_str(&var("ENV").unwrap_or_else(|| "dev".to_string()));
        let server_addr = var("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string());
        let log_format = LogFormat::resolve(var("LOG_FORMAT").as_deref(), &env);

        // Session store
        let redis_url = var("REDIS_URL");
        let session_ttl_seconds = number("SESSION_TTL_SECONDS", 604_800); // 7 days

        // CORS
        let cors_allow_origins = var("CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        // Generative API
        let ai_api_url = var("AI_API_URL")
            .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string());
        let ai_api_key = var("AI_API_KEY");
        let ai_model = var("AI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string());
        let ai_timeout_seconds = number("AI_TIMEOUT_SECONDS", 30);

        // Lead relay
        let lead_relay_url = var("LEAD_RELAY_URL");
        if let Some(url) = &lead_relay_url {
            reqwest::Url::parse(url).context("LEAD_RELAY_URL must be a valid URL")?;
        }
        let lead_relay_token = var("LEAD_RELAY_TOKEN");
        let lead_relay_max_elapsed_seconds = number("LEAD_RELAY_MAX_ELAPSED_SECONDS", 20);

        let sow_min_completeness = number("SOW_MIN_COMPLETENESS", 70).min(100) as u8;

        Ok(Settings {
            env,
            server_addr,
            log_format,
            redis_url,
            session_ttl_seconds,
            cors_allow_origins,
            ai_api_url,
            ai_api_key,
            ai_model,
            ai_timeout_seconds,
            lead_relay_url,
            lead_relay_token,
            lead_relay_max_elapsed_seconds,
            sow_min_completeness,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> Result<Settings> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings_from(&[]).unwrap();
        assert_eq!(settings.env, Environment::Dev);
        assert_eq!(settings.server_addr, "0.0.0.0:8080");
        assert!(settings.redis_url.is_none());
        assert!(settings.ai_api_key.is_none());
        assert_eq!(settings.sow_min_completeness, 70);
        assert_eq!(settings.cors_allow_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn test_log_format_follows_env_unless_overridden() {
        let prod = settings_from(&[("ENV", "production")]).unwrap();
        assert_eq!(prod.log_format, LogFormat::Json);

        let prod_pretty = settings_from(&[("ENV", "prod"), ("LOG_FORMAT", "Pretty")]).unwrap();
        assert_eq!(prod_pretty.log_format, LogFormat::Pretty);

        let dev = settings_from(&[]).unwrap();
        assert_eq!(dev.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_blank_key_counts_as_unset() {
        let settings = settings_from(&[("AI_API_KEY", "  ")]).unwrap();
        assert!(settings.ai_api_key.is_none());
    }

    #[test]
    fn test_bad_number_keeps_default() {
        let settings = settings_from(&[("AI_TIMEOUT_SECONDS", "soon")]).unwrap();
        assert_eq!(settings.ai_timeout_seconds, 30);
    }

    #[test]
    fn test_invalid_relay_url_rejected() {
        assert!(settings_from(&[("LEAD_RELAY_URL", "not a url")]).is_err());
    }

    #[test]
    fn test_cors_origins_split() {
        let settings = settings_from(&[(
            "CORS_ALLOW_ORIGINS",
            "https://example.com, https://www.example.com,",
        )])
        .unwrap();
        assert_eq!(
            settings.cors_allow_origins,
            vec!["https://example.com", "https://www.example.com"]
        );
    }
}
