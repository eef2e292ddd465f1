use crate::error::ConfigError;
use std::env;

pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the key-status client.
/// Values are sourced from environment variables with sensible defaults;
/// command-line flags win over both.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub api_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

/// Values supplied on the command line. `None` falls through to the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub token: Option<String>,
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Env vars:
    /// - OPENROUTER_API_KEY [required unless overridden]
    /// - OPENROUTER_API_URL (default: https://openrouter.ai/api/v1)
    /// - OPENROUTER_HTTP_TIMEOUT_SECS (default: 30; 0 disables the timeout)
    /// - OPENROUTER_MAX_RETRIES (default: 0)
    /// - OPENROUTER_USER_AGENT (default: openrouter-key-status/<version>)
    pub fn from_env(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::from_lookup(overrides, |key| env::var(key).ok())
    }

    pub fn from_lookup<F>(overrides: &Overrides, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = overrides
            .token
            .clone()
            .or_else(|| lookup("OPENROUTER_API_KEY"))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let api_url = overrides
            .api_url
            .clone()
            .or_else(|| lookup("OPENROUTER_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        validate_api_url(&api_url)?;

        let timeout_secs = overrides.timeout_secs.unwrap_or_else(|| {
            lookup("OPENROUTER_HTTP_TIMEOUT_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
        });
        let max_retries = overrides.max_retries.unwrap_or_else(|| {
            lookup("OPENROUTER_MAX_RETRIES")
                .and_then(|s| s.parse::<u32>().ok())
                .unwrap_or(0)
        });
        let user_agent = lookup("OPENROUTER_USER_AGENT")
            .unwrap_or_else(|| format!("openrouter-key-status/{}", env!("CARGO_PKG_VERSION")));

        Ok(Self {
            token,
            api_url,
            user_agent,
            timeout_secs,
            max_retries,
        })
    }
}

fn validate_api_url(raw: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let parsed = url::Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_only_token_is_set() {
        let cfg = Config::from_lookup(
            &Overrides::default(),
            lookup_from(&[("OPENROUTER_API_KEY", "sk-or-1")]),
        )
        .unwrap();
        assert_eq!(cfg.token, "sk-or-1");
        assert_eq!(cfg.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.max_retries, 0);
        assert!(cfg.user_agent.starts_with("openrouter-key-status/"));
    }

    #[test]
    fn missing_or_blank_token_is_an_error() {
        let err = Config::from_lookup(&Overrides::default(), lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));

        let err = Config::from_lookup(
            &Overrides::default(),
            lookup_from(&[("OPENROUTER_API_KEY", "   ")]),
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn overrides_win_over_environment() {
        let overrides = Overrides {
            token: Some("from-flag".into()),
            api_url: Some("http://127.0.0.1:9999/api/v1".into()),
            timeout_secs: Some(5),
            max_retries: Some(2),
        };
        let cfg = Config::from_lookup(
            &overrides,
            lookup_from(&[
                ("OPENROUTER_API_KEY", "from-env"),
                ("OPENROUTER_API_URL", "https://example.invalid"),
                ("OPENROUTER_HTTP_TIMEOUT_SECS", "60"),
                ("OPENROUTER_MAX_RETRIES", "9"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.token, "from-flag");
        assert_eq!(cfg.api_url, "http://127.0.0.1:9999/api/v1");
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.max_retries, 2);
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let cfg = Config::from_lookup(
            &Overrides::default(),
            lookup_from(&[
                ("OPENROUTER_API_KEY", "t"),
                ("OPENROUTER_HTTP_TIMEOUT_SECS", "soon"),
                ("OPENROUTER_MAX_RETRIES", "-1"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.max_retries, 0);
    }

    #[test]
    fn zero_timeout_is_kept_as_no_timeout() {
        let cfg = Config::from_lookup(
            &Overrides::default(),
            lookup_from(&[("OPENROUTER_API_KEY", "t"), ("OPENROUTER_HTTP_TIMEOUT_SECS", "0")]),
        )
        .unwrap();
        assert_eq!(cfg.timeout_secs, 0);
    }

    #[test]
    fn rejects_non_http_api_url() {
        for bad in ["not a url", "ftp://openrouter.ai/api/v1"] {
            let err = Config::from_lookup(
                &Overrides::default(),
                lookup_from(&[("OPENROUTER_API_KEY", "t"), ("OPENROUTER_API_URL", bad)]),
            )
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidUrl { .. }), "{bad}");
        }
    }
}
