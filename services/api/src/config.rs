use crate::log_file;
use phone_teacher_core::credentials::CredentialSource;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Defines the supported completion service providers.
///
/// Both are reached through their OpenAI-compatible chat completion endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAI,
}

impl Provider {
    pub fn api_base(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Provider::OpenAI => "https://api.openai.com/v1",
        }
    }

    /// The environment variable holding this provider's API key.
    pub fn key_var(&self) -> &'static str {
        match self {
            Provider::Gemini => "GOOGLE_GENAI_API_KEY",
            Provider::OpenAI => "OPENAI_API_KEY",
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub provider: Provider,
    pub credential_source: CredentialSource,
    pub chat_model: String,
    pub completion_timeout: Duration,
    pub log_level: Level,
    pub log_path: PathBuf,
    pub log_max_bytes: u64,
    pub log_backups: usize,
    pub prompt_path: PathBuf,
    pub voice_name: String,
    pub voice_language: String,
    pub gather_timeout_secs: u32,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_positive<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let raw = var_or(name, default);
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => Ok(value),
        _ => Err(ConfigError::InvalidValue(
            name.to_string(),
            format!("'{}' is not a positive integer", raw),
        )),
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:5000");
        let mut bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;
        if let Ok(port_str) = std::env::var("PORT") {
            let port = port_str
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?;
            bind_address.set_port(port);
        }

        let provider_str = var_or("COMPLETION_PROVIDER", "gemini");
        let provider = match provider_str.to_lowercase().as_str() {
            "gemini" => Provider::Gemini,
            "openai" => Provider::OpenAI,
            other => {
                return Err(ConfigError::InvalidValue(
                    "COMPLETION_PROVIDER".to_string(),
                    format!("'{}' is not one of 'gemini', 'openai'", other),
                ));
            }
        };

        let source_str = var_or("CREDENTIAL_SOURCE", "env");
        let credential_source = match source_str.to_lowercase().as_str() {
            "env" => CredentialSource::Environment {
                var: provider.key_var().to_string(),
            },
            "interactive" => CredentialSource::Interactive {
                cache_path: PathBuf::from(var_or("CREDENTIAL_CACHE_PATH", ".api_key")),
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "CREDENTIAL_SOURCE".to_string(),
                    format!("'{}' is not one of 'env', 'interactive'", other),
                ));
            }
        };

        // A missing key is fatal before any other startup work.
        if let CredentialSource::Environment { var } = &credential_source {
            if std::env::var(var).map_or(true, |v| v.trim().is_empty()) {
                return Err(ConfigError::MissingVar(format!(
                    "{} must be set for '{}' provider",
                    var,
                    provider_str.to_lowercase()
                )));
            }
        }

        let chat_model = var_or("CHAT_MODEL", "gemma-3-27b-it");

        let completion_timeout =
            Duration::from_secs(parse_positive::<u64>("COMPLETION_TIMEOUT_SECS", "20")?);

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let log_path = PathBuf::from(var_or("APP_LOG_FILE", "app.log"));
        let log_max_bytes = parse_positive::<u64>(
            "APP_LOG_MAX_BYTES",
            &log_file::DEFAULT_MAX_BYTES.to_string(),
        )?;
        let backups_str = var_or("APP_LOG_BACKUPS", &log_file::DEFAULT_BACKUPS.to_string());
        let log_backups = backups_str.parse::<usize>().map_err(|_| {
            ConfigError::InvalidValue(
                "APP_LOG_BACKUPS".to_string(),
                format!("'{}' is not a non-negative integer", backups_str),
            )
        })?;
        let prompt_path = PathBuf::from(var_or("PROMPT_FILE", "prompt_store.json"));

        let voice_name = var_or("VOICE_NAME", "alice");
        let voice_language = var_or("VOICE_LANGUAGE", "en-US");
        let gather_timeout_secs = parse_positive::<u32>("GATHER_TIMEOUT_SECS", "5")?;

        Ok(Self {
            bind_address,
            provider,
            credential_source,
            chat_model,
            completion_timeout,
            log_level,
            log_path,
            log_max_bytes,
            log_backups,
            prompt_path,
            voice_name,
            voice_language,
            gather_timeout_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tracing::Level;

    const VARS: [&str; 17] = [
        "BIND_ADDRESS",
        "PORT",
        "COMPLETION_PROVIDER",
        "CREDENTIAL_SOURCE",
        "CREDENTIAL_CACHE_PATH",
        "GOOGLE_GENAI_API_KEY",
        "OPENAI_API_KEY",
        "CHAT_MODEL",
        "COMPLETION_TIMEOUT_SECS",
        "RUST_LOG",
        "APP_LOG_FILE",
        "APP_LOG_MAX_BYTES",
        "APP_LOG_BACKUPS",
        "PROMPT_FILE",
        "VOICE_NAME",
        "VOICE_LANGUAGE",
        "GATHER_TIMEOUT_SECS",
    ];

    fn clear_env_vars() {
        for var in VARS {
            unsafe {
                env::remove_var(var);
            }
        }
    }

    fn set_minimal_env_gemini() {
        unsafe {
            env::set_var("GOOGLE_GENAI_API_KEY", "test-gemini-key");
        }
    }

    #[test]
    fn test_config_error_display() {
        let missing_var = ConfigError::MissingVar("TEST_VAR".to_string());
        assert_eq!(
            format!("{}", missing_var),
            "Missing environment variable: TEST_VAR"
        );

        let invalid_value =
            ConfigError::InvalidValue("TEST_VAR".to_string(), "bad_value".to_string());
        assert_eq!(
            format!("{}", invalid_value),
            "Invalid value for environment variable TEST_VAR: bad_value"
        );
    }

    #[test]
    fn test_provider_endpoints() {
        assert_eq!(Provider::Gemini.key_var(), "GOOGLE_GENAI_API_KEY");
        assert_eq!(Provider::OpenAI.key_var(), "OPENAI_API_KEY");
        assert!(Provider::Gemini.api_base().contains("generativelanguage"));
        assert!(Provider::OpenAI.api_base().contains("api.openai.com"));
    }

    #[test]
    #[serial]
    fn test_config_from_env_minimal_gemini() {
        clear_env_vars();
        set_minimal_env_gemini();

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "0.0.0.0:5000");
        assert_eq!(config.provider, Provider::Gemini);
        assert_eq!(
            config.credential_source,
            CredentialSource::Environment {
                var: "GOOGLE_GENAI_API_KEY".to_string()
            }
        );
        assert_eq!(config.chat_model, "gemma-3-27b-it");
        assert_eq!(config.completion_timeout, Duration::from_secs(20));
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.log_path, PathBuf::from("app.log"));
        assert_eq!(config.log_max_bytes, 5 * 1024 * 1024);
        assert_eq!(config.log_backups, 2);
        assert_eq!(config.prompt_path, PathBuf::from("prompt_store.json"));
        assert_eq!(config.voice_name, "alice");
        assert_eq!(config.voice_language, "en-US");
        assert_eq!(config.gather_timeout_secs, 5);
    }

    #[test]
    #[serial]
    fn test_config_from_env_custom_values() {
        clear_env_vars();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("COMPLETION_PROVIDER", "OpenAI");
            env::set_var("OPENAI_API_KEY", "custom-openai-key");
            env::set_var("CHAT_MODEL", "gpt-4o-mini");
            env::set_var("COMPLETION_TIMEOUT_SECS", "7");
            env::set_var("RUST_LOG", "debug");
            env::set_var("APP_LOG_FILE", "/var/log/teacher.log");
            env::set_var("APP_LOG_MAX_BYTES", "1048576");
            env::set_var("APP_LOG_BACKUPS", "0");
            env::set_var("PROMPT_FILE", "/data/prompt.json");
            env::set_var("VOICE_NAME", "Polly.Joanna");
            env::set_var("VOICE_LANGUAGE", "en-GB");
            env::set_var("GATHER_TIMEOUT_SECS", "8");
        }

        let config = Config::from_env().expect("Config should load successfully");

        assert_eq!(config.bind_address.to_string(), "127.0.0.1:8080");
        assert_eq!(config.provider, Provider::OpenAI);
        assert_eq!(config.chat_model, "gpt-4o-mini");
        assert_eq!(config.completion_timeout, Duration::from_secs(7));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.log_path, PathBuf::from("/var/log/teacher.log"));
        assert_eq!(config.log_max_bytes, 1_048_576);
        assert_eq!(config.log_backups, 0);
        assert_eq!(config.prompt_path, PathBuf::from("/data/prompt.json"));
        assert_eq!(config.voice_name, "Polly.Joanna");
        assert_eq!(config.voice_language, "en-GB");
        assert_eq!(config.gather_timeout_secs, 8);
    }

    #[test]
    #[serial]
    fn test_port_overrides_bind_address_port() {
        clear_env_vars();
        set_minimal_env_gemini();
        unsafe {
            env::set_var("BIND_ADDRESS", "127.0.0.1:8080");
            env::set_var("PORT", "9000");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address.to_string(), "127.0.0.1:9000");
    }

    #[test]
    #[serial]
    fn test_interactive_source_needs_no_env_key() {
        clear_env_vars();
        unsafe {
            env::set_var("CREDENTIAL_SOURCE", "interactive");
            env::set_var("CREDENTIAL_CACHE_PATH", "/tmp/teacher-key");
        }

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.credential_source,
            CredentialSource::Interactive {
                cache_path: PathBuf::from("/tmp/teacher-key")
            }
        );
    }

    #[test]
    #[serial]
    fn test_config_invalid_bind_address() {
        clear_env_vars();
        set_minimal_env_gemini();
        unsafe {
            env::set_var("BIND_ADDRESS", "not-a-valid-address");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "BIND_ADDRESS"),
            _ => panic!("Expected InvalidValue for BIND_ADDRESS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_level() {
        clear_env_vars();
        set_minimal_env_gemini();
        unsafe {
            env::set_var("RUST_LOG", "not-a-level");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "RUST_LOG"),
            _ => panic!("Expected InvalidValue for RUST_LOG"),
        }
    }

    #[test]
    #[serial]
    fn test_config_zero_gather_timeout_rejected() {
        clear_env_vars();
        set_minimal_env_gemini();
        unsafe {
            env::set_var("GATHER_TIMEOUT_SECS", "0");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "GATHER_TIMEOUT_SECS"),
            _ => panic!("Expected InvalidValue for GATHER_TIMEOUT_SECS"),
        }
    }

    #[test]
    #[serial]
    fn test_config_invalid_log_bounds() {
        for (var, value) in [("APP_LOG_MAX_BYTES", "0"), ("APP_LOG_BACKUPS", "-1")] {
            clear_env_vars();
            set_minimal_env_gemini();
            unsafe {
                env::set_var(var, value);
            }

            match Config::from_env().unwrap_err() {
                ConfigError::InvalidValue(name, _) => assert_eq!(name, var),
                _ => panic!("Expected InvalidValue for {var}"),
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_unknown_provider() {
        clear_env_vars();
        set_minimal_env_gemini();
        unsafe {
            env::set_var("COMPLETION_PROVIDER", "anthropic");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::InvalidValue(var, _) => assert_eq!(var, "COMPLETION_PROVIDER"),
            _ => panic!("Expected InvalidValue for COMPLETION_PROVIDER"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_gemini_key() {
        clear_env_vars();

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => {
                assert!(msg.contains("GOOGLE_GENAI_API_KEY"));
            }
            _ => panic!("Expected MissingVar for GOOGLE_GENAI_API_KEY"),
        }
    }

    #[test]
    #[serial]
    fn test_config_missing_openai_key() {
        clear_env_vars();
        unsafe {
            env::set_var("COMPLETION_PROVIDER", "openai");
        }

        let err = Config::from_env().unwrap_err();
        match err {
            ConfigError::MissingVar(msg) => {
                assert!(msg.contains("OPENAI_API_KEY"));
            }
            _ => panic!("Expected MissingVar for OPENAI_API_KEY"),
        }
    }
}
