//! Configuration loader for Bharat Guide.
//!
//! Reads `bharat.toml` and deserializes it into [`AppConfig`], falling back
//! to defaults when the file is missing or malformed. Environment variables
//! then override individual fields, and the API key is resolved from the
//! environment into a [`SecretString`].

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use bharat_core::prompt::PersonaTemplate;
use bharat_types::config::AppConfig;
use bharat_types::error::ConfigError;

/// Default configuration file name, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "bharat.toml";

pub const ENV_MODEL: &str = "GEMINI_MODEL";
pub const ENV_HOST: &str = "BHARAT_HOST";
pub const ENV_PORT: &str = "BHARAT_PORT";
pub const ENV_CORS_ORIGINS: &str = "BHARAT_CORS_ORIGINS";

/// Everything resolved at startup.
pub struct LoadedConfig {
    pub config: AppConfig,
    /// `None` when the configured key variable is unset or blank.
    pub api_key: Option<SecretString>,
    pub persona: PersonaTemplate,
}

/// Load configuration from `path` and the process environment.
pub async fn load(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let mut config = load_config_file(path).await;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
    let api_key = resolve_api_key(&config, |name| std::env::var(name).ok());
    let persona = load_persona(&config, path.parent()).await?;

    tracing::debug!(
        host = %config.server.host,
        port = config.server.port,
        model = %config.upstream.model,
        api_key_present = api_key.is_some(),
        "Configuration loaded"
    );

    Ok(LoadedConfig {
        config,
        api_key,
        persona,
    })
}

/// Read and parse the TOML file.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but cannot be read or parsed, logs a warning and
///   returns the default.
pub async fn load_config_file(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

/// Apply environment overrides. Blank values are ignored.
///
/// `lookup` abstracts `std::env::var` so tests need not mutate the process
/// environment.
pub fn apply_env_overrides(
    config: &mut AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(model) = get(ENV_MODEL) {
        config.upstream.model = model;
    }
    if let Some(host) = get(ENV_HOST) {
        config.server.host = host;
    }
    if let Some(port) = get(ENV_PORT) {
        config.server.port = port.parse().map_err(|e| ConfigError::InvalidValue {
            key: ENV_PORT.to_string(),
            message: format!("'{port}' is not a valid port: {e}"),
        })?;
    }
    if let Some(origins) = get(ENV_CORS_ORIGINS) {
        config.server.cors_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(String::from)
            .collect();
    }
    Ok(())
}

/// Resolve the API key from the variable named by `upstream.api_key_env`.
pub fn resolve_api_key(
    config: &AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    lookup(&config.upstream.api_key_env)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(SecretString::from)
}

/// Load the persona template named by `chat.persona_path`, or the built-in.
///
/// Relative paths resolve against `base_dir` (the config file's directory).
/// Unlike the config file itself, an explicitly configured persona that
/// cannot be read is an error.
pub async fn load_persona(
    config: &AppConfig,
    base_dir: Option<&Path>,
) -> Result<PersonaTemplate, ConfigError> {
    let Some(persona_path) = config.chat.persona_path.as_deref() else {
        return Ok(PersonaTemplate::default());
    };

    let path = resolve_relative(persona_path, base_dir);
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

    if text.trim().is_empty() {
        return Err(ConfigError::Parse {
            path: path.display().to_string(),
            message: "persona file is empty".to_string(),
        });
    }

    tracing::info!(path = %path.display(), "Loaded persona template");
    Ok(PersonaTemplate::parse(&text))
}

fn resolve_relative(path: &str, base_dir: Option<&Path>) -> PathBuf {
    let path = Path::new(path);
    match base_dir {
        Some(base) if path.is_relative() => base.join(path),
        _ => path.to_path_buf(),
    }
}
