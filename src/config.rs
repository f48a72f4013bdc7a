//! Startup configuration.
//!
//! Sources, lowest to highest priority: built-in defaults, `./consult.toml`,
//! an explicit TOML file, `CONSULT_*` environment variables and finally
//! `OPENAI_API_KEY` for the credential.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tap::Pipe;

use crate::openai::chat::ChatCompletionModel;

/// Project-level configuration file, read from the working directory.
pub const PROJECT_CONFIG: &'static str = "consult.toml";
/// Environment variable holding the API key.
pub const API_KEY_VAR: &'static str = "OPENAI_API_KEY";
/// Prefix of environment variables overriding any other setting.
pub const ENV_PREFIX: &'static str = "CONSULT_";

/// Chat completion endpoint used unless configured otherwise.
pub const DEFAULT_ENDPOINT: &'static str = "https://api.openai.com/v1/chat/completions";
/// Completion token ceiling per task.
pub const DEFAULT_MAX_TOKENS: u16 = 1500;
/// Sampling temperature per task.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Configuration errors. Any of them stops the program before a request is sent.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no API key configured; set OPENAI_API_KEY")]
    MissingApiKey,
    #[error("configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),
    #[error("invalid configuration: {0}")]
    Invalid(Box<figment::Error>),
}

type Result<T> = core::result::Result<T, Error>;

/// Bearer credential for the completion endpoint. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a raw key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for the `Authorization` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Raw merged settings, before the credential is checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_key: Option<ApiKey>,
    pub endpoint: String,
    pub model: ChatCompletionModel,
    pub max_tokens: u16,
    pub temperature: f32,
    pub accept_invalid_certs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: ChatCompletionModel::Gpt4,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            accept_invalid_certs: false,
        }
    }
}

/// Process-wide configuration, built once at startup.
#[derive(Debug, Clone)]
pub struct ConsultConfig {
    /// Bearer credential.
    pub api_key: ApiKey,
    /// Full URL of the chat completion endpoint.
    pub endpoint: String,
    /// Model asked for every task.
    pub model: ChatCompletionModel,
    /// Completion token ceiling per task.
    pub max_tokens: u16,
    /// Sampling temperature per task.
    pub temperature: f32,
    /// Skip TLS certificate verification. Off unless explicitly requested.
    pub accept_invalid_certs: bool,
}

impl ConsultConfig {
    /// Default settings with the given credential.
    pub fn new(api_key: ApiKey) -> Self {
        let defaults = Settings::default();
        Self {
            api_key,
            endpoint: defaults.endpoint,
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            accept_invalid_certs: defaults.accept_invalid_certs,
        }
    }

    /// All configuration sources, merged but not yet extracted.
    ///
    /// Callers may merge further overrides (e.g. command line flags) before
    /// passing the result to [`ConsultConfig::from_figment`]. An explicit
    /// `path` must name an existing file.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
        if Path::new(PROJECT_CONFIG).exists() {
            figment = figment.merge(Toml::file(PROJECT_CONFIG));
        }
        if let Some(path) = path {
            if !path.is_file() {
                return Err(Error::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Env::raw().only(&[API_KEY_VAR]).map(|_| "api_key".into()))
            .pipe(Ok)
    }

    /// Extract the merged settings. Fails when no credential is available.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        figment
            .extract::<Settings>()
            .map_err(|e| Error::Invalid(Box::new(e)))?
            .pipe(Self::from_settings)
    }

    /// Load from every source.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::from_figment(Self::figment(path)?)
    }

    fn from_settings(settings: Settings) -> Result<Self> {
        let api_key = match settings.api_key {
            Some(key) if !key.expose().trim().is_empty() => key,
            _ => return Err(Error::MissingApiKey),
        };
        Self {
            api_key,
            endpoint: settings.endpoint,
            model: settings.model,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            accept_invalid_certs: settings.accept_invalid_certs,
        }
        .pipe(Ok)
    }
}
