use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use url::Url;

use crate::upload::{self, ImageLimits};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("parse {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("unsupported config format: {0} (expected .yaml, .yml or .toml)")]
    Format(PathBuf),
    #[error("upload.endpoint must be an http(s) URL, got {0}")]
    Endpoint(Url),
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
    #[error("environment variable {0} is not set")]
    MissingToken(String),
    #[error("build upload client: {0}")]
    Client(#[from] upload::http::Error),
}

fn default_field() -> String {
    "file".to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_bytes() -> u64 {
    upload::DEFAULT_MAX_BYTES
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UploadConfig {
    pub endpoint: Url,
    #[serde(default = "default_field")]
    pub field: String,
    pub token: Option<String>,
    /// Name of an environment variable holding the token.
    pub token_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedConfig {
    #[serde(default = "default_true")]
    pub link_cards: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self { link_cards: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub upload: UploadConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub embed: EmbedConfig,
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self, Error> {
        let src = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| Error::Read {
                path: path.to_owned(),
                source,
            })?;
        let config = Self::parse(path, &src)?;
        config.validate()?;
        Ok(config)
    }

    /// Format follows the file extension.
    pub fn parse(path: &Path, src: &str) -> Result<Self, Error> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => serde_yaml::from_str(src).map_err(|source| Error::Yaml {
                path: path.to_owned(),
                source,
            }),
            Some("toml") => toml::from_str(src).map_err(|source| Error::Toml {
                path: path.to_owned(),
                source,
            }),
            _ => Err(Error::Format(path.to_owned())),
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !matches!(self.upload.endpoint.scheme(), "http" | "https") {
            return Err(Error::Endpoint(self.upload.endpoint.clone()));
        }
        if self.upload.timeout_secs == 0 {
            return Err(Error::Zero("upload.timeout_secs"));
        }
        if self.images.max_bytes == 0 {
            return Err(Error::Zero("images.max_bytes"));
        }
        Ok(())
    }

    pub fn limits(&self) -> ImageLimits {
        ImageLimits {
            max_bytes: self.images.max_bytes,
        }
    }
}

impl UploadConfig {
    /// An inline token wins over `token_env`.
    pub fn token(&self) -> Result<Option<String>, Error> {
        if let Some(token) = &self.token {
            return Ok(Some(token.clone()));
        }
        match &self.token_env {
            Some(name) => std::env::var(name)
                .map(Some)
                .map_err(|_| Error::MissingToken(name.clone())),
            None => Ok(None),
        }
    }

    pub fn client(&self) -> Result<upload::http::Client, Error> {
        let client = upload::http::Client::new(
            self.endpoint.clone(),
            Duration::from_secs(self.timeout_secs),
        )?
        .with_field(self.field.clone())
        .with_token(self.token()?);
        Ok(client)
    }
}
