use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::cache::CacheConfig;
use crate::corpus::PresentationCap;
use crate::session::SessionConfig;
use crate::types::{DistancePolicy, Method};

/// Top-level application configuration loaded from file + environment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub corpus: CorpusSection,
    pub query: QuerySection,
    pub presentation: PresentationSection,
    pub cache: CacheSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load configuration from disk and environment.
    pub fn load() -> Result<Self> {
        let config_path =
            env::var("HISTOSEEK_CONFIG").unwrap_or_else(|_| "histoseek.toml".to_string());

        let mut builder = config::Config::builder();

        if Path::new(&config_path).exists() {
            builder = builder.add_source(config::File::from(PathBuf::from(&config_path)));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("HISTOSEEK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let mut config: Self = settings.try_deserialize()?;

        if config.logging.level.trim().is_empty() {
            config.logging.level = "info".to_string();
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the session cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.presentation.page_size == 0 {
            bail!("presentation.page_size must be at least 1");
        }
        if self.presentation.max_pages == 0 {
            bail!("presentation.max_pages must be at least 1");
        }
        if self.corpus.extension.trim_start_matches('.').is_empty() {
            bail!("corpus.extension must not be empty");
        }
        Ok(())
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            method: self.query.method,
            policy: self.query.distance,
            cap: PresentationCap {
                page_size: self.presentation.page_size,
                max_pages: self.presentation.max_pages,
            },
            reset_page_on_rank: self.presentation.reset_page_on_rank,
        }
    }

    pub fn cache_config(&self) -> CacheConfig {
        match self.cache.capacity {
            0 => CacheConfig::unbounded(),
            capacity => CacheConfig::bounded(capacity),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorpusSection {
    pub root: PathBuf,
    pub extension: String,
}

impl Default for CorpusSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("images"),
            extension: "jpg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct QuerySection {
    pub method: Method,
    pub distance: DistancePolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PresentationSection {
    pub page_size: usize,
    pub max_pages: usize,
    pub reset_page_on_rank: bool,
}

impl Default for PresentationSection {
    fn default() -> Self {
        let cap = PresentationCap::default();
        Self {
            page_size: cap.page_size,
            max_pages: cap.max_pages,
            reset_page_on_rank: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CacheSection {
    /// Maximum cached fingerprints; 0 keeps every fingerprint.
    pub capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Text,
}
