use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_TTL_SECS;
use crate::error::CatalogError;
use crate::fetcher::{ProxyTemplate, Source, default_proxies, default_sources};
use crate::normalize::{NormalizeOptions, OrphanPolicy};

pub const CONFIG_FILE: &str = "awesome-video.json";
pub const CONTENTS_URL_ENV: &str = "AWESOME_VIDEO_CONTENTS_URL";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
    #[serde(default)]
    // None keeps the built-in relays; an empty list disables relaying.
    pub proxies: Option<Vec<String>>,
    #[serde(default)]
    pub local_bundle: Option<String>,
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub cache_ttl_secs: Option<i64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub orphans: Option<OrphanPolicy>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SourceEntry {
    Shorthand(String),
    Detailed(SourceEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SourceEntryObject {
    pub url: String,
    #[serde(default)]
    pub relay: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub sources: Vec<Source>,
    pub proxies: Vec<ProxyTemplate>,
    pub local_bundle: Option<Utf8PathBuf>,
    pub cache_dir: Option<Utf8PathBuf>,
    pub cache_ttl: chrono::Duration,
    pub timeout: Duration,
    pub orphans: OrphanPolicy,
}

impl ResolvedConfig {
    pub fn normalize_options(&self) -> NormalizeOptions {
        NormalizeOptions {
            orphans: self.orphans,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CatalogError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE),
        };

        let config = if path.is_none() && !config_path.exists() {
            Config::default()
        } else {
            let content = fs::read_to_string(&config_path)
                .map_err(|_| CatalogError::ConfigRead(config_path.clone()))?;
            serde_json::from_str(&content)
                .map_err(|err| CatalogError::ConfigParse(err.to_string()))?
        };

        let resolved = Self::resolve_config(config)?;
        Ok(Self::apply_contents_override(
            resolved,
            std::env::var(CONTENTS_URL_ENV).ok(),
        ))
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, CatalogError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let sources = config
            .sources
            .into_iter()
            .map(|entry| {
                let source = match entry {
                    SourceEntry::Shorthand(url) => Source::new(url.trim()),
                    SourceEntry::Detailed(obj) => Source {
                        url: obj.url.trim().to_string(),
                        relay: obj.relay.unwrap_or(true),
                    },
                };
                validate_source(&source.url)?;
                Ok(source)
            })
            .collect::<Result<Vec<_>, CatalogError>>()?;
        let sources = if sources.is_empty() {
            default_sources()
        } else {
            sources
        };

        let proxies = match config.proxies {
            Some(values) => values
                .iter()
                .map(|value| value.parse::<ProxyTemplate>())
                .collect::<Result<Vec<_>, CatalogError>>()?,
            None => default_proxies(),
        };

        let cache_ttl_secs = config.cache_ttl_secs.unwrap_or(DEFAULT_TTL_SECS);
        if cache_ttl_secs <= 0 {
            return Err(CatalogError::ConfigParse(format!(
                "cache_ttl_secs must be positive, got {cache_ttl_secs}"
            )));
        }
        let timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CatalogError::ConfigParse(
                "timeout_secs must be positive".to_string(),
            ));
        }

        Ok(ResolvedConfig {
            schema_version,
            sources,
            proxies,
            local_bundle: config.local_bundle.map(Utf8PathBuf::from),
            cache_dir: config.cache_dir.map(Utf8PathBuf::from),
            cache_ttl: chrono::Duration::seconds(cache_ttl_secs),
            timeout: Duration::from_secs(timeout_secs),
            orphans: config.orphans.unwrap_or_default(),
        })
    }

    pub fn apply_contents_override(
        mut resolved: ResolvedConfig,
        url: Option<String>,
    ) -> ResolvedConfig {
        let Some(url) = url.map(|value| value.trim().to_string()) else {
            return resolved;
        };
        if url.is_empty() || validate_source(&url).is_err() {
            return resolved;
        }
        resolved.sources.retain(|source| source.url != url);
        resolved.sources.insert(0, Source::new(url));
        resolved
    }
}

fn validate_source(url: &str) -> Result<(), CatalogError> {
    let parsed =
        url::Url::parse(url).map_err(|err| CatalogError::InvalidSource(format!("{url}: {err}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(CatalogError::InvalidSource(format!(
            "{url}: unsupported scheme {other}"
        ))),
    }
}
