use std::fmt;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

use camino::Utf8PathBuf;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, CACHE_CONTROL, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::CatalogError;

pub const DEFAULT_SOURCES: &[&str] = &[
    "https://cdn.jsdelivr.net/gh/krzemienski/awesome-video@master/contents.json",
    "https://raw.githubusercontent.com/krzemienski/awesome-video/refs/heads/master/contents.json",
    "https://raw.githubusercontent.com/krzemienski/awesome-video/master/contents.json",
];

pub const DEFAULT_PROXIES: &[&str] = &[
    "https://api.allorigins.win/raw?url={url}",
    "https://corsproxy.io/?{url}",
];

const URL_PLACEHOLDER: &str = "{url}";

pub trait ContentsClient: Send + Sync {
    fn get_text(&self, url: &str) -> Result<String, CatalogError>;
}

#[derive(Clone)]
pub struct ContentsHttpClient {
    client: Client,
}

impl ContentsHttpClient {
    pub fn new(timeout: Duration) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("awesome-video-catalog/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CatalogError::Http(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| CatalogError::Http(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, CatalogError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "contents request failed".to_string());
        Err(CatalogError::HttpStatus { status, message })
    }
}

impl ContentsClient for ContentsHttpClient {
    fn get_text(&self, url: &str) -> Result<String, CatalogError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| CatalogError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .text()
            .map_err(|err| CatalogError::Http(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub url: String,
    pub relay: bool,
}

impl Source {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            relay: true,
        }
    }

    pub fn direct_only(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            relay: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTemplate(String);

impl ProxyTemplate {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn wrap(&self, target: &str) -> String {
        let encoded = url::form_urlencoded::byte_serialize(target.as_bytes()).collect::<String>();
        self.0.replace(URL_PLACEHOLDER, &encoded)
    }
}

impl fmt::Display for ProxyTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProxyTemplate {
    type Err = CatalogError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let is_http = trimmed.starts_with("https://") || trimmed.starts_with("http://");
        if !is_http || !trimmed.contains(URL_PLACEHOLDER) {
            return Err(CatalogError::InvalidSource(value.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct Fetched {
    pub document: Value,
    pub origin: String,
}

pub struct RemoteFetcher<C: ContentsClient> {
    client: C,
    sources: Vec<Source>,
    proxies: Vec<ProxyTemplate>,
    local_bundle: Option<Utf8PathBuf>,
}

impl<C: ContentsClient> RemoteFetcher<C> {
    pub fn new(client: C, sources: Vec<Source>) -> Self {
        Self {
            client,
            sources,
            proxies: Vec::new(),
            local_bundle: None,
        }
    }

    pub fn with_proxies(mut self, proxies: Vec<ProxyTemplate>) -> Self {
        self.proxies = proxies;
        self
    }

    pub fn with_local_bundle(mut self, path: Option<Utf8PathBuf>) -> Self {
        self.local_bundle = path;
        self
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    // Each source directly, then through every relay; the local bundle last.
    pub fn fetch(&self) -> Result<Fetched, CatalogError> {
        let mut attempts = 0usize;
        let mut last_error = None;

        for source in &self.sources {
            attempts += 1;
            match self.attempt(&source.url) {
                Ok(document) => return Ok(self.found(document, &source.url)),
                Err(err) => {
                    warn!(url = %source.url, "direct fetch failed: {err}");
                    last_error = Some(err);
                }
            }

            if !source.relay {
                continue;
            }
            for proxy in &self.proxies {
                attempts += 1;
                let relayed = proxy.wrap(&source.url);
                debug!(url = %relayed, "retrying through relay");
                match self.attempt(&relayed) {
                    Ok(document) => return Ok(self.found(document, &relayed)),
                    Err(err) => {
                        warn!(proxy = %proxy, "relay fetch failed: {err}");
                        last_error = Some(err);
                    }
                }
            }
        }

        if let Some(path) = &self.local_bundle {
            attempts += 1;
            match read_bundle(path) {
                Ok(document) => return Ok(self.found(document, path.as_str())),
                Err(err) => {
                    warn!(path = %path, "local bundle failed: {err}");
                    last_error = Some(err);
                }
            }
        }

        Err(CatalogError::FetchFailed {
            attempts,
            last_error: last_error
                .map(|err| err.to_string())
                .unwrap_or_else(|| "no contents sources configured".to_string()),
        })
    }

    fn attempt(&self, url: &str) -> Result<Value, CatalogError> {
        let body = self.client.get_text(url)?;
        debug!(url, bytes = body.len(), "received contents");
        parse_document(url, &body)
    }

    fn found(&self, document: Value, origin: &str) -> Fetched {
        info!(origin, "fetched contents");
        Fetched {
            document,
            origin: origin.to_string(),
        }
    }
}

fn read_bundle(path: &Utf8PathBuf) -> Result<Value, CatalogError> {
    let body = fs::read_to_string(path.as_std_path())
        .map_err(|err| CatalogError::LocalBundle(format!("{path}: {err}")))?;
    parse_document(path.as_str(), &body)
}

fn parse_document(origin: &str, body: &str) -> Result<Value, CatalogError> {
    serde_json::from_str(body).map_err(|err| CatalogError::InvalidJson {
        source_url: origin.to_string(),
        message: err.to_string(),
    })
}

pub fn default_sources() -> Vec<Source> {
    DEFAULT_SOURCES.iter().map(|url| Source::new(*url)).collect()
}

pub fn default_proxies() -> Vec<ProxyTemplate> {
    DEFAULT_PROXIES
        .iter()
        .map(|template| ProxyTemplate(template.to_string()))
        .collect()
}
