//! Configuration file and run configuration.
//!
//! Settings live in `~/.seowatch/config.json` as a flat string map managed by
//! `seowatch config get|set|list`. Command-line flags override file values;
//! the result is resolved once into an immutable [`Config`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{Error, Result};

pub const KEY_SITE_URL: &str = "site_url";
pub const KEY_SITE_ORIGIN: &str = "site_origin";
pub const KEY_CREDENTIALS: &str = "credentials";
pub const KEY_HISTORY_FILE: &str = "history_file";
pub const KEY_TOTAL_PAGES: &str = "total_pages";

pub const KNOWN_KEYS: &[&str] = &[
    KEY_SITE_URL,
    KEY_SITE_ORIGIN,
    KEY_CREDENTIALS,
    KEY_HISTORY_FILE,
    KEY_TOTAL_PAGES,
];

const HISTORY_FILE_NAME: &str = "seo_history.json";

/// `~/.seowatch`
pub fn default_dir() -> Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| Error::Config("cannot determine home directory".into()))?
        .join(".seowatch"))
}

/// Key/value settings persisted as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl Settings {
    /// Open the settings file at the default path.
    pub fn open() -> Result<Self> {
        Self::open_at(default_dir()?.join("config.json"))
    }

    /// Open the settings file at `path`. A missing file means no settings.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::Config(format!("invalid config file {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(Error::Config(format!(
                    "cannot read config file {}: {e}",
                    path.display()
                )))
            }
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a known key and write the file.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if !KNOWN_KEYS.contains(&key) {
            return Err(Error::Config(format!(
                "unknown key '{key}'. Known keys: {}",
                KNOWN_KEYS.join(", ")
            )));
        }
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    pub fn list(&self) -> Vec<(String, String)> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let raw = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, raw + "\n")?;
        Ok(())
    }
}

/// Values given on the command line, taking precedence over [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub site_url: Option<String>,
    pub credentials: Option<PathBuf>,
    pub history_file: Option<PathBuf>,
    pub total_pages: Option<u32>,
    /// Used when no credentials are configured anywhere else
    /// (`GOOGLE_APPLICATION_CREDENTIALS`).
    pub fallback_credentials: Option<PathBuf>,
}

/// Resolved configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Search Console property, e.g. `sc-domain:example.com`.
    pub site_url: String,
    /// Prefix stripped from page URLs, e.g. `https://example.com`.
    pub site_origin: String,
    pub credentials_path: PathBuf,
    pub history_path: PathBuf,
    /// Size of the known page corpus.
    pub total_pages: u32,
}

impl Config {
    pub fn resolve(settings: &Settings, overrides: Overrides) -> Result<Self> {
        let site_url = overrides
            .site_url
            .or_else(|| settings.get(KEY_SITE_URL).map(str::to_string))
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| missing(KEY_SITE_URL, "--site"))?;

        // A stored origin belongs to the stored site; `--site` for another
        // property derives its own.
        let stored_origin = settings
            .get(KEY_SITE_ORIGIN)
            .filter(|_| settings.get(KEY_SITE_URL) == Some(site_url.as_str()));
        let site_origin = match stored_origin {
            Some(origin) => origin.trim_end_matches('/').to_string(),
            None => origin_for(&site_url)?,
        };

        let credentials_path = overrides
            .credentials
            .or_else(|| settings.get(KEY_CREDENTIALS).map(PathBuf::from))
            .or(overrides.fallback_credentials)
            .ok_or_else(|| missing(KEY_CREDENTIALS, "--credentials"))?;

        let history_path = history_path(settings, overrides.history_file)?;

        let total_pages = match overrides.total_pages {
            Some(n) => n,
            None => {
                let raw = settings
                    .get(KEY_TOTAL_PAGES)
                    .ok_or_else(|| missing(KEY_TOTAL_PAGES, "--total-pages"))?;
                raw.trim().parse::<u32>().map_err(|_| {
                    Error::Config(format!("{KEY_TOTAL_PAGES} must be a whole number, got '{raw}'"))
                })?
            }
        };
        if total_pages == 0 {
            return Err(Error::Config(format!("{KEY_TOTAL_PAGES} must be greater than zero")));
        }

        Ok(Self {
            site_url,
            site_origin,
            credentials_path,
            history_path,
            total_pages,
        })
    }
}

/// History file location: the override, then the setting, then
/// `~/.seowatch/seo_history.json`.
pub fn history_path(settings: &Settings, override_path: Option<PathBuf>) -> Result<PathBuf> {
    match override_path.or_else(|| settings.get(KEY_HISTORY_FILE).map(PathBuf::from)) {
        Some(p) => Ok(p),
        None => Ok(default_dir()?.join(HISTORY_FILE_NAME)),
    }
}

fn missing(key: &str, flag: &str) -> Error {
    Error::Config(format!(
        "{key} is not set. Pass {flag} or run: seowatch config set {key} <VALUE>"
    ))
}

/// Page URL prefix for a Search Console property.
///
/// Domain properties (`sc-domain:example.com`) map to `https://example.com`;
/// URL-prefix properties map to the URL without its trailing slash.
pub fn origin_for(site_url: &str) -> Result<String> {
    if let Some(domain) = site_url.strip_prefix("sc-domain:") {
        let domain = domain.trim().trim_end_matches('/');
        if domain.is_empty() {
            return Err(Error::Config(format!("invalid site_url: {site_url}")));
        }
        return Ok(format!("https://{domain}"));
    }
    let url = Url::parse(site_url)
        .map_err(|e| Error::Config(format!("invalid site_url {site_url}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(site_url.trim().trim_end_matches('/').to_string()),
        other => Err(Error::Config(format!(
            "invalid site_url {site_url}: unsupported scheme '{other}'"
        ))),
    }
}
