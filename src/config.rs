use crate::{errors::ClientError, messages::Locale, stores::DEFAULT_PAGE_SIZE};
use std::{env, path::PathBuf, str::FromStr, time::Duration};
use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_STORAGE_DIR: &str = ".blog-client";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Client settings, read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub storage_dir: PathBuf,
    pub locale: Locale,
    pub request_timeout: Duration,
    pub page_size: usize,
}

impl ClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            locale: Locale::default(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Reads `BLOG_API_BASE_URL`, `BLOG_STORAGE_DIR`, `BLOG_LOCALE`,
    /// `BLOG_REQUEST_TIMEOUT_SECS` and `BLOG_PAGE_SIZE`.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("BLOG_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into());
        let base_url = Url::parse(&base_url)
            .map_err(|e| ClientError::Config(format!("BLOG_API_BASE_URL `{base_url}`: {e}")))?;

        let mut config = Self::new(base_url);

        if let Some(dir) = lookup("BLOG_STORAGE_DIR") {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Some(locale) = lookup("BLOG_LOCALE") {
            config.locale = locale
                .parse()
                .map_err(|e| ClientError::Config(format!("BLOG_LOCALE: {e}")))?;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "BLOG_REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(size) = parse_var::<usize, _>(&lookup, "BLOG_PAGE_SIZE")? {
            if size == 0 {
                return Err(ClientError::Config("BLOG_PAGE_SIZE must be positive".into()));
            }
            config.page_size = size;
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, ClientError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| ClientError::Config(format!("{key} `{raw}`: {e}")))
        })
        .transpose()
}
