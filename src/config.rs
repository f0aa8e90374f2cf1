use std::env;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};

/// The default base URL of the remote blog API.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
/// The default number of blogs per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The base URL of the remote blog API.
    pub api_url: String,
    /// Where the persisted session slots live.
    pub storage_path: PathBuf,
    /// The number of blogs requested per listing page.
    pub page_size: u32,
    /// The timeout applied to every HTTP request.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_path: PathBuf::from(".postdeck/storage.json"),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let page_size: u32 = env::var("PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .context("Invalid PAGE_SIZE")?;

        if page_size == 0 {
            anyhow::bail!("PAGE_SIZE must be greater than zero");
        }

        let timeout_secs: u64 = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .context("Invalid REQUEST_TIMEOUT_SECS")?;

        Ok(Self {
            api_url: env::var("API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            storage_path: env::var("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".postdeck/storage.json")),
            page_size,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
