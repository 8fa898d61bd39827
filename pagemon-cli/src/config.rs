use std::path::{Path, PathBuf};
use std::time::Duration;

use page_monitor::fetch::DEFAULT_TIMEOUT;
use page_monitor::monitor::DEFAULT_AUTH_REDIRECT_PATTERN;
use page_monitor::{AuthRedirect, HttpFetcherConfig, MonitorConfig, RegionMarker, RegionSelector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::cli::Args;
use crate::error::{AppError, Result};
use crate::logging::DEFAULT_LOG_FILTER;

/// Config file looked up in the working directory.
const LOCAL_CONFIG_FILE: &str = "pagemon.toml";

/// Default period between checks.
const DEFAULT_INTERVAL_SECS: u64 = 60;

/// Top-level configuration loaded from `pagemon.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub target: TargetConfig,
    pub credentials: CredentialsConfig,
    pub schedule: ScheduleConfig,
    pub http: HttpConfig,
    pub extract: ExtractConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Page to monitor. Fixed for the lifetime of the process.
    pub url: Option<String>,
    /// Substring of the resolved URL that identifies the login page.
    pub auth_redirect_pattern: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// JSON cookie export (`[{"name", "value", "domain"}, ...]`).
    pub cookies_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
    pub proxy: Option<String>,
    pub use_system_proxy: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Region markers in priority order.
    pub markers: Vec<RegionMarker>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    /// Enables a daily-rolling log file in this directory.
    pub log_dir: Option<PathBuf>,
}

// --- Default implementations ---

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            url: None,
            auth_redirect_pattern: DEFAULT_AUTH_REDIRECT_PATTERN.to_string(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            cookies_file: PathBuf::from("moodle_cookies.json"),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_INTERVAL_SECS,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: None,
            proxy: None,
            use_system_proxy: true,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            markers: RegionSelector::default().markers().to_vec(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `./pagemon.toml` and then
    /// `<config dir>/pagemon/config.toml` are tried; if neither exists the
    /// defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    debug!("No config file found; using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let contents = std::fs::read_to_string(&path).map_err(|e| {
            AppError::config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&contents, &path)?;
        debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self> {
        toml::from_str(contents).map_err(|source| AppError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn default_path() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("pagemon").join("config.toml"))
            .filter(|path| path.is_file())
    }

    /// Apply command-line overrides.
    pub fn merge_args(&mut self, args: &Args) -> Result<()> {
        if let Some(url) = &args.url {
            self.target.url = Some(url.clone());
        }
        if let Some(cookies) = &args.cookies {
            self.credentials.cookies_file = cookies.clone();
        }
        if let Some(interval) = args.interval {
            self.schedule.interval_secs = interval;
        }
        if let Some(timeout) = args.timeout {
            self.http.timeout_secs = timeout;
        }
        if !args.markers.is_empty() {
            self.extract.markers = args
                .markers
                .iter()
                .map(|marker| marker.parse::<RegionMarker>())
                .collect::<page_monitor::Result<Vec<_>>>()?;
        }
        Ok(())
    }

    /// Check the settings that have no usable fallback.
    pub fn validate(&self) -> Result<()> {
        self.target_url()?;
        if self.schedule.interval_secs == 0 {
            return Err(AppError::config("schedule.interval_secs must be greater than 0"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be greater than 0"));
        }
        if self.credentials.cookies_file.as_os_str().is_empty() {
            return Err(AppError::config("credentials.cookies_file must not be empty"));
        }
        for marker in &self.extract.markers {
            if marker.tag.is_empty() || marker.attribute.is_empty() || marker.value.is_empty() {
                return Err(AppError::config(format!("invalid region marker '{}'", marker)));
            }
        }
        Ok(())
    }

    pub fn target_url(&self) -> Result<Url> {
        let raw = self.target.url.as_deref().ok_or_else(|| {
            AppError::config("no target URL; set target.url in the config file or pass --url")
        })?;
        let url = Url::parse(raw).map_err(page_monitor::Error::from)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(AppError::config(format!(
                "unsupported URL scheme '{}' in {}",
                scheme, raw
            ))),
        }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.schedule.interval_secs)
    }

    pub fn monitor_config(&self) -> Result<MonitorConfig> {
        Ok(MonitorConfig {
            target_url: self.target_url()?,
            auth_redirect: AuthRedirect::new(self.target.auth_redirect_pattern.clone()),
            selector: RegionSelector::new(self.extract.markers.clone()),
        })
    }

    pub fn fetcher_config(&self) -> HttpFetcherConfig {
        HttpFetcherConfig {
            timeout: Duration::from_secs(self.http.timeout_secs),
            user_agent: self.http.user_agent.clone(),
            proxy: self.http.proxy.clone(),
            use_system_proxy: self.http.use_system_proxy,
        }
    }

    /// Render the resolved configuration as TOML.
    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
