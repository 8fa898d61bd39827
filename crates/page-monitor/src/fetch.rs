//! Authenticated page fetching.
//!
//! Cookies are replayed as a single `Cookie` header built from the exported
//! bundle; there is no cookie jar. Two consequences:
//!
//! - reqwest strips the header when a redirect crosses to another host, so a
//!   target that bounces through a different host arrives unauthenticated.
//! - `Set-Cookie` values received along the redirect chain are not sent on
//!   later hops or later cycles.
//!
//! Both surface as a login redirect (expired credentials) rather than a
//! silent mismatch.

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, ClientBuilder, redirect};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::credentials::CredentialBundle;

pub(crate) const DEFAULT_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Maximum number of redirects followed before giving up.
const MAX_REDIRECTS: usize = 10;

/// Raw result of a successful fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// HTTP status code (always 2xx).
    pub status: u16,
    /// URL after following redirects.
    pub final_url: Url,
    /// Response body decoded as text.
    pub body: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: Url },
}

impl FetchError {
    /// Check if the request ran into the configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` authenticated with the cookies in `bundle`.
    async fn fetch(&self, url: &Url, bundle: &CredentialBundle) -> Result<FetchResult, FetchError>;
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Whole-request timeout, connect included.
    pub timeout: Duration,
    /// Overrides the default browser user agent.
    pub user_agent: Option<String>,
    /// Explicit proxy URL.
    pub proxy: Option<String>,
    /// Without an explicit proxy, honor the system/env proxy settings.
    pub use_system_proxy: bool,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            user_agent: None,
            proxy: None,
            use_system_proxy: true,
        }
    }
}

pub fn install_rustls_provider() {
    static PROVIDER_INSTALLED: OnceLock<()> = OnceLock::new();
    PROVIDER_INSTALLED.get_or_init(|| {
        if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
            // Safe to ignore: can happen if another crate installed it first.
            debug!(existing_provider = ?e, "rustls CryptoProvider already installed");
        }
    });
}

/// Apply the proxy settings to `builder`.
///
/// - `proxy = Some(..)` => use the explicit proxy
/// - `proxy = None` + `use_system_proxy = true` => use system/env proxy defaults
/// - `proxy = None` + `use_system_proxy = false` => disable all proxy
///
/// An unparsable proxy URL disables proxying entirely rather than silently
/// falling back to environment settings.
fn apply_proxy(builder: ClientBuilder, config: &HttpFetcherConfig) -> ClientBuilder {
    let Some(url) = config.proxy.as_deref() else {
        if config.use_system_proxy {
            // reqwest default behavior (no `no_proxy()` call) uses system/env proxy settings.
            return builder;
        }
        return builder.no_proxy();
    };

    match reqwest::Proxy::all(url) {
        Ok(proxy) => builder.proxy(proxy),
        Err(error) => {
            warn!(
                proxy_url = %url,
                error = %error,
                "Invalid proxy URL; disabling proxy"
            );
            builder.no_proxy()
        }
    }
}

fn default_headers(user_agent: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let ua = user_agent
        .and_then(|ua| match HeaderValue::from_str(ua) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Invalid user agent; using default");
                None
            }
        })
        .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_UA));
    headers.insert(USER_AGENT, ua);
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.8,pt-BR;q=0.5"),
    );
    // Do not set `Accept-Encoding` here.
    // Reqwest auto-adds it (and auto-decompresses) when the corresponding
    // crate features are enabled, as long as we don't override the header.
    headers
}

/// [`PageFetcher`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &HttpFetcherConfig) -> crate::Result<Self> {
        install_rustls_provider();

        let mut builder = Client::builder()
            .default_headers(default_headers(config.user_agent.as_deref()))
            .redirect(redirect::Policy::limited(MAX_REDIRECTS));

        if config.timeout > Duration::ZERO {
            builder = builder.timeout(config.timeout);
        }

        builder = apply_proxy(builder, config);

        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, bundle: &CredentialBundle) -> Result<FetchResult, FetchError> {
        let mut request = self.client.get(url.clone());

        if let Some(cookie_header) = bundle.cookie_header(url) {
            match HeaderValue::from_str(&cookie_header) {
                Ok(value) => request = request.header(COOKIE, value),
                Err(e) => {
                    // Skip the header instead of sending an invalid value.
                    warn!(error = %e, "Failed to build Cookie header");
                }
            }
        } else {
            debug!(host = ?url.host_str(), "No cookies in scope for target host");
        }

        let response = request.send().await?;
        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: final_url,
            });
        }

        let body = response.text().await?;
        debug!(
            status = status.as_u16(),
            final_url = %final_url,
            bytes = body.len(),
            "Fetched page"
        );

        Ok(FetchResult {
            status: status.as_u16(),
            final_url,
            body,
        })
    }
}
