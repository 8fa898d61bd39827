//! Single-page change detection.
//!
//! This module runs one check cycle: credentials, fetch, login-redirect
//! check, region extraction, fingerprint and comparison.

use tracing::{debug, info, warn};
use url::Url;

use crate::credentials::CredentialSource;
use crate::extract::RegionSelector;
use crate::fetch::PageFetcher;
use crate::fingerprint::Fingerprint;

use super::outcome::CheckOutcome;
use super::state::MonitorState;

/// Default path fragment of the login page.
pub const DEFAULT_AUTH_REDIRECT_PATTERN: &str = "login/index.php";

/// Recognizes a resolved URL that points at the login page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirect {
    pattern: String,
}

impl AuthRedirect {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Check if `url` is the authentication endpoint.
    pub fn matches(&self, url: &Url) -> bool {
        !self.pattern.is_empty() && url.as_str().contains(&self.pattern)
    }
}

impl Default for AuthRedirect {
    fn default() -> Self {
        Self::new(DEFAULT_AUTH_REDIRECT_PATTERN)
    }
}

/// Fixed settings of a monitor, resolved at startup.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub target_url: Url,
    pub auth_redirect: AuthRedirect,
    pub selector: RegionSelector,
}

impl MonitorConfig {
    pub fn new(target_url: Url) -> Self {
        Self {
            target_url,
            auth_redirect: AuthRedirect::default(),
            selector: RegionSelector::default(),
        }
    }
}

/// Change monitor for a single page.
pub struct ChangeMonitor<C, F> {
    config: MonitorConfig,
    credentials: C,
    fetcher: F,
}

impl<C, F> ChangeMonitor<C, F>
where
    C: CredentialSource,
    F: PageFetcher,
{
    pub fn new(config: MonitorConfig, credentials: C, fetcher: F) -> Self {
        Self {
            config,
            credentials,
            fetcher,
        }
    }

    pub fn target_url(&self) -> &Url {
        &self.config.target_url
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run one check cycle.
    ///
    /// Never fails: every error is folded into the returned outcome, and the
    /// state is only replaced when a new fingerprint was computed.
    pub async fn run_check_cycle(&self, state: MonitorState) -> (MonitorState, CheckOutcome) {
        let url = &self.config.target_url;
        debug!(url = %url, "Starting check cycle");

        let bundle = match self.credentials.load().await {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(error = %e, "Credentials unavailable; skipping check");
                return (
                    state,
                    CheckOutcome::CredentialsMissing {
                        reason: e.to_string(),
                    },
                );
            }
        };

        let fetched = match self.fetcher.fetch(url, &bundle).await {
            Ok(fetched) => fetched,
            Err(e) => {
                warn!(
                    error = %e,
                    timeout = e.is_timeout(),
                    "Failed to fetch page"
                );
                return (
                    state,
                    CheckOutcome::FetchFailed {
                        reason: e.to_string(),
                    },
                );
            }
        };

        if self.config.auth_redirect.matches(&fetched.final_url) {
            warn!(
                resolved_url = %fetched.final_url,
                "Redirected to login page; cookies have likely expired"
            );
            return (
                state,
                CheckOutcome::CredentialsExpired {
                    resolved_url: fetched.final_url,
                },
            );
        }

        let region = self.config.selector.select(&fetched.body);
        let current = Fingerprint::of(&region.text);
        debug!(
            region = %region.source,
            text_len = region.text.len(),
            fingerprint = %current,
            "Fingerprinted content region"
        );

        match state.fingerprint() {
            None => {
                info!(fingerprint = %current, region = %region.source, "Stored baseline");
                (
                    MonitorState::with_fingerprint(current),
                    CheckOutcome::Baseline {
                        fingerprint: current,
                        region: region.source,
                    },
                )
            }
            Some(previous) if previous != current => {
                info!(%previous, %current, region = %region.source, "Content changed");
                (
                    MonitorState::with_fingerprint(current),
                    CheckOutcome::Changed {
                        previous,
                        current,
                        region: region.source,
                    },
                )
            }
            Some(_) => {
                debug!(fingerprint = %current, "Content unchanged");
                (state, CheckOutcome::Unchanged { fingerprint: current })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_redirect_matches_login_path() {
        let redirect = AuthRedirect::default();
        assert!(redirect.matches(
            &Url::parse("https://moodle.example.org/login/index.php").unwrap()
        ));
        assert!(redirect.matches(
            &Url::parse("https://moodle.example.org/login/index.php?errorcode=4").unwrap()
        ));
        assert!(!redirect.matches(
            &Url::parse("https://moodle.example.org/mod/attendance/view.php?id=1").unwrap()
        ));
    }

    #[test]
    fn test_auth_redirect_empty_pattern_never_matches() {
        let redirect = AuthRedirect::new("");
        assert!(!redirect.matches(&Url::parse("https://example.org/login/index.php").unwrap()));
    }

    #[test]
    fn test_monitor_config_defaults() {
        let config = MonitorConfig::new(Url::parse("https://example.org/page").unwrap());
        assert_eq!(config.auth_redirect.pattern(), DEFAULT_AUTH_REDIRECT_PATTERN);
        assert_eq!(config.selector, RegionSelector::default());
    }
}
