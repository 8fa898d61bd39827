//! Check cycle outcomes.
//!
//! Every cycle ends in exactly one of these values. Failures are outcomes
//! too; none of them is fatal to the caller.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::extract::RegionSource;
use crate::fingerprint::Fingerprint;

/// Result of one check cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The credential store is absent, unreadable or malformed.
    CredentialsMissing { reason: String },
    /// The fetch was redirected to the login page.
    CredentialsExpired { resolved_url: Url },
    /// Network failure, timeout or non-2xx status.
    FetchFailed { reason: String },
    /// First successful observation.
    Baseline {
        fingerprint: Fingerprint,
        region: RegionSource,
    },
    /// The content differs from the previous observation.
    Changed {
        previous: Fingerprint,
        current: Fingerprint,
        region: RegionSource,
    },
    /// The content matches the previous observation.
    Unchanged { fingerprint: Fingerprint },
}

impl CheckOutcome {
    /// Check if the cycle failed before a fingerprint was computed.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Self::CredentialsMissing { .. }
                | Self::CredentialsExpired { .. }
                | Self::FetchFailed { .. }
        )
    }

    /// Check if the cycle detected a change.
    pub fn is_change(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }

    /// Check if the operator has to act on the credentials.
    pub fn requires_relogin(&self) -> bool {
        matches!(
            self,
            Self::CredentialsMissing { .. } | Self::CredentialsExpired { .. }
        )
    }

    /// Fingerprint computed by this cycle, if any.
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        match self {
            Self::Baseline { fingerprint, .. } | Self::Unchanged { fingerprint } => {
                Some(*fingerprint)
            }
            Self::Changed { current, .. } => Some(*current),
            _ => None,
        }
    }

    /// Stable event name for logs.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::CredentialsMissing { .. } => "credentials_missing",
            Self::CredentialsExpired { .. } => "credentials_expired",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::Baseline { .. } => "baseline",
            Self::Changed { .. } => "changed",
            Self::Unchanged { .. } => "unchanged",
        }
    }

    /// Get a human-readable description of the outcome.
    pub fn description(&self) -> String {
        match self {
            Self::CredentialsMissing { reason } => format!("credentials unavailable: {}", reason),
            Self::CredentialsExpired { resolved_url } => {
                format!("redirected to login page: {}", resolved_url)
            }
            Self::FetchFailed { reason } => format!("fetch failed: {}", reason),
            Self::Baseline {
                fingerprint,
                region,
            } => format!("baseline {} from {}", fingerprint.short(), region),
            Self::Changed {
                previous,
                current,
                region,
            } => format!(
                "content changed {} -> {} ({})",
                previous.short(),
                current.short(),
                region
            ),
            Self::Unchanged { fingerprint } => format!("unchanged {}", fingerprint.short()),
        }
    }
}
