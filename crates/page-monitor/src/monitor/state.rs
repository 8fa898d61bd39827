//! Monitor state carried between cycles.

use crate::fingerprint::Fingerprint;

/// The last fingerprint observed by a successful cycle.
///
/// Starts unset. Lives in memory only; a restart begins with a fresh
/// baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorState {
    last: Option<Fingerprint>,
}

impl MonitorState {
    /// A state with no prior observation.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fingerprint(fingerprint: Fingerprint) -> Self {
        Self {
            last: Some(fingerprint),
        }
    }

    #[inline]
    pub fn is_unset(&self) -> bool {
        self.last.is_none()
    }

    #[inline]
    pub fn fingerprint(&self) -> Option<Fingerprint> {
        self.last
    }
}
