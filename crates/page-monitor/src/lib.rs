//! Change detection for a single authenticated web page.
//!
//! A check cycle loads exported browser cookies, fetches the page, picks a
//! content region out of the HTML, fingerprints its text and compares the
//! result against the previously observed fingerprint.
//!
//! # Architecture
//!
//! - [`credentials`]: cookie records and the file-backed credential source
//! - [`fetch`]: authenticated HTTP fetch with a bounded timeout
//! - [`extract`]: prioritized region selection and text normalization
//! - [`fingerprint`]: fixed-size digest over normalized text
//! - [`monitor`]: the check cycle, its state and outcome taxonomy
//!
//! The crate never loops or sleeps; scheduling belongs to the caller.

pub mod credentials;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod fingerprint;
pub mod monitor;

pub use credentials::{CookieRecord, CredentialBundle, CredentialError, CredentialSource};
pub use error::{Error, Result};
pub use extract::{ExtractedRegion, RegionMarker, RegionSelector, RegionSource};
pub use fetch::{FetchError, FetchResult, HttpFetcher, HttpFetcherConfig, PageFetcher};
pub use fingerprint::Fingerprint;
pub use monitor::{AuthRedirect, ChangeMonitor, CheckOutcome, MonitorConfig, MonitorState};
