//! Change monitor.
//!
//! The monitor is responsible for:
//! - Loading the credential bundle for each cycle
//! - Fetching the target page with a bounded timeout
//! - Detecting redirects to the login page (expired cookies)
//! - Selecting, normalizing and fingerprinting the content region
//! - Comparing against the caller-owned [`MonitorState`]

mod detector;
mod outcome;
mod state;

pub use detector::{AuthRedirect, ChangeMonitor, DEFAULT_AUTH_REDIRECT_PATTERN, MonitorConfig};
pub use outcome::CheckOutcome;
pub use state::MonitorState;
