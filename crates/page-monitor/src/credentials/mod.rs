//! Credential management.
//!
//! Credentials are session cookies exported from a browser after an
//! interactive login. They are loaded on every cycle so a fresh export is
//! picked up without restarting the process.
//!
//! - [`CookieRecord`]: one exported cookie
//! - [`CredentialBundle`]: ordered cookie records with host scoping
//! - [`CredentialSource`]: where bundles come from
//! - [`JsonFileCredentialSource`]: a JSON cookie export on disk

mod error;
mod source;
mod types;

pub use error::CredentialError;
pub use source::{CredentialSource, JsonFileCredentialSource};
pub use types::{CookieRecord, CredentialBundle};
