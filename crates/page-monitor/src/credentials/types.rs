//! Core credential types.

use serde::{Deserialize, Serialize};
use url::Url;

/// A single exported browser cookie.
///
/// Browser export extensions emit many more fields (`path`, `secure`,
/// `expirationDate`, ...); only the three needed to replay the session are
/// kept and the rest are ignored during deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    pub name: String,
    pub value: String,
    /// Domain scope, e.g. `.example.org` or `www.example.org`.
    pub domain: String,
}

impl CookieRecord {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: domain.into(),
        }
    }

    /// Check whether this cookie is in scope for `host`.
    ///
    /// A leading dot is ignored; a domain matches itself and any subdomain.
    /// An empty domain matches no host.
    pub fn matches_host(&self, host: &str) -> bool {
        let domain = self.domain.trim().trim_start_matches('.');
        if domain.is_empty() {
            return false;
        }

        let host = host.trim_end_matches('.');
        if host.eq_ignore_ascii_case(domain) {
            return true;
        }

        let Some(dot) = host.len().checked_sub(domain.len() + 1) else {
            return false;
        };
        host.as_bytes()[dot] == b'.'
            && host
                .get(dot + 1..)
                .is_some_and(|suffix| suffix.eq_ignore_ascii_case(domain))
    }
}

/// Ordered collection of cookie records used to authenticate a fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialBundle {
    cookies: Vec<CookieRecord>,
}

impl CredentialBundle {
    pub fn new(cookies: Vec<CookieRecord>) -> Self {
        Self { cookies }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn cookies(&self) -> &[CookieRecord] {
        &self.cookies
    }

    /// Cookies in scope for `url`, in bundle order.
    pub fn cookies_for<'a>(&'a self, url: &'a Url) -> impl Iterator<Item = &'a CookieRecord> + 'a {
        let host = url.host_str().unwrap_or_default();
        self.cookies
            .iter()
            .filter(move |cookie| cookie.matches_host(host))
    }

    /// Build a `Cookie` header value for `url`.
    ///
    /// Returns `None` if no cookie is in scope. A repeated name keeps its
    /// first position and takes the last value.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(self.cookies.len());
        for cookie in self.cookies_for(url) {
            if cookie.name.is_empty() {
                continue;
            }
            match pairs.iter_mut().find(|(name, _)| *name == cookie.name) {
                Some(pair) => pair.1 = &cookie.value,
                None => pairs.push((&cookie.name, &cookie.value)),
            }
        }

        if pairs.is_empty() {
            return None;
        }

        // Rough capacity estimate to avoid repeated growth.
        let mut header = String::with_capacity(
            pairs
                .iter()
                .map(|(name, value)| name.len() + 1 + value.len() + 2)
                .sum(),
        );
        for (name, value) in pairs {
            if !header.is_empty() {
                header.push_str("; ");
            }
            header.push_str(name);
            header.push('=');
            header.push_str(value);
        }

        Some(header)
    }
}

impl From<Vec<CookieRecord>> for CredentialBundle {
    fn from(cookies: Vec<CookieRecord>) -> Self {
        Self::new(cookies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_matches_host_exact_and_subdomain() {
        let cookie = CookieRecord::new("MoodleSession", "abc", ".moodle.example.org");
        assert!(cookie.matches_host("moodle.example.org"));
        assert!(cookie.matches_host("presencial.moodle.example.org"));
        assert!(cookie.matches_host("PRESENCIAL.Moodle.Example.org"));
        assert!(!cookie.matches_host("example.org"));
        assert!(!cookie.matches_host("evilmoodle.example.org"));
    }

    #[test]
    fn test_matches_host_empty_domain_matches_nothing() {
        let cookie = CookieRecord::new("a", "1", "");
        assert!(!cookie.matches_host("anything.test"));
        assert!(!CookieRecord::new("a", "1", ".").matches_host("example.org"));

        let bundle = CredentialBundle::new(vec![cookie]);
        assert!(bundle.cookie_header(&url("https://evil.example.com/")).is_none());
    }

    #[test]
    fn test_cookie_header_scoped_to_host() {
        let bundle = CredentialBundle::new(vec![
            CookieRecord::new("MoodleSession", "abc", "presencial.moodle.example.org"),
            CookieRecord::new("other", "zzz", "unrelated.test"),
            CookieRecord::new("MOODLEID1_", "xyz", ".example.org"),
        ]);

        let header = bundle
            .cookie_header(&url("https://presencial.moodle.example.org/mod/view.php?id=1"))
            .unwrap();
        assert_eq!(header, "MoodleSession=abc; MOODLEID1_=xyz");
    }

    #[test]
    fn test_cookie_header_none_when_out_of_scope() {
        let bundle =
            CredentialBundle::new(vec![CookieRecord::new("a", "1", "unrelated.test")]);
        assert!(bundle.cookie_header(&url("https://example.org/")).is_none());
    }

    #[test]
    fn test_cookie_header_duplicate_name_last_value_wins() {
        let bundle = CredentialBundle::new(vec![
            CookieRecord::new("s", "old", "example.org"),
            CookieRecord::new("t", "1", "example.org"),
            CookieRecord::new("s", "new", "example.org"),
        ]);
        assert_eq!(
            bundle.cookie_header(&url("http://example.org/")).as_deref(),
            Some("s=new; t=1")
        );
    }

    #[test]
    fn test_deserialize_browser_export_ignores_extra_fields() {
        let json = r#"[
            {
                "domain": ".example.org",
                "expirationDate": 1767225600.5,
                "hostOnly": false,
                "httpOnly": true,
                "name": "MoodleSession",
                "path": "/",
                "secure": true,
                "value": "abc123"
            }
        ]"#;
        let bundle: CredentialBundle = serde_json::from_str(json).unwrap();
        assert_eq!(bundle.len(), 1);
        assert_eq!(
            bundle.cookies()[0],
            CookieRecord::new("MoodleSession", "abc123", ".example.org")
        );
    }
}
