/// Session credentials: a literal cookie header or a jar populated from a browser store.
use std::sync::Arc;

use reqwest::Url;
use reqwest::cookie::Jar;
use tracing::{debug, warn};

use super::errors::CookieStoreError;

/// One cookie as stored by a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserCookie {
    /// Host key as stored by the browser. A leading `.` marks a domain cookie.
    pub host: String,
    pub name: String,
    pub value: String,
    pub path: String,
    pub secure: bool,
}

impl BrowserCookie {
    /// Render as a `Set-Cookie` header value understood by [`Jar::add_cookie_str`].
    #[must_use]
    pub fn to_set_cookie(&self) -> String {
        let mut header = format!("{}={}; Path={}", self.name, self.value, self.cookie_path());
        if self.host.starts_with('.') {
            header.push_str("; Domain=");
            header.push_str(self.bare_host());
        }
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }

    /// URL the cookie is registered against when loading it into a jar.
    fn origin_url(&self) -> Option<Url> {
        Url::parse(&format!("https://{}{}", self.bare_host(), self.cookie_path())).ok()
    }

    fn bare_host(&self) -> &str {
        self.host.trim_start_matches('.')
    }

    fn cookie_path(&self) -> &str {
        if self.path.is_empty() { "/" } else { &self.path }
    }
}

/// Whether a cookie stored under `cookie_host` would be sent to `host`.
///
/// Matches when the hosts are equal or `host` is a subdomain of the cookie's domain.
#[must_use]
pub fn domain_matches(cookie_host: &str, host: &str) -> bool {
    let domain = cookie_host.trim_start_matches('.');
    if domain.is_empty() {
        return false;
    }
    host.eq_ignore_ascii_case(domain)
        || host
            .len()
            .checked_sub(domain.len() + 1)
            .is_some_and(|dot| {
                host.as_bytes()[dot] == b'.' && host[dot + 1..].eq_ignore_ascii_case(domain)
            })
}

/// A source of browser cookies, e.g. a browser's on-disk cookie database.
pub trait CredentialSource {
    /// Return every cookie that applies to `domain`.
    ///
    /// # Errors
    ///
    /// Returns `CookieStoreError` when the underlying store cannot be read.
    fn cookies_for_domain(&self, domain: &str) -> Result<Vec<BrowserCookie>, CookieStoreError>;
}

/// The credential attached to the single outgoing request.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Sent verbatim as the `Cookie` header.
    SessionCookie(String),
    /// Attached to the HTTP client, which picks the matching cookies itself.
    CookieJar(Arc<Jar>),
}

impl Credential {
    /// Build a cookie jar holding every cookie `source` has for `host`.
    ///
    /// An empty result is not an error: the request is still made and
    /// will be rejected by the API.
    ///
    /// # Errors
    ///
    /// Returns `CookieStoreError` if the source cannot be read.
    pub fn from_source(
        source: &dyn CredentialSource,
        host: &str,
    ) -> Result<Self, CookieStoreError> {
        let cookies = source.cookies_for_domain(host)?;
        if cookies.is_empty() {
            warn!(host, "no browser cookies found; the request will likely be rejected");
        }

        let jar = Jar::default();
        for cookie in &cookies {
            match cookie.origin_url() {
                Some(url) => {
                    debug!(name = %cookie.name, host = %cookie.host, "loading cookie");
                    jar.add_cookie_str(&cookie.to_set_cookie(), &url);
                }
                None => {
                    warn!(name = %cookie.name, host = %cookie.host, "skipping cookie with unusable host");
                }
            }
        }

        Ok(Self::CookieJar(Arc::new(jar)))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::cookie::CookieStore;

    use super::*;

    struct StubSource(Vec<BrowserCookie>);

    impl CredentialSource for StubSource {
        fn cookies_for_domain(&self, domain: &str) -> Result<Vec<BrowserCookie>, CookieStoreError> {
            Ok(self
                .0
                .iter()
                .filter(|c| domain_matches(&c.host, domain))
                .cloned()
                .collect())
        }
    }

    struct FailingSource;

    impl CredentialSource for FailingSource {
        fn cookies_for_domain(&self, _: &str) -> Result<Vec<BrowserCookie>, CookieStoreError> {
            Err(CookieStoreError::NoConfigDir)
        }
    }

    fn cookie(host: &str, name: &str, value: &str) -> BrowserCookie {
        BrowserCookie {
            host: host.to_owned(),
            name: name.to_owned(),
            value: value.to_owned(),
            path: "/".to_owned(),
            secure: true,
        }
    }

    fn api_url() -> Url {
        Url::parse("https://api.one.viseca.ch/v1/card/0123/transactions").unwrap()
    }

    fn jar_of(credential: Credential) -> Arc<Jar> {
        match credential {
            Credential::CookieJar(jar) => jar,
            Credential::SessionCookie(_) => panic!("expected a cookie jar"),
        }
    }

    #[test]
    fn test_domain_matches_exact_and_suffix() {
        assert!(domain_matches("api.one.viseca.ch", "api.one.viseca.ch"));
        assert!(domain_matches(".viseca.ch", "api.one.viseca.ch"));
        assert!(domain_matches(".one.viseca.ch", "api.one.viseca.ch"));
    }

    #[test]
    fn test_domain_matches_rejects_other_hosts() {
        assert!(!domain_matches("other.viseca.ch", "api.one.viseca.ch"));
        assert!(!domain_matches(".viseca.ch", "viseca.ch.example.com"));
        assert!(!domain_matches("eca.ch", "api.one.viseca.ch"));
        assert!(!domain_matches(".", "api.one.viseca.ch"));
    }

    #[test]
    fn test_set_cookie_for_domain_cookie() {
        let c = cookie(".viseca.ch", "AL_SESS-S", "abc");
        assert_eq!(c.to_set_cookie(), "AL_SESS-S=abc; Path=/; Domain=viseca.ch; Secure");
    }

    #[test]
    fn test_set_cookie_for_host_cookie() {
        let mut c = cookie("api.one.viseca.ch", "lang", "de");
        c.secure = false;
        c.path = String::new();
        assert_eq!(c.to_set_cookie(), "lang=de; Path=/");
    }

    #[test]
    fn test_jar_sends_matching_cookies_to_api() {
        let source = StubSource(vec![
            cookie(".viseca.ch", "AL_SESS-S", "abc"),
            cookie("www.example.com", "tracking", "nope"),
        ]);
        let jar = jar_of(Credential::from_source(&source, "api.one.viseca.ch").unwrap());
        let header = jar.cookies(&api_url()).unwrap();
        assert_eq!(header.to_str().unwrap(), "AL_SESS-S=abc");
    }

    #[test]
    fn test_empty_source_still_yields_jar() {
        let jar = jar_of(Credential::from_source(&StubSource(vec![]), "api.one.viseca.ch").unwrap());
        assert!(jar.cookies(&api_url()).is_none());
    }

    #[test]
    fn test_source_error_propagates() {
        let result = Credential::from_source(&FailingSource, "api.one.viseca.ch");
        assert!(matches!(result, Err(CookieStoreError::NoConfigDir)));
    }
}
