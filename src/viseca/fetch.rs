/// The single authenticated GET against the card transactions endpoint.
use reqwest::StatusCode;
use reqwest::blocking::{Client, ClientBuilder, Request};
use reqwest::header::{ACCEPT, COOKIE};
use tracing::debug;

use super::errors::ExportError;
use crate::cookies::Credential;

/// Host the session cookies belong to.
pub const API_HOST: &str = "api.one.viseca.ch";

const API_BASE_URL: &str = "https://api.one.viseca.ch";

const CARD_PATH: &str = "/v1/card/";

/// First page of transactions in any state.
const TRANSACTIONS_QUERY: &str = "/transactions?stateType=unknown&offset=0&pagesize=100";

/// Build the transactions URL for `card_id`. The card id is inserted as-is.
#[must_use]
pub fn transactions_url(base_url: &str, card_id: &str) -> String {
    format!("{base_url}{CARD_PATH}{card_id}{TRANSACTIONS_QUERY}")
}

/// Fetches the raw transactions payload for a card.
pub struct TransactionFetcher {
    client: Client,
    session_cookie: Option<String>,
    base_url: String,
}

impl TransactionFetcher {
    /// Create a fetcher for the live API.
    ///
    /// A cookie jar credential is attached to the client; a session cookie is
    /// sent as an explicit header on each request.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Transport` if the HTTP client cannot be initialised.
    pub fn new(credential: Credential) -> Result<Self, ExportError> {
        Self::build(credential, API_BASE_URL, Client::builder())
    }

    /// Create a fetcher against another base URL (for testing). Proxies are not used.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Transport` if the HTTP client cannot be initialised.
    pub fn with_base_url(credential: Credential, base_url: &str) -> Result<Self, ExportError> {
        Self::build(credential, base_url, Client::builder().no_proxy())
    }

    fn build(
        credential: Credential,
        base_url: &str,
        mut builder: ClientBuilder,
    ) -> Result<Self, ExportError> {
        let session_cookie = match credential {
            Credential::SessionCookie(cookie) => Some(cookie),
            Credential::CookieJar(jar) => {
                builder = builder.cookie_provider(jar);
                None
            }
        };
        let client = builder.build().map_err(ExportError::Transport)?;
        Ok(Self {
            client,
            session_cookie,
            base_url: base_url.to_owned(),
        })
    }

    /// Build, without sending, the GET request for `card_id`.
    ///
    /// # Errors
    ///
    /// Returns `ExportError::Transport` if the URL or a header value is invalid.
    pub fn build_request(&self, card_id: &str) -> Result<Request, ExportError> {
        let mut request = self
            .client
            .get(transactions_url(&self.base_url, card_id))
            .header(ACCEPT, "application/json");
        if let Some(cookie) = &self.session_cookie {
            request = request.header(COOKIE, cookie);
        }
        request.build().map_err(ExportError::Transport)
    }

    /// Perform the request and return the body of a `200 OK` response.
    ///
    /// # Errors
    ///
    /// - `ExportError::Transport` — connection, TLS or body read failure
    /// - `ExportError::RequestFailed` — any status other than 200
    pub fn fetch(&self, card_id: &str) -> Result<Vec<u8>, ExportError> {
        let request = self.build_request(card_id)?;
        debug!(url = %request.url(), "requesting transactions");

        let response = self.client.execute(request).map_err(ExportError::Transport)?;
        check_status(response.status())?;

        let body = response.bytes().map_err(ExportError::Transport)?;
        debug!(bytes = body.len(), "received transactions");
        Ok(body.to_vec())
    }
}

/// Only `200 OK` is accepted.
fn check_status(status: StatusCode) -> Result<(), ExportError> {
    if status == StatusCode::OK {
        Ok(())
    } else {
        Err(ExportError::RequestFailed { status })
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    use super::*;

    const EXPECTED_URL: &str =
        "https://api.one.viseca.ch/v1/card/0123456789ABCDEF/transactions?stateType=unknown&offset=0&pagesize=100";

    /// Serve one canned HTTP response on localhost; the handle yields the raw request head.
    fn serve_once(response: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0_u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                head.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8_lossy(&head).into_owned()
        });
        (base_url, handle)
    }

    fn session(cookie: &str) -> Credential {
        Credential::SessionCookie(cookie.to_owned())
    }

    #[test]
    fn test_url_template() {
        assert_eq!(transactions_url(API_BASE_URL, "0123456789ABCDEF"), EXPECTED_URL);
    }

    #[test]
    fn test_request_with_session_cookie() {
        let fetcher = TransactionFetcher::new(session("AL_SESS-S=abc123")).unwrap();
        let request = fetcher.build_request("0123456789ABCDEF").unwrap();

        assert_eq!(request.method(), &reqwest::Method::GET);
        assert_eq!(request.url().as_str(), EXPECTED_URL);
        assert_eq!(request.headers()[ACCEPT], "application/json");
        assert_eq!(request.headers()[COOKIE], "AL_SESS-S=abc123");
    }

    #[test]
    fn test_request_with_jar_has_no_cookie_header() {
        let jar = std::sync::Arc::new(reqwest::cookie::Jar::default());
        let fetcher = TransactionFetcher::new(Credential::CookieJar(jar)).unwrap();
        let request = fetcher.build_request("0123").unwrap();
        assert!(request.headers().get(COOKIE).is_none());
        assert_eq!(request.headers()[ACCEPT], "application/json");
    }

    #[test]
    fn test_check_status() {
        assert!(check_status(StatusCode::OK).is_ok());
        assert!(matches!(
            check_status(StatusCode::NO_CONTENT),
            Err(ExportError::RequestFailed { status }) if status == StatusCode::NO_CONTENT
        ));
    }

    #[test]
    fn test_fetch_returns_body() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 11\r\nConnection: close\r\n\r\n{\"list\":[]}",
        );
        let fetcher = TransactionFetcher::with_base_url(session("AL_SESS-S=abc"), &base_url).unwrap();

        let body = fetcher.fetch("42").unwrap();
        assert_eq!(body, b"{\"list\":[]}");

        let head = server.join().unwrap().to_lowercase();
        assert!(head.starts_with(
            "get /v1/card/42/transactions?statetype=unknown&offset=0&pagesize=100 http/1.1\r\n"
        ));
        assert!(head.contains("\r\ncookie: al_sess-s=abc\r\n"));
        assert!(head.contains("\r\naccept: application/json\r\n"));
    }

    #[test]
    fn test_fetch_unauthorized() {
        let (base_url, server) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let fetcher = TransactionFetcher::with_base_url(session("expired"), &base_url).unwrap();

        let err = fetcher.fetch("42").unwrap_err();
        server.join().unwrap();
        assert!(matches!(err, ExportError::RequestFailed { status } if status == StatusCode::UNAUTHORIZED));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_fetch_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let fetcher = TransactionFetcher::with_base_url(session("x"), &base_url).unwrap();
        let err = fetcher.fetch("42").unwrap_err();
        assert!(matches!(err, ExportError::Transport(_)));
        assert_eq!(err.exit_code(), 4);
    }
}
