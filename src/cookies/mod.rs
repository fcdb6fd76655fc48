/// Browser cookie extraction: credential sources and the cookie jar handed to the HTTP client.
pub mod chrome;
pub mod credential;
pub mod decrypt;
pub mod errors;

pub use chrome::{ChromeCookieStore, default_cookies_path};
pub use credential::Credential;
pub use decrypt::CookieDecryptor;
pub use errors::CookieStoreError;
