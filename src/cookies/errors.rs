/// Errors from the browser cookie store layer.
use std::path::PathBuf;

use thiserror::Error;

/// Typed errors from reading a browser cookie store.
#[derive(Debug, Error)]
pub enum CookieStoreError {
    /// No user configuration directory could be determined (no `HOME`/`APPDATA`).
    #[error("Cannot locate the user configuration directory")]
    NoConfigDir,

    /// The cookie store file does not exist.
    #[error("Cookie store not found at '{}'", path.display())]
    NotFound {
        /// The path that was looked up.
        path: PathBuf,
    },

    /// The cookie store exists but could not be opened.
    #[error("Cannot open cookie store at '{}': {source}", path.display())]
    Unreadable {
        /// The path that failed to open.
        path: PathBuf,
        /// Underlying SQLite error.
        source: rusqlite::Error,
    },

    /// The store opened but querying it failed (locked, not a cookie database, ...).
    #[error("Cannot read cookies: {0}")]
    Query(#[from] rusqlite::Error),
}

/// Why a single encrypted cookie could not be decrypted. Never fatal: the cookie is skipped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecryptError {
    /// The value does not start with `v10` or `v11`.
    #[error("unknown encryption version")]
    UnknownVersion,

    /// No key is available for this version on this platform.
    #[error("no key available for {version} cookies")]
    NoKey {
        /// Version prefix of the encrypted value.
        version: &'static str,
    },

    /// Decryption failed, usually because the key is wrong.
    #[error("decryption failed (wrong safe storage password?)")]
    BadCiphertext,

    /// The plaintext is not valid UTF-8.
    #[error("decrypted value is not UTF-8")]
    NotUtf8,
}
