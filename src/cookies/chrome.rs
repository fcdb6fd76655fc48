/// Chrome's on-disk cookie database (`Cookies`, a SQLite file).
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OpenFlags};
use tracing::{debug, warn};

use super::credential::{BrowserCookie, CredentialSource, domain_matches};
use super::decrypt::CookieDecryptor;
use super::errors::CookieStoreError;

/// Profile-relative locations of the cookie database, newest layout first.
const PROFILE_COOKIE_FILES: [&str; 2] = ["Network/Cookies", "Cookies"];

const CHROME_PROFILE_DIR: &str = "Google/Chrome/Default";

const COOKIE_QUERY: &str = "SELECT host_key, name, value, path, is_secure, encrypted_value, expires_utc \
     FROM cookies ORDER BY host_key, name";

const META_VERSION_QUERY: &str = "SELECT CAST(value AS INTEGER) FROM meta WHERE key = 'version'";

/// From this schema version on, decrypted values start with a SHA-256 of the host.
const DOMAIN_HASH_META_VERSION: i64 = 24;

/// Seconds between 1601-01-01 (Chrome's time base) and the Unix epoch.
const WINDOWS_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Reads cookies from a Chrome-family profile.
pub struct ChromeCookieStore {
    connection: Connection,
    decryptor: CookieDecryptor,
}

impl ChromeCookieStore {
    /// Open the cookie database at `path` as an immutable snapshot.
    ///
    /// The file is opened through an `immutable=1` URI so SQLite takes no
    /// locks and a running Chrome holding the database does not block us.
    ///
    /// # Errors
    ///
    /// - `CookieStoreError::NotFound` — no file at `path`
    /// - `CookieStoreError::Unreadable` — SQLite refused to open it
    pub fn open(path: &Path, decryptor: CookieDecryptor) -> Result<Self, CookieStoreError> {
        if !path.is_file() {
            return Err(CookieStoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let uri = immutable_uri(path);
        debug!(%uri, "opening cookie store");
        let connection = Connection::open_with_flags(
            &uri,
            OpenFlags::SQLITE_OPEN_READ_ONLY
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| CookieStoreError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_connection(connection, decryptor))
    }

    /// Wrap an already open connection.
    #[must_use]
    pub fn from_connection(connection: Connection, decryptor: CookieDecryptor) -> Self {
        Self {
            connection,
            decryptor,
        }
    }

    /// Schema version from the `meta` table, 0 when absent.
    fn meta_version(&self) -> i64 {
        match self
            .connection
            .query_row(META_VERSION_QUERY, [], |row| row.get::<_, Option<i64>>(0))
        {
            Ok(version) => version.unwrap_or(0),
            Err(err) => {
                debug!("no cookie schema version: {err}");
                0
            }
        }
    }
}

struct CookieRow {
    cookie: BrowserCookie,
    encrypted: Vec<u8>,
    expires_utc: i64,
}

impl CredentialSource for ChromeCookieStore {
    /// Unexpired cookies whose host matches `domain`, decrypted where needed.
    ///
    /// A cookie that cannot be decrypted is skipped with a warning.
    fn cookies_for_domain(&self, domain: &str) -> Result<Vec<BrowserCookie>, CookieStoreError> {
        let strip_domain_hash = self.meta_version() >= DOMAIN_HASH_META_VERSION;
        let now = chrome_now();

        let mut statement = self.connection.prepare(COOKIE_QUERY)?;
        let rows = statement.query_map([], |row| {
            Ok(CookieRow {
                cookie: BrowserCookie {
                    host: row.get(0)?,
                    name: row.get(1)?,
                    value: row.get(2)?,
                    path: row.get(3)?,
                    secure: row.get::<_, i64>(4)? != 0,
                },
                encrypted: row.get::<_, Option<Vec<u8>>>(5)?.unwrap_or_default(),
                expires_utc: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
            })
        })?;

        let mut cookies = Vec::new();
        for row in rows {
            let CookieRow {
                mut cookie,
                encrypted,
                expires_utc,
            } = row?;
            if !domain_matches(&cookie.host, domain) {
                continue;
            }
            if is_expired(expires_utc, now) {
                debug!(name = %cookie.name, host = %cookie.host, "skipping expired cookie");
                continue;
            }
            if cookie.value.is_empty() && !encrypted.is_empty() {
                match self.decryptor.decrypt(&encrypted, strip_domain_hash) {
                    Ok(value) => cookie.value = value,
                    Err(err) => {
                        warn!(
                            name = %cookie.name,
                            host = %cookie.host,
                            "skipping cookie: {err}; pass the session cookie on the command line instead"
                        );
                        continue;
                    }
                }
            }
            cookies.push(cookie);
        }

        debug!(domain, count = cookies.len(), "matched browser cookies");
        Ok(cookies)
    }
}

/// `expires_utc` of 0 marks a session cookie, which never expires here.
fn is_expired(expires_utc: i64, now: i64) -> bool {
    expires_utc > 0 && expires_utc <= now
}

/// Current time in Chrome's format: microseconds since 1601-01-01 UTC.
fn chrome_now() -> i64 {
    let since_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX));
    since_unix.saturating_add(WINDOWS_EPOCH_OFFSET_SECS * 1_000_000)
}

/// SQLite URI opening `path` read-only without locking.
fn immutable_uri(path: &Path) -> String {
    let mut raw = path.to_string_lossy().replace('\\', "/");
    if cfg!(windows) && !raw.starts_with('/') {
        raw.insert(0, '/');
    }
    let mut uri = String::with_capacity(raw.len() + 20);
    uri.push_str("file:");
    for c in raw.chars() {
        match c {
            '%' => uri.push_str("%25"),
            '?' => uri.push_str("%3f"),
            '#' => uri.push_str("%23"),
            _ => uri.push(c),
        }
    }
    uri.push_str("?immutable=1");
    uri
}

/// Locate the default Chrome profile's cookie database.
///
/// Prefers the current `Default/Network/Cookies` layout and falls back to the
/// legacy `Default/Cookies`. When neither exists the legacy path is returned so
/// that opening it reports a useful error.
///
/// # Errors
///
/// Returns `CookieStoreError::NoConfigDir` if no configuration directory is known.
pub fn default_cookies_path() -> Result<PathBuf, CookieStoreError> {
    let profile = user_config_dir()?.join(CHROME_PROFILE_DIR);
    let candidates = PROFILE_COOKIE_FILES.map(|file| profile.join(file));
    Ok(candidates
        .iter()
        .find(|path| path.is_file())
        .unwrap_or(&candidates[1])
        .clone())
}

/// Platform configuration directory (`~/.config`, `~/Library/Application Support`, `%APPDATA%`).
fn user_config_dir() -> Result<PathBuf, CookieStoreError> {
    let non_empty = |key: &str| std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);

    let dir = if cfg!(windows) {
        non_empty("APPDATA")
    } else if cfg!(target_os = "macos") {
        non_empty("HOME").map(|home| home.join("Library/Application Support"))
    } else {
        non_empty("XDG_CONFIG_HOME").or_else(|| non_empty("HOME").map(|home| home.join(".config")))
    };
    dir.ok_or(CookieStoreError::NoConfigDir)
}
