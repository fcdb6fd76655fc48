/// Decryption of Chrome's `encrypted_value` cookie column.
///
/// Chrome on Linux and macOS encrypts cookie values with AES-128-CBC. The key
/// is PBKDF2-HMAC-SHA1 over a "safe storage" password with the salt
/// `saltysalt`, and the IV is sixteen spaces. The ciphertext carries a
/// three-byte version prefix:
///
/// - `v10` on Linux: fixed password `peanuts`, one iteration
/// - `v11` on Linux: password held in the desktop keyring, one iteration
/// - `v10` on macOS: password in the Keychain (`Chrome Safe Storage`), 1003 iterations
///
/// Windows (DPAPI / app-bound encryption) is not supported.
use std::cell::OnceCell;
use std::process::Command;

use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, KeyIvInit};
use sha1::Sha1;
use tracing::{debug, warn};

use super::errors::DecryptError;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

type Key = [u8; 16];

const SALT: &[u8] = b"saltysalt";
const IV: [u8; 16] = [b' '; 16];

const LINUX_V10_PASSWORD: &str = "peanuts";
const LINUX_ITERATIONS: u32 = 1;
const MACOS_ITERATIONS: u32 = 1003;
const MACOS_KEYCHAIN_SERVICE: &str = "Chrome Safe Storage";

/// Length of the SHA-256 host digest prepended to plaintexts since cookie DB version 24.
const DOMAIN_HASH_LEN: usize = 32;

enum KeySource {
    Linux { keyring_password: Option<String> },
    MacOs { password: Option<String> },
    Unsupported,
}

/// Derives keys on first use, so the Keychain is only queried when an
/// encrypted cookie is actually met.
pub struct CookieDecryptor {
    source: KeySource,
    v10: OnceCell<Option<Key>>,
    v11: OnceCell<Option<Key>>,
}

impl CookieDecryptor {
    /// Decryptor for the platform this binary runs on.
    ///
    /// `password` is the safe storage password when known: the keyring
    /// password for `v11` on Linux, or the Keychain entry on macOS.
    #[must_use]
    pub fn for_platform(password: Option<String>) -> Self {
        if cfg!(target_os = "macos") {
            Self::macos(password)
        } else if cfg!(windows) {
            Self::new(KeySource::Unsupported)
        } else {
            Self::linux(password)
        }
    }

    /// Decryptor using the Linux key scheme.
    #[must_use]
    pub fn linux(keyring_password: Option<String>) -> Self {
        Self::new(KeySource::Linux { keyring_password })
    }

    /// Decryptor using the macOS key scheme. Without a password the Keychain is asked.
    #[must_use]
    pub fn macos(password: Option<String>) -> Self {
        Self::new(KeySource::MacOs { password })
    }

    fn new(source: KeySource) -> Self {
        Self {
            source,
            v10: OnceCell::new(),
            v11: OnceCell::new(),
        }
    }

    /// Decrypt one `encrypted_value`.
    ///
    /// With `strip_domain_hash` the leading host digest is removed from the plaintext.
    ///
    /// # Errors
    ///
    /// Returns `DecryptError` for an unknown prefix, a missing key, bad
    /// padding (usually a wrong key) or a non UTF-8 result.
    pub fn decrypt(&self, encrypted: &[u8], strip_domain_hash: bool) -> Result<String, DecryptError> {
        let (version, ciphertext) = match encrypted.split_at_checked(3) {
            Some((b"v10", rest)) => ("v10", rest),
            Some((b"v11", rest)) => ("v11", rest),
            _ => return Err(DecryptError::UnknownVersion),
        };
        let key = self.key(version).ok_or(DecryptError::NoKey { version })?;

        let mut plaintext = Aes128CbcDec::new_from_slices(&key, &IV)
            .map_err(|_| DecryptError::BadCiphertext)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| DecryptError::BadCiphertext)?;

        if strip_domain_hash {
            if plaintext.len() < DOMAIN_HASH_LEN {
                return Err(DecryptError::BadCiphertext);
            }
            plaintext.drain(..DOMAIN_HASH_LEN);
        }
        String::from_utf8(plaintext).map_err(|_| DecryptError::NotUtf8)
    }

    fn key(&self, version: &str) -> Option<Key> {
        let cell = if version == "v10" { &self.v10 } else { &self.v11 };
        *cell.get_or_init(|| self.derive(version))
    }

    fn derive(&self, version: &str) -> Option<Key> {
        match (&self.source, version) {
            (KeySource::Linux { .. }, "v10") => {
                Some(derive_key(LINUX_V10_PASSWORD, LINUX_ITERATIONS))
            }
            (KeySource::Linux { keyring_password }, _) => {
                if keyring_password.is_none() {
                    warn!("v11 cookies need the keyring safe storage password (--safe-storage-password)");
                }
                keyring_password
                    .as_deref()
                    .map(|p| derive_key(p, LINUX_ITERATIONS))
            }
            (KeySource::MacOs { password }, "v10") => password
                .clone()
                .or_else(keychain_password)
                .map(|p| derive_key(&p, MACOS_ITERATIONS)),
            (KeySource::MacOs { .. }, _) => None,
            (KeySource::Unsupported, _) => {
                warn!("encrypted cookies are not supported on this platform");
                None
            }
        }
    }
}

fn derive_key(password: &str, iterations: u32) -> Key {
    let mut key = Key::default();
    pbkdf2::pbkdf2_hmac::<Sha1>(password.as_bytes(), SALT, iterations, &mut key);
    key
}

/// Read Chrome's safe storage password from the macOS Keychain.
fn keychain_password() -> Option<String> {
    debug!(service = MACOS_KEYCHAIN_SERVICE, "reading keychain password");
    let output = Command::new("security")
        .args(["find-generic-password", "-w", "-s", MACOS_KEYCHAIN_SERVICE])
        .output();
    match output {
        Ok(output) if output.status.success() => {
            let password = String::from_utf8_lossy(&output.stdout).trim_end().to_owned();
            Some(password)
        }
        Ok(output) => {
            warn!(status = %output.status, "keychain lookup for Chrome Safe Storage failed");
            None
        }
        Err(err) => {
            warn!("cannot run `security`: {err}");
            None
        }
    }
}
