/// CLI argument definitions via clap derive.
use std::path::PathBuf;

use clap::Parser;

/// viseca-export — export Viseca card transactions as semicolon-delimited text.
///
/// Pass the card ID and a session cookie (e.g. `AL_SESS-S=...`), or use `-a`
/// to read the session from the local Chrome cookie store.
#[derive(Debug, Parser)]
#[command(
    name = "viseca-export",
    about = "Export Viseca card transactions as semicolon-delimited text",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Read the session cookie from the local Chrome cookie store.
    #[arg(short = 'a', long = "auto-cookies")]
    pub auto_cookies: bool,

    /// Cookie database to read with `-a` (default: Chrome's default profile).
    #[arg(long, value_name = "PATH", env = "VISECA_COOKIES_FILE")]
    pub cookies_file: Option<PathBuf>,

    /// Chrome "safe storage" password for decrypting cookies with `-a`
    /// (Linux keyring `v11` cookies; overrides the macOS Keychain lookup).
    #[arg(long, value_name = "PASSWORD", env = "VISECA_SAFE_STORAGE_PASSWORD", hide_env_values = true)]
    pub safe_storage_password: Option<String>,

    /// Omit the header row.
    #[arg(long)]
    pub no_header: bool,

    /// Log debug output and stage timings to stderr.
    #[arg(long)]
    pub debug: bool,

    /// Card identifier as used by the Viseca web app.
    #[arg(value_name = "CARD_ID")]
    pub card_id: String,

    /// Session cookie sent verbatim as the `Cookie` header.
    #[arg(
        value_name = "SESSION_COOKIE",
        required_unless_present = "auto_cookies",
        conflicts_with = "auto_cookies"
    )]
    pub session_cookie: Option<String>,
}
