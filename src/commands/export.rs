/// `export` command: resolve credentials, fetch, decode, print.
use std::io::{self, BufWriter};

use tracing::debug;

use crate::cli::output::DebugTimer;
use crate::cli::{Cli, OutputCtx, write_report};
use crate::cookies::{ChromeCookieStore, CookieDecryptor, Credential, default_cookies_path};
use crate::viseca::{API_HOST, ExportError, TransactionFetcher, decode};

/// Run the export for the card named in `args`.
///
/// Nothing is written to stdout unless the fetch and decode both succeed.
///
/// # Errors
///
/// Returns `ExportError` from whichever stage fails first.
pub fn run(args: &Cli, ctx: &OutputCtx) -> Result<(), ExportError> {
    let t_credential = DebugTimer::start("resolve_credential");
    let credential = resolve_credential(args)?;
    drop(t_credential);

    let t_fetch = DebugTimer::start("fetch");
    let body = TransactionFetcher::new(credential)?.fetch(&args.card_id)?;
    drop(t_fetch);

    let t_decode = DebugTimer::start("decode");
    let transactions = decode(&body)?;
    drop(t_decode);
    debug!(count = transactions.transactions.len(), "decoded transactions");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_report(&mut out, &transactions, ctx)?;
    Ok(())
}

/// Pick the credential for this run: the literal cookie, or cookies from the browser store.
///
/// # Errors
///
/// - `ExportError::Credential` — the browser cookie store is missing or unreadable
/// - `ExportError::Usage` — manual mode without a session cookie
pub fn resolve_credential(args: &Cli) -> Result<Credential, ExportError> {
    if args.auto_cookies {
        let path = match &args.cookies_file {
            Some(path) => path.clone(),
            None => default_cookies_path()?,
        };
        let decryptor = CookieDecryptor::for_platform(args.safe_storage_password.clone());
        let store = ChromeCookieStore::open(&path, decryptor)?;
        return Ok(Credential::from_source(&store, API_HOST)?);
    }

    args.session_cookie
        .clone()
        .map(Credential::SessionCookie)
        .ok_or_else(|| ExportError::Usage("a session cookie is required without -a".to_owned()))
}
