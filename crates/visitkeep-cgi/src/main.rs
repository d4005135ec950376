//! visitkeep-cgi: serves one session visit per CGI invocation.
//!
//! Reads `HTTP_COOKIE` and `DOCUMENT_ROOT`, loads `visitkeep.toml` from the
//! working directory, and writes CGI headers plus a JSON body to stdout.
//! Logs go to stderr (`VISITKEEP_LOG`).

mod offline;
mod response;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use visitkeep_core::errors::SessionError;
use visitkeep_core::tracing_setup::init_tracing;
use visitkeep_core::{ISessionStore, VisitkeepConfig};
use visitkeep_session::SessionManager;
use visitkeep_storage::open_store;

use offline::OfflineStore;
use response::{render_failure, render_response};

/// The CGI variables this wrapper reads.
struct CgiRequest {
    http_cookie: Option<String>,
    document_root: Option<PathBuf>,
}

impl CgiRequest {
    fn from_env() -> Self {
        Self {
            http_cookie: std::env::var("HTTP_COOKIE").ok(),
            document_root: std::env::var_os("DOCUMENT_ROOT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }
}

fn main() -> ExitCode {
    init_tracing();
    let request = CgiRequest::from_env();

    let (output, code) = match serve(&request) {
        Ok(output) => (output, ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "request failed");
            (render_failure(&e.to_string()), ExitCode::FAILURE)
        }
    };

    let mut stdout = std::io::stdout().lock();
    if stdout
        .write_all(output.as_bytes())
        .and_then(|()| stdout.flush())
        .is_err()
    {
        return ExitCode::FAILURE;
    }
    code
}

fn serve(request: &CgiRequest) -> anyhow::Result<String> {
    let root = std::env::current_dir().context("resolving working directory")?;
    let config = VisitkeepConfig::load(&root).context("loading visitkeep configuration")?;
    let dir = config.store_dir(&root, request.document_root.as_deref());

    let store: Arc<dyn ISessionStore> = match open_store(&config.store, &dir) {
        Ok(store) => store,
        Err(SessionError::StorageUnavailable(e)) => {
            tracing::warn!(dir = %dir.display(), error = %e, "session store failed to open");
            Arc::new(OfflineStore::new(e))
        }
        Err(e) => return Err(e).context("opening session store"),
    };

    let manager = SessionManager::from_config(store, &config);
    let outcome = manager
        .visit_or_degrade(request.http_cookie.as_deref())
        .context("serving session visit")?;
    Ok(render_response(&outcome))
}
