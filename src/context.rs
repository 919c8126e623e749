use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

/// per-run ambient state, fixed at start-up
///
/// every pipeline stage takes a `&RunContext` instead of reaching for
/// globals. lines always go to the tracing sink; `display` additionally
/// echoes them to the interactive output.
#[derive(Clone, Debug, Default)]
pub struct RunContext {
    debug: bool,
    quiet: bool,
    log_path: Option<PathBuf>,
}

impl RunContext {
    pub fn new(debug: bool, log_path: Option<PathBuf>) -> Self {
        Self {
            debug,
            quiet: false,
            log_path,
        }
    }

    /// context that never echoes to the terminal (used by tests and library callers)
    pub fn quiet() -> Self {
        Self {
            debug: false,
            quiet: true,
            log_path: None,
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// informational line
    pub fn note(&self, display: bool, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!("{}", message);
        if display && !self.quiet {
            println!("{}", message);
        }
    }

    /// error line for a recoverable failure
    pub fn fail(&self, display: bool, message: impl AsRef<str>) {
        let message = message.as_ref();
        error!("{}", message);
        if display && !self.quiet {
            eprintln!("{}", message);
        }
    }

    /// diagnostic line, echoed only in debug mode
    pub fn trace(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        debug!("{}", message);
        if self.debug && !self.quiet {
            println!("{}", message);
        }
    }
}
