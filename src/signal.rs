//! Ctrl+C handling.
//!
//! A single `AtomicBool` is shared by the walker and the hashing pool. Both
//! poll it between files and stop early once it is set. The pipeline will not
//! start deleting after that, and the CLI exits with [`EXIT_CODE_INTERRUPTED`].

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// 128 + SIGINT.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether Ctrl+C was pressed or [`request_shutdown`](Self::request_shutdown) called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Set the flag by hand.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Flag to hand to [`Walker`](crate::scanner::Walker) and
    /// [`IndexConfig`](crate::duplicates::IndexConfig).
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error installing the Ctrl+C hook.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// `ctrlc` refused the handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// Repeated calls return the already installed handler with its flag reset.
/// If another hook owns SIGINT, an unhooked handler is returned instead so
/// that callers can still request shutdown manually.
///
/// # Errors
///
/// Currently always succeeds; the `Result` leaves room for platforms where
/// the fallback is not acceptable.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    // A second Ctrl+C exits at once; a prompt blocked on stdin never polls the flag.
    let installed = ctrlc::set_handler(move || {
        let mut stderr = std::io::stderr();
        if flag.swap(true, Ordering::SeqCst) {
            let _ = writeln!(stderr, "\nInterrupted.");
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
        let _ = writeln!(stderr, "\nInterrupted. Stopping... (press Ctrl+C again to quit)");
        let _ = stderr.flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(handler)
        }
        Err(e) => {
            log::debug!("Ctrl+C hook unavailable ({e}), using unhooked handler");
            let fallback = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new);
            fallback.reset();
            Ok(fallback.clone())
        }
    }
}
