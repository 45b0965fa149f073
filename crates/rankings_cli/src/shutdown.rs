use console::Term;

/// Exit code for termination by SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Set up the Ctrl+C handler.
///
/// A run has no safe point to stop at short of finishing, so the process
/// exits right away after logging.
pub(crate) fn setup_shutdown_handler() {
    tokio::spawn(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }

        if Term::stderr().is_term() {
            eprintln!("\nInterrupted.");
        }
        tracing::warn!("Stopping due to OS signal");

        std::process::exit(INTERRUPTED_EXIT_CODE);
    });
}
