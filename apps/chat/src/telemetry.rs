//! Logging setup for the `chat` binary.

use tracing::dispatcher;
use tracing_subscriber::EnvFilter;

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogOutput {
    /// Human readable lines on stderr.
    Stderr,
    /// Nothing; used while the terminal UI owns the screen.
    Off,
}

/// Install the global subscriber once.
///
/// `RUST_LOG` wins over `default_directive` when set.
pub fn init_once(default_directive: &str, output: LogOutput) {
    // Skip init if has been set
    if dispatcher::has_been_set() || output == LogOutput::Off {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
