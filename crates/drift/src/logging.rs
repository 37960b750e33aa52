//! Log subscriber setup for binaries and examples.

use tracing_subscriber::EnvFilter;

/// Default filter directive for a run-loop verbosity level.
///
/// 0 → `warn`, 1 → `info`, 2 → `debug`, 3 and above → `trace`.
pub fn directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install a global fmt subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the filter follows
/// [`directive()`]. Calling this more than once leaves the first
/// subscriber in place.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive(verbosity)));
    // a subscriber installed earlier (e.g. by a test harness) wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
