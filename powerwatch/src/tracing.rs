//! Logging setup and the crate-wide tracing prelude.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod prelude {
    pub use ::tracing::{debug, error, info, trace, warn};
}

/// Install the global subscriber.
///
/// The filter comes from `RUST_LOG` (default `info`). With
/// `POWERWATCH_LOG=journald` events go to the systemd journal, falling back
/// to stdout if the journal socket is unavailable.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let journald = std::env::var("POWERWATCH_LOG").is_ok_and(|v| v == "journald");
    if journald {
        match tracing_journald::layer() {
            Ok(layer) => {
                tracing_subscriber::registry().with(filter).with(layer).init();
                return;
            }
            Err(e) => eprintln!("journald unavailable, logging to stdout: {e}"),
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}
