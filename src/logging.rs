use std::str::FromStr;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `level`; an
/// unparsable `level` falls back to `info`.
pub fn init_logger(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::from_str(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let console = fmt::layer().with_writer(std::io::stderr).with_target(false);

    // A subscriber may already be installed when embedded in another program.
    let _ = tracing_subscriber::registry().with(filter).with(console).try_init();
}
