use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber.
///
/// `logfile` is `"stdout"` for human-readable output on stdout, or a path
/// that JSON lines are appended to. `RUST_LOG` overrides the default filter.
pub fn init_logging(logfile: &str, debug: bool) -> std::io::Result<()> {
    let default_filter = if debug {
        "cinetrack=debug,tower_http=debug"
    } else {
        "cinetrack=info,tower_http=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);

    if logfile == "stdout" || logfile.is_empty() {
        registry.with(fmt::layer()).init();
    } else {
        let file = OpenOptions::new().create(true).append(true).open(logfile)?;
        registry
            .with(fmt::layer().json().with_ansi(false).with_writer(Mutex::new(file)))
            .init();
    }

    Ok(())
}
