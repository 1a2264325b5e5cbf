//! Tracing setup.

use std::sync::OnceLock;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber once per process. Logs go to stderr.
///
/// `RUST_LOG` overrides the level, which is otherwise `info` when `verbose`
/// and `warn` if not. `FIGCUI_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing(verbose: bool) {
    TRACING_INIT.get_or_init(|| {
        let default_level = if verbose { "info" } else { "warn" };
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        let json = std::env::var("FIGCUI_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let result = if json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .try_init()
        };

        if let Err(err) = result {
            eprintln!("tracing init skipped: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::init_tracing;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing(false);
        init_tracing(true);
    }
}
