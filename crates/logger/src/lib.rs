use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the settings provide one.
pub const DEFAULT_FILTER: &str = "info";

/// Builds the filter from `RUST_LOG`, falling back to `fallback`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Sets up the global `tracing` subscriber writing to stderr.
///
/// Stdout stays reserved for extracted records. Calling it a second time is a
/// no-op and returns `false`.
pub fn init(fallback: &str) -> bool {
    let installed = fmt()
        .with_env_filter(env_filter(fallback))
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!("Logging setup complete.");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_fallback_uses_default() {
        let filter = env_filter("excel_table=[");
        assert!(!filter.to_string().is_empty());
    }

    #[test]
    fn test_second_init_is_noop() {
        init("debug");
        assert!(!init("debug"));
    }
}
