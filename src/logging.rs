use std::io;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default filter for a `-v` count; `RUST_LOG` takes precedence when set.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug,hyper=info,reqwest=info",
        _ => "trace",
    }
}

/// Diagnostics go to stderr so stdout carries only the printed results.
pub fn configure_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    let stderr_log = fmt::layer()
        .with_writer(io::stderr)
        .with_target(verbosity > 1)
        .with_filter(filter);

    tracing_subscriber::registry().with(stderr_log).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_filter(0), "warn");
        assert_eq!(default_filter(1), "info");
        assert!(default_filter(2).starts_with("debug"));
        assert_eq!(default_filter(7), "trace");
        for v in 0..4 {
            EnvFilter::try_new(default_filter(v)).unwrap();
        }
    }
}
