#![deny(
    trivial_numeric_casts,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    unused_extern_crates,
    unused_results
)]
#![warn(rust_2021_compatibility, unreachable_pub)]

//! Process-wide `tracing` setup for the `apps/edge` and `apps/central`
//! binaries.
//!
//! The teacher's own binaries (see its `thread_per_core_engine_example`/
//! `multithread_engine_example`) wire a `FmtSubscriber` hardcoded to
//! `Level::INFO` directly in `main`. Both OEE binaries instead go through
//! [`init`], which layers an [`tracing_subscriber::EnvFilter`] on top so
//! operators can raise verbosity per module via `RUST_LOG` without a
//! rebuild, falling back to `info` when the variable is unset or invalid.

use tracing_subscriber::{fmt, EnvFilter};

/// The filter directive applied when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info";

/// Errors returned when the global subscriber cannot be installed.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// A global subscriber was already installed (e.g. by a test harness).
    #[error("global tracing subscriber already set: {0}")]
    AlreadySet(String),
}

/// Installs a global `tracing` subscriber that writes formatted logs to
/// stderr, filtered by `RUST_LOG` (defaulting to [`DEFAULT_FILTER`]).
///
/// Call once, as early as possible in `main`.
pub fn init() -> Result<(), Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = fmt::Subscriber::builder().with_env_filter(filter).finish();

    tracing::subscriber::set_global_default(subscriber).map_err(|err| Error::AlreadySet(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
