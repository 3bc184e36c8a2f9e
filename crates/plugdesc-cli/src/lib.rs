//! plugdesc library - expose modules for testing
//!
//! This library exposes the CLI building blocks so they can be tested
//! without spawning the binary.

pub mod commands;
pub mod common;
pub mod messager;
pub mod snapshot_loader;

pub use common::GlobalOpts;
pub use plugdesc_logger as logger;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route `tracing` events from the library crates to stderr.
///
/// Call after the logger is initialized; the level follows its verbosity.
/// `RUST_LOG` wins over the verbosity flags when set.
pub fn init_tracing() {
    let level = logger::verbosity_to_filter();
    let default_filter = format!("plugdesc={level},plugdesc_manifest={level}");

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init();
}
