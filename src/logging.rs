//! Structured logging setup.
//!
//! `VIBEC_DEBUG=1` raises the default filter from `info` to `debug`; an
//! explicit `RUST_LOG` always wins, matching the precedence operators
//! expect from an env-filter based subscriber.
use tracing_subscriber::{fmt, EnvFilter};

pub fn init() {
    let default_level = if std::env::var("VIBEC_DEBUG").as_deref() == Ok("1") {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt().with_env_filter(filter).with_target(false).init();
}
