//! Log setup for the `dupedirs` binary.
//!
//! `RUST_LOG` wins when set. Otherwise the CLI flags pick the level for this
//! crate's own modules, and everything else stays at `warn`:
//!
//! | flags   | `dupedirs::*` | shows                                        |
//! |---------|---------------|----------------------------------------------|
//! | `-q`    | error         | failures only                                |
//! | default | info          | roots, totals, interruptions                 |
//! | `-v`    | debug         | skipped files, hashing phase counts, config  |
//! | `-vv`   | trace         | every directory walked (`Processing: ...`)   |
//!
//! Lines are tagged with the module that logged them, without the crate
//! prefix (`scanner::walker`, `duplicates::engine`).

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Install the global logger.
///
/// Only the first call in a process takes effect; later calls are ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    if std::env::var_os("RUST_LOG").is_some() {
        builder.parse_default_env();
    } else {
        builder
            .filter_level(LevelFilter::Warn)
            .filter_module(CRATE_TARGET, determine_level(verbose, quiet));
    }

    let timestamps = verbose > 0;
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let module = component(record.target());
        if timestamps {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{module}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{style}{:<5}{style:#} [{module}] {}",
                record.level(),
                record.args()
            )
        }
    });

    if builder.try_init().is_ok() {
        log::debug!("Logging at {:?}", log::max_level());
    }
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Module path relative to this crate; foreign targets are kept whole.
fn component(target: &str) -> &str {
    match target.strip_prefix(CRATE_TARGET) {
        Some("") => CRATE_TARGET,
        Some(rest) => rest.strip_prefix("::").unwrap_or(target),
        None => target,
    }
}
