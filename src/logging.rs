//! Logger Setup
//!
//! The library only emits records through the `log` facade. Pipelines that
//! want to see them call [`init_logging`] once at startup.

use std::io::Write;

/// Installs an `env_logger` logger.
///
/// `RUST_LOG` takes precedence; otherwise the level is `debug` when
/// `verbose` is set and `info` otherwise. Warnings and errors carry a level
/// prefix, everything else is printed bare.
///
/// Returns `false` if a logger was already installed.
pub fn init_logging(verbose: bool) -> bool {
    let level = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format(|buf, record| match record.level() {
            log::Level::Warn | log::Level::Error => {
                writeln!(buf, "[{}] {}", record.level(), record.args())
            }
            _ => writeln!(buf, "{}", record.args()),
        })
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging(false);
        assert!(!init_logging(true));
    }
}
