//! Utilities: logging setup (level from -v/-q/--log-level, RUST_LOG override).
//!
//! Everything is written to stderr. stdout belongs to the MCP stdio transport
//! and a stray line there corrupts the protocol stream.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Logging helpers.
pub mod logging {
    use super::*;

    #[derive(clap::ValueEnum, Copy, Clone, Debug, Eq, PartialEq)]
    pub enum LogLevel {
        Error,
        Warn,
        Info,
        Debug,
        Trace,
    }

    impl LogLevel {
        pub fn as_filter(self) -> LevelFilter {
            match self {
                LogLevel::Error => LevelFilter::ERROR,
                LogLevel::Warn => LevelFilter::WARN,
                LogLevel::Info => LevelFilter::INFO,
                LogLevel::Debug => LevelFilter::DEBUG,
                LogLevel::Trace => LevelFilter::TRACE,
            }
        }
    }

    /// Explicit --log-level wins; otherwise -q / -v / -vv.
    pub fn derive_level(explicit: Option<LogLevel>, verbose: u8, quiet: bool) -> LevelFilter {
        if let Some(level) = explicit {
            return level.as_filter();
        }
        if quiet {
            return LevelFilter::ERROR;
        }
        match verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Install the global subscriber. `RUST_LOG`, when set, replaces the
    /// derived level entirely.
    pub fn init_logging(level: LevelFilter) -> Result<()> {
        let filter = EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy();
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))
    }
}

pub use logging::{LogLevel, derive_level, init_logging};

/// Captures formatted log output for assertions. Install with
/// `tracing::subscriber::set_default` so it only affects the current thread.
#[cfg(test)]
pub(crate) mod log_capture {
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl LogCapture {
        pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + use<> {
            let sink = self.clone();
            tracing_subscriber::fmt()
                .with_writer(move || sink.clone())
                .with_ansi(false)
                .with_max_level(tracing::Level::DEBUG)
                .finish()
        }

        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
