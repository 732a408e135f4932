//! Subscriber setup for the `docassist` binary.
//!
//! Terminal output goes to stderr so it never mixes with REPL text. With
//! `--log-file` events go to a daily file under the state directory instead.

use config::logging::{init_file_logging, FileLog};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::log_format::SpanPathFormat;

/// `RUST_LOG` wins; otherwise `debug` with `-v`, else `warn`.
fn filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }))
}

/// Installs the global subscriber. The returned [`FileLog`] owns the flush
/// guard and must live until the process exits.
pub fn init(verbose: bool, log_file: bool) -> Result<Option<FileLog>, Box<dyn std::error::Error>> {
    if log_file {
        let log = init_file_logging("docassist")?;
        tracing_subscriber::registry()
            .with(filter(verbose))
            .with(
                tracing_subscriber::fmt::layer()
                    .event_format(SpanPathFormat::new())
                    .with_writer(log.writer.clone())
                    .with_ansi(false),
            )
            .try_init()?;
        tracing::info!(dir = %log.dir.display(), "logging to file");
        Ok(Some(log))
    } else {
        tracing_subscriber::registry()
            .with(filter(verbose))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()?;
        Ok(None)
    }
}
