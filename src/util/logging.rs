use std::path::Path;

use anyhow::Result;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter directives for the given verbosity. `RUST_LOG` overrides them.
pub fn filter_directives(verbose: bool) -> &'static str {
    if verbose {
        "follow_rhythm=debug,warn"
    } else {
        "follow_rhythm=info,warn"
    }
}

/// Initialize the logging system with tracing.
///
/// If `log_dir` is provided, logs will also be written to a daily rolling
/// file in that directory. Logs go to stderr so command output stays clean.
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    let console = fmt::layer().with_target(true).with_writer(std::io::stderr);

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, "follow_rhythm.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The writer must outlive every log call; init_logging runs once.
        std::mem::forget(guard);

        registry
            .with(console)
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .try_init()?;
    } else {
        registry.with(console).try_init()?;
    }

    Ok(())
}
