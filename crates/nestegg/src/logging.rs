use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log file name prefix inside the log directory
const LOG_FILE_PREFIX: &str = "nestegg.log";

/// Filter used when `RUST_LOG` is not set
fn default_filter(level: &str) -> String {
    format!("nestegg={level},nestegg_core={level}")
}

/// Initialize logging to stderr and, when `log_dir` is given, to a daily
/// rolling file `{log_dir}/nestegg.log.YYYY-MM-DD`.
///
/// The log level can be controlled via the `level` parameter or the `RUST_LOG`
/// environment variable.
pub fn init_logging(log_dir: Option<&Path>, level: &str) -> color_eyre::Result<()> {
    let file_layer = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            Some(
                fmt::layer()
                    .with_writer(appender)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(false),
            )
        }
        None => None,
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(file_layer)
        .try_init()?;

    tracing::info!(
        log_dir = log_dir.map(|d| d.display().to_string()),
        "Nestegg logging initialized"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_both_crates() {
        assert_eq!(default_filter("debug"), "nestegg=debug,nestegg_core=debug");
    }
}
