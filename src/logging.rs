use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr so stdout stays
/// machine-readable.
///
/// Filter precedence: `--verbose` forces `debug`, then `RUST_LOG`, then the
/// configured `log_level`.
pub fn init_tracing(log_level: &str, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(log_level)
                .with_context(|| format!("invalid log level '{}'", log_level))?,
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!("failed to install tracing subscriber: {}", err))
}
