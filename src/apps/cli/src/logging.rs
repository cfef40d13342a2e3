//! Logging Configuration

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

const LOG_LEVEL_ENV: &str = "MASON_LOG_LEVEL";

pub fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}

fn resolve_level(env_value: Option<&str>, is_debug: bool) -> LevelFilter {
    let fallback = if is_debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    match env_value {
        Some(val) => parse_log_level(val).unwrap_or_else(|| {
            eprintln!(
                "Warning: Invalid {} '{}', falling back to default",
                LOG_LEVEL_ENV, val
            );
            fallback
        }),
        None => fallback,
    }
}

/// Installs the stderr subscriber. `log` records from the library crates are
/// forwarded through it.
pub fn init(is_debug: bool) {
    let env_value = std::env::var(LOG_LEVEL_ENV).ok();
    let level = resolve_level(env_value.as_deref(), is_debug);

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .parse_lossy("");

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
    {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
}
