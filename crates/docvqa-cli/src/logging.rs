use docvqa_core::config::LogLevel;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Debug runs get human-readable lines; every other level emits one JSON
/// object per event.
pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,docvqa={}", level.as_filter())));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // A second call (tests, repeated commands) keeps the first subscriber.
    let _ = if uses_json(level) {
        builder.json().flatten_event(true).try_init()
    } else {
        builder.try_init()
    };
}

fn uses_json(level: LogLevel) -> bool {
    level != LogLevel::Debug
}
