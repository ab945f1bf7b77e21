//! Logging setup shared by the binary and integration tests.

use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::{Directive, ParseError};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// RFC3339 UTC timer implemented via `chrono` (no extra features).
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        // Keep timestamps compact: no fractional seconds, Z-suffix
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Compact single-line formatting layer.
///
/// - RFC3339 UTC timestamps
/// - level and target (module path)
/// - span close events (duration of `#[instrument]`ed calls)
/// - ANSI colors only when stderr is a terminal
///
/// Logs go to stderr so stdout stays clean for the printed answer.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stderr().is_terminal();

    fmt::layer()
        .compact()
        .with_writer(io::stderr)
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
}

/// Level directive for one crate target, e.g. `rag_base=debug`.
pub fn level_directive(target: &str, level: Level) -> Result<Directive, ParseError> {
    Directive::from_str(&format!("{target}={}", level.as_str().to_lowercase()))
}

/// `RUST_LOG` if set, otherwise `default`.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Installs the global subscriber: [`env_filter`] + [`layer`].
///
/// `verbose` adds `debug` for the workspace crates on top of the filter.
pub fn init(default: &str, verbose: bool) -> Result<(), TryInitError> {
    let mut filter = env_filter(default);
    if verbose {
        for target in ["rules_rag", "ai_llm_service", "rag_base", "rag_store", "contextor"] {
            if let Ok(d) = level_directive(target, Level::DEBUG) {
                filter = filter.add_directive(d);
            }
        }
    }
    tracing_subscriber::registry()
        .with(filter)
        .with(layer())
        .try_init()
}
