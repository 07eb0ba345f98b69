use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVES: &str = "debug,html5ever=error,selectors=error,hyper=warn,reqwest=info";

/// Installs the global subscriber. `directives` uses `EnvFilter` syntax and
/// falls back to [`DEFAULT_DIRECTIVES`] when absent or invalid.
pub fn init(directives: Option<&str>) -> Result<(), TryInitError> {
    let filter = directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .with(ErrorLayer::default())
        .try_init()
}
