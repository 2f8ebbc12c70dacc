use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Installs the global subscriber. `RUST_LOG` overrides the default filter;
/// production logs are JSON lines.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if let Err(e) = installed {
        eprintln!("Tracing subscriber already installed: {}", e);
    }
}
