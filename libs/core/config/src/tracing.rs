use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Install the color-eyre report hook.
///
/// Call first thing in `main`; repeated calls keep the first hook.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Filter used when `RUST_LOG` is absent
fn default_directives(environment: &Environment) -> &'static str {
    if environment.is_production() {
        "info,qdrant_client=warn,hyper=warn,reqwest=warn"
    } else {
        "debug,qdrant_client=info,hyper=info,h2=info,tower=info"
    }
}

fn env_filter(environment: &Environment) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(environment)))
}

/// JSON lines for log shipping in production, pretty output everywhere else
fn output_layer(environment: &Environment) -> Box<dyn Layer<Registry> + Send + Sync> {
    let layer = tracing_subscriber::fmt::layer();
    if environment.is_production() {
        layer
            .json()
            .with_target(false)
            .with_current_span(true)
            .flatten_event(true)
            .boxed()
    } else {
        layer.with_file(false).with_line_number(false).pretty().boxed()
    }
}

/// Install the global subscriber: output layer, `tracing_error::ErrorLayer`, `EnvFilter`.
///
/// `RUST_LOG` overrides the per-environment defaults. A second call leaves the first
/// subscriber in place.
pub fn init_tracing(environment: &Environment) {
    let installed = tracing_subscriber::registry()
        .with(output_layer(environment))
        .with(tracing_error::ErrorLayer::default())
        .with(env_filter(environment))
        .try_init()
        .is_ok();

    if installed {
        info!(?environment, "Tracing initialized");
    } else {
        debug!("Global subscriber already set, keeping it");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_per_environment() {
        assert!(default_directives(&Environment::Production).starts_with("info,"));
        assert!(default_directives(&Environment::Development).starts_with("debug,"));
        assert!(default_directives(&Environment::Production).contains("qdrant_client=warn"));
    }

    #[test]
    fn test_rust_log_overrides_defaults() {
        temp_env::with_var("RUST_LOG", Some("warn"), || {
            assert_eq!(env_filter(&Environment::Production).to_string(), "warn");
        });
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        temp_env::with_var("RUST_LOG", Some("error"), || {
            init_tracing(&Environment::Production);
            init_tracing(&Environment::Development);
        });
    }
}
