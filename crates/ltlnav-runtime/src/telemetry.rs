//! Tracing initialisation for ltlnav binaries.
//!
//! Call [`init_tracing`] once at process startup, before the Tokio runtime is
//! built, and keep the returned guard alive until exit.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | Log filter (default `"info"`). |
//! | `LTLNAV_LOG_FORMAT=json` | Emit newline-delimited JSON logs instead of the compact console format. |
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL (e.g. `http://localhost:4318`). When set, spans are also exported over OTLP/HTTP. |
//!
//! # Example
//!
//! ```rust,no_run
//! let _guard = ltlnav_runtime::telemetry::init_tracing("ltlnav");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable selecting the log line format.
pub const LOG_FORMAT_ENV: &str = "LTLNAV_LOG_FORMAT";

/// Install the global subscriber.
///
/// Panics if a global subscriber was already installed, like
/// [`SubscriberInitExt::init`].
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = wants_json(std::env::var(LOG_FORMAT_ENV).ok().as_deref());

    let provider = build_provider(service_name);
    let otel = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("ltlnav")));

    tracing_subscriber::registry()
        .with(filter)
        .with(otel)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer().compact()))
        .init();

    TracerProviderGuard(provider)
}

fn wants_json(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.eq_ignore_ascii_case("json"))
}

/// Flushes and shuts down the OTLP provider (if any) on drop.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        let Some(provider) = self.0.take() else {
            return;
        };
        if let Err(e) = provider.shutdown() {
            eprintln!("[ltlnav] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

/// `None` when `OTEL_EXPORTER_OTLP_ENDPOINT` is unset or the exporter fails
/// to build; the caller then logs to the console only.
fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[ltlnav] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    // Simple exporter: no Tokio runtime exists yet when this runs.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_format_is_case_insensitive() {
        assert!(wants_json(Some("json")));
        assert!(wants_json(Some("JSON")));
        assert!(!wants_json(Some("compact")));
        assert!(!wants_json(None));
    }

    #[test]
    fn no_provider_without_endpoint() {
        // SAFETY: no other test in this crate touches this variable.
        unsafe { std::env::remove_var("OTEL_EXPORTER_OTLP_ENDPOINT") };
        assert!(build_provider("test-service").is_none());
    }

    #[test]
    fn empty_guard_drops_cleanly() {
        drop(TracerProviderGuard(None));
    }
}
