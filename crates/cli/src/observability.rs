//! Tracing subscriber and OpenTelemetry wiring.
//!
//! - `RUST_LOG` selects the filter (default `info`).
//! - `BLOGSHEET_LOG_FORMAT=json` switches stderr output from compact text to
//!   JSON lines.
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`, when set, additionally exports spans over
//!   OTLP/gRPC.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::TracerProvider;
use opentelemetry_sdk::{runtime, Resource};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const SERVICE_NAME: &str = "blogsheet";
pub const ENV_LOG_FORMAT: &str = "BLOGSHEET_LOG_FORMAT";
pub const ENV_OTLP_ENDPOINT: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

/// Keeps the tracer provider alive; call [`Observability::shutdown`] before
/// exit to flush buffered spans.
pub struct Observability {
    provider: Option<TracerProvider>,
}

impl Observability {
    pub fn shutdown(self) {
        if let Some(provider) = self.provider {
            if let Err(err) = provider.shutdown() {
                eprintln!("failed to flush traces: {err}");
            }
        }
    }
}

/// Installs the global subscriber. Must be called from inside the Tokio
/// runtime when an OTLP endpoint is configured.
pub fn init() -> anyhow::Result<Observability> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var(ENV_LOG_FORMAT)
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let provider = match std::env::var(ENV_OTLP_ENDPOINT)
        .ok()
        .filter(|ep| !ep.trim().is_empty())
    {
        Some(endpoint) => {
            let exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()?;
            Some(
                TracerProvider::builder()
                    .with_batch_exporter(exporter, runtime::Tokio)
                    .with_resource(Resource::new(vec![KeyValue::new(
                        "service.name",
                        SERVICE_NAME,
                    )]))
                    .build(),
            )
        }
        None => None,
    };
    let otel = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer(SERVICE_NAME)));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| fmt::layer().compact().with_writer(std::io::stderr)))
        .with(otel)
        .try_init()?;

    Ok(Observability { provider })
}
