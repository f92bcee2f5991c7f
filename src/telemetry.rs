//! OpenTelemetry bootstrap for the load tester.
//!
//! Runs once at process start. In the traced profile it installs an
//! OTLP/gRPC batch exporter plus the tracing-opentelemetry layer; any
//! failure is logged and the process continues with plain fmt logging.

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::Resource;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Fixed service name attached to exported spans.
pub const SERVICE_NAME: &str = "load-tester";

static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Keep alive for the duration of the run; dropping it flushes pending
/// spans and shuts down the tracer provider.
pub struct TelemetryGuard {
    tracing_enabled: bool,
}

impl TelemetryGuard {
    pub fn tracing_enabled(&self) -> bool {
        self.tracing_enabled
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if self.tracing_enabled {
            global::shutdown_tracer_provider();
        }
    }
}

/// Initialize logging and, when `traced` is set, span export.
///
/// Idempotent: a second call is a no-op returning a disabled guard.
/// Never fatal. Must be called from within a tokio runtime (the batch
/// span processor exports on it).
pub fn init(traced: bool, otlp_endpoint: Option<&str>) -> TelemetryGuard {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return TelemetryGuard {
            tracing_enabled: false,
        };
    }

    if !traced {
        init_logging_only();
        return TelemetryGuard {
            tracing_enabled: false,
        };
    }

    match init_traced(otlp_endpoint) {
        Ok(()) => {
            tracing::info!(service_name = SERVICE_NAME, "tracing enabled");
            TelemetryGuard {
                tracing_enabled: true,
            }
        }
        Err(e) => {
            init_logging_only();
            tracing::warn!(
                error = %e,
                "failed to initialize telemetry, continuing without tracing"
            );
            TelemetryGuard {
                tracing_enabled: false,
            }
        }
    }
}

fn init_traced(otlp_endpoint: Option<&str>) -> anyhow::Result<()> {
    // W3C trace context propagation for outgoing requests
    global::set_text_map_propagator(TraceContextPropagator::new());

    // The exporter reads OTEL_EXPORTER_OTLP_ENDPOINT when no explicit
    // endpoint is configured, and assumes gRPC (port 4317, not 4318).
    let mut exporter = opentelemetry_otlp::new_exporter().tonic();
    if let Some(endpoint) = otlp_endpoint {
        exporter = exporter.with_endpoint(endpoint.to_string());
    }

    let tracer = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(opentelemetry_sdk::trace::config().with_resource(Resource::new(
            vec![
                KeyValue::new("service.name", SERVICE_NAME),
                KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
            ],
        )))
        .install_batch(opentelemetry_sdk::runtime::Tokio)?;

    let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(telemetry_layer)
        .try_init()?;

    Ok(())
}

/// Fallback when telemetry is disabled or its setup failed.
fn init_logging_only() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
