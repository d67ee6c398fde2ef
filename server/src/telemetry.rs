//! Logging, optional OpenTelemetry export, and per-request query counting.

use crate::AppState;
use anyhow::Context as _;
use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::trace::TracerProvider;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::env;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use std::time::Duration;
use tracing::{span::Id, Subscriber};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{filter, layer::Context, registry::LookupSpan, Layer};

pub const QUERY_COUNT_HEADER: &str = "X-DB-Query-Count";

/// Quick TCP check so a missing collector doesn't stall startup.
fn collector_reachable(endpoint: &str) -> bool {
    let host_port = endpoint
        .trim_start_matches("http://")
        .trim_start_matches("https://")
        .trim_end_matches('/');

    host_port
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .map(|addr| TcpStream::connect_timeout(&addr, Duration::from_millis(100)).is_ok())
        .unwrap_or(false)
}

/// Install the global subscriber.
///
/// Console logging is always on and filtered by `RUST_LOG`. When
/// `OTEL_EXPORTER_OTLP_ENDPOINT` points at a reachable collector, traces and
/// logs are exported there as well, under the same filter. Query counting
/// has its own filter so it works whatever `RUST_LOG` says.
pub fn init() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer();
    let env_filter = tracing_subscriber::EnvFilter::from_default_env();

    let endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    let reachable = endpoint.as_deref().is_some_and(collector_reachable);
    let service_name =
        env::var("OTEL_SERVICE_NAME").unwrap_or_else(|_| "recipebox-server".to_string());

    let (otel_trace_layer, otel_log_layer) = match endpoint.as_deref() {
        Some(endpoint) if reachable => {
            let resource = opentelemetry_sdk::Resource::builder()
                .with_service_name(service_name.clone())
                .build();

            let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .context("Failed to create OTLP trace exporter")?;

            let trace_provider = SdkTracerProvider::builder()
                .with_batch_exporter(trace_exporter)
                .with_resource(resource.clone())
                .build();

            let tracer = trace_provider.tracer("recipebox-server");
            opentelemetry::global::set_tracer_provider(trace_provider);

            let log_exporter = opentelemetry_otlp::LogExporter::builder()
                .with_tonic()
                .with_endpoint(endpoint)
                .build()
                .context("Failed to create OTLP log exporter")?;

            let log_provider = SdkLoggerProvider::builder()
                .with_batch_exporter(log_exporter)
                .with_resource(resource)
                .build();

            (
                Some(tracing_opentelemetry::layer().with_tracer(tracer)),
                Some(OpenTelemetryTracingBridge::new(&log_provider)),
            )
        }
        _ => (None, None),
    };

    let output_layers = fmt_layer
        .and_then(otel_trace_layer)
        .and_then(otel_log_layer)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(output_layers)
        .with(db_query_counting_layer())
        .try_init()
        .context("Failed to install tracing subscriber")?;

    match endpoint {
        Some(endpoint) if reachable => tracing::info!(
            "OpenTelemetry enabled, exporting traces and logs to {} as {}",
            endpoint,
            service_name
        ),
        Some(endpoint) => tracing::info!(
            "OpenTelemetry endpoint {} not reachable, using console logging only",
            endpoint
        ),
        None => tracing::debug!("OTEL_EXPORTER_OTLP_ENDPOINT not set, using console logging only"),
    }

    Ok(())
}

tokio::task_local! {
    /// Database queries issued by the current request. Follows the task
    /// across await points and thread migrations.
    static DB_QUERY_COUNTER: Arc<AtomicU32>;
}

/// Queries counted so far for this request, if inside one.
pub fn get_query_count() -> Option<u32> {
    DB_QUERY_COUNTER
        .try_with(|counter| counter.load(Ordering::Relaxed))
        .ok()
}

/// Counts `db.query` spans into the task-local request counter.
///
/// Store calls are synchronous inside the handler's task, so the span is
/// always created where the counter is in scope.
pub struct DbQueryCountingLayer;

impl<S> Layer<S> for DbQueryCountingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, _attrs: &tracing::span::Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };

        if span.name() == "db.query" {
            let _ = DB_QUERY_COUNTER.try_with(|counter| {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
    }
}

/// The counting layer with a filter that only lets `db.query` spans through.
pub fn db_query_counting_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    DbQueryCountingLayer.with_filter(filter::filter_fn(|metadata| {
        metadata.is_span() && metadata.name() == "db.query"
    }))
}

/// Scopes a fresh query counter around the request. Must wrap everything
/// that might query, including the auth middleware.
pub async fn query_counting_middleware(request: Request<Body>, next: Next) -> Response {
    let counter = Arc::new(AtomicU32::new(0));
    DB_QUERY_COUNTER.scope(counter, next.run(request)).await
}

/// Reports the request's query count in `X-DB-Query-Count` when
/// `TRACK_DB_QUERY_COUNT=1`.
pub async fn db_query_count_header_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    if state.config.track_db_query_count {
        if let Some(count) = get_query_count() {
            if let Ok(value) = HeaderValue::from_str(&count.to_string()) {
                response.headers_mut().insert(QUERY_COUNT_HEADER, value);
            }
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    fn quiet_subscriber() -> impl Subscriber + Send + Sync {
        // Same shape as init() with RUST_LOG unset
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_filter(EnvFilter::new("error")))
            .with(db_query_counting_layer())
    }

    #[test]
    fn test_counts_db_query_spans_with_quiet_logging() {
        tracing::subscriber::with_default(quiet_subscriber(), || {
            let counter = Arc::new(AtomicU32::new(0));
            DB_QUERY_COUNTER.sync_scope(counter, || {
                let _query = tracing::info_span!("db.query", op = "list_recipes").entered();
                let _other = tracing::info_span!("http_request").entered();
                assert_eq!(get_query_count(), Some(1));

                drop(tracing::info_span!("db.query", op = "get_recipe"));
                assert_eq!(get_query_count(), Some(2));
            });
        });
    }

    #[test]
    fn test_no_count_outside_request() {
        tracing::subscriber::with_default(quiet_subscriber(), || {
            let _query = tracing::info_span!("db.query", op = "list_recipes").entered();
            assert_eq!(get_query_count(), None);
        });
    }
}
