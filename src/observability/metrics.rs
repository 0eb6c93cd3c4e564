use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()
    }).await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Authentication exchange
    pub auth_exchanges: IntCounterVec,
    pub auth_exchange_duration: HistogramVec,

    // Token cache
    pub token_cache_lookups: IntCounterVec,
    pub token_cache_write_failures: IntCounter,

    // Auth failure interception
    pub auth_retries: IntCounterVec,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("keystone".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            auth_exchanges: IntCounterVec::new(Opts::new("auth_exchanges_total", "Authentication exchanges by outcome"),&["outcome"],).unwrap(),
            auth_exchange_duration: HistogramVec::new(HistogramOpts::new("auth_exchange_duration_seconds", "Authentication exchange duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["outcome"],).unwrap(),

            token_cache_lookups: IntCounterVec::new(Opts::new("token_cache_lookups_total", "Token cache lookups by result"),&["result"],).unwrap(),
            token_cache_write_failures: IntCounter::new("token_cache_write_failures_total", "Failed token cache writes").unwrap(),

            auth_retries: IntCounterVec::new(Opts::new("auth_retries_total", "Auth failure interceptions by outcome"),&["outcome"],).unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.auth_exchanges.clone())).unwrap();
        reg.register(Box::new(metrics.auth_exchange_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.token_cache_write_failures.clone())).unwrap();
        reg.register(Box::new(metrics.auth_retries.clone())).unwrap();

        metrics
    }

    /// Text exposition of every registered metric.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(err) = encoder.encode(&self.registry.gather(), &mut buffer) {
            tracing::error!("metrics encoding failed: {}", err);
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}
