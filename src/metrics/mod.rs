use prometheus::{CounterVec, HistogramVec, Opts, Registry, TextEncoder};

/// Server-side request accounting, one label set per transport.
#[derive(Clone)]
pub struct Metrics {
    pub requests_total: CounterVec,
    pub request_duration_seconds: HistogramVec,
    pub errors_total: CounterVec,
    registry: Registry,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests_total = CounterVec::new(
            Opts::new("api_fest_requests_total", "Total requests by transport"),
            &["transport", "operation", "outcome"],
        )?;

        let request_duration_seconds = HistogramVec::new(
            prometheus::histogram_opts!(
                "api_fest_request_duration_seconds",
                "Request latency in seconds"
            ),
            &["transport"],
        )?;

        let errors_total = CounterVec::new(
            Opts::new("api_fest_errors_total", "Total failed requests by transport"),
            &["transport", "outcome"],
        )?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration_seconds.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;

        Ok(Self {
            requests_total,
            request_duration_seconds,
            errors_total,
            registry,
        })
    }

    pub fn gather_text(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }

    pub fn record_request(
        &self,
        transport: &str,
        operation: &str,
        outcome: &str,
        duration_secs: f64,
    ) {
        self.requests_total
            .with_label_values(&[transport, operation, outcome])
            .inc();
        self.request_duration_seconds
            .with_label_values(&[transport])
            .observe(duration_secs);
        if outcome != "success" {
            self.errors_total
                .with_label_values(&[transport, outcome])
                .inc();
        }
    }
}
