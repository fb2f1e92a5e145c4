use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;
use std::collections::HashSet;

pub struct Metrics {
    request_counter: Counter<u64>,
    classification_counter: Counter<u64>,
    classification_duration: Histogram<u64>,
    pub registry: Registry,
    // Dropping the last provider handle shuts its reader down.
    _provider: SdkMeterProvider,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = SdkMeterProvider::builder()
            .with_reader(exporter)
            .build();

        let meter = provider.meter("athlete_classifier");
        global::set_meter_provider(provider.clone());

        let request_counter = meter
            .u64_counter("requests_total")
            .with_description("Total number of requests")
            .build();

        let classification_counter = meter
            .u64_counter("classifications_total")
            .with_description("Finished classification cycles by outcome")
            .build();

        let boundaries = generate_boundaries((50, 250, 1000, 5000, 30000));

        let classification_duration = meter
            .u64_histogram("classification_duration_ms")
            .with_boundaries(boundaries)
            .with_description("Round trip to the classification service in milliseconds")
            .build();

        Ok(Metrics {
            request_counter,
            classification_counter,
            classification_duration,
            registry,
            _provider: provider,
        })
    }

    pub fn record_request(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.request_counter.add(1, &attributes);
    }

    pub fn record_classification(&self, outcome: &str, duration_ms: u64) {
        let attributes = vec![KeyValue::new("outcome", outcome.to_string())];
        self.classification_counter.add(1, &attributes);
        self.classification_duration.record(duration_ms, &attributes);
    }
}

fn generate_boundaries(parts: (i32, i32, i32, i32, i32)) -> Vec<f64> {
    let first_step: usize = 50;
    let middle_step: usize = 250;
    let end_step: usize = 1000;
    let tail_step: usize = 5000;
    let first_part = (parts.0..=parts.1).step_by(first_step);
    let middle_part = (parts.1..=parts.2).step_by(middle_step);
    let end_part = (parts.2..=parts.3).step_by(end_step);
    let tail_part = (parts.3..=parts.4).step_by(tail_step);

    let mut seen = HashSet::new();
    first_part
        .chain(middle_part)
        .chain(end_part)
        .chain(tail_part)
        .filter(|&x| seen.insert(x))
        .map(|x| x as f64)
        .collect()
}
