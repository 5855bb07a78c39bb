use chargerules_core::CombinationKind;
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_histogram_vec, register_int_counter_vec, Encoder, Histogram,
    HistogramVec, IntCounterVec, TextEncoder,
};

pub static LOOKUP_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!("rule_lookup_seconds", "charge rule lookup latency", &["kind"]).unwrap()
});

pub static LOOKUP_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "rule_lookup_failures_total",
        "lookups that failed and returned no templates",
        &["kind"]
    )
    .unwrap()
});

pub static TEMPLATE_SCAN_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!("charge_template_scan_seconds", "in-memory template scan latency").unwrap()
});

pub(crate) fn kind_label(kind: CombinationKind) -> &'static str {
    match kind {
        CombinationKind::Route => "route",
        CombinationKind::Location => "location",
    }
}

/// Text exposition of every metric in the default registry.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::new();
    let _ = encoder.encode(&metric_families, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
