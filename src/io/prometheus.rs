//! Prometheus text exposition for the proxy metrics
//!
//! Served at `GET /metrics` by the API server.

use crate::infra::metrics::{MetricsSummary, METRICS_BUCKET_BOUNDS, METRICS_NUM_BUCKETS};
use std::fmt::Write;

/// Prometheus metric type
enum MetricType {
    Counter,
    Gauge,
}

impl MetricType {
    fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
        }
    }
}

fn write_metric(
    output: &mut String,
    name: &str,
    help: &str,
    typ: MetricType,
    service: &str,
    val: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} {}", typ.as_str());
    let _ = writeln!(output, "{name}{{service=\"{service}\"}} {val}");
}

fn write_histogram(
    output: &mut String,
    name: &str,
    help: &str,
    service: &str,
    buckets: &[u64; METRICS_NUM_BUCKETS],
    bounds: &[u64; 10],
    sum: u64,
) {
    let _ = writeln!(output, "# HELP {name} {help}");
    let _ = writeln!(output, "# TYPE {name} histogram");

    let mut cumulative = 0u64;
    for (i, &bound) in bounds.iter().enumerate() {
        cumulative += buckets[i];
        let _ = writeln!(output, "{name}_bucket{{service=\"{service}\",le=\"{bound}\"}} {cumulative}");
    }
    cumulative += buckets[METRICS_NUM_BUCKETS - 1];
    let _ = writeln!(output, "{name}_bucket{{service=\"{service}\",le=\"+Inf\"}} {cumulative}");
    let _ = writeln!(output, "{name}_sum{{service=\"{service}\"}} {sum}");
    let _ = writeln!(output, "{name}_count{{service=\"{service}\"}} {cumulative}");
}

/// Escape a label value: backslash, double quote and newline
fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render a metrics snapshot in Prometheus text format
pub fn format_prometheus_metrics(summary: &MetricsSummary, service: &str) -> String {
    let mut output = String::with_capacity(2048);
    let service = escape_label_value(service);
    let service = service.as_str();

    write_metric(
        &mut output,
        "proxy_uptime_seconds",
        "Seconds since the proxy started",
        MetricType::Gauge,
        service,
        summary.uptime_secs,
    );
    write_metric(
        &mut output,
        "proxy_email_requests_total",
        "Registration email requests received",
        MetricType::Counter,
        service,
        summary.email_requests_total,
    );
    write_metric(
        &mut output,
        "proxy_email_sent_total",
        "Registration emails accepted by the vendor",
        MetricType::Counter,
        service,
        summary.email_sent_total,
    );
    write_metric(
        &mut output,
        "proxy_email_rejected_total",
        "Requests rejected before reaching the vendor",
        MetricType::Counter,
        service,
        summary.email_rejected_total,
    );
    write_metric(
        &mut output,
        "proxy_email_vendor_errors_total",
        "Sends refused by the vendor",
        MetricType::Counter,
        service,
        summary.email_vendor_errors_total,
    );
    write_metric(
        &mut output,
        "proxy_email_transport_errors_total",
        "Sends that failed before a vendor response",
        MetricType::Counter,
        service,
        summary.email_transport_errors_total,
    );
    write_histogram(
        &mut output,
        "proxy_vendor_latency_ms",
        "Vendor send latency in milliseconds",
        service,
        &summary.vendor_latency_buckets,
        &METRICS_BUCKET_BOUNDS,
        summary.vendor_latency_sum_ms,
    );
    write_metric(
        &mut output,
        "proxy_vendor_latency_max_ms",
        "Maximum vendor send latency since last report",
        MetricType::Gauge,
        service,
        summary.vendor_latency_max_ms,
    );

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::metrics::{DispatchOutcome, Metrics};

    #[test]
    fn test_format_prometheus_metrics() {
        let metrics = Metrics::new();
        metrics.record_email_request();
        metrics.record_outcome(DispatchOutcome::Sent);
        metrics.record_vendor_latency(70);

        let output = format_prometheus_metrics(&metrics.snapshot(), "mail-proxy");

        assert!(output.contains("proxy_email_requests_total{service=\"mail-proxy\"} 1"));
        assert!(output.contains("proxy_email_sent_total{service=\"mail-proxy\"} 1"));
        assert!(output.contains("proxy_vendor_latency_ms_bucket{service=\"mail-proxy\",le=\"50\"} 0"));
        assert!(output.contains("proxy_vendor_latency_ms_bucket{service=\"mail-proxy\",le=\"100\"} 1"));
        assert!(output.contains("proxy_vendor_latency_ms_count{service=\"mail-proxy\"} 1"));
        assert!(output.contains("proxy_vendor_latency_ms_sum{service=\"mail-proxy\"} 70"));
    }

    #[test]
    fn test_service_label_is_escaped() {
        assert_eq!(escape_label_value(r#"mail "proxy"\x"#), r#"mail \"proxy\"\\x"#);
        assert_eq!(escape_label_value("a\nb"), "a\\nb");

        let output = format_prometheus_metrics(&Metrics::new().snapshot(), "say \"hi\"");
        assert!(output.contains(r#"proxy_email_requests_total{service="say \"hi\""} 0"#));
        assert!(output.contains(r#"proxy_vendor_latency_ms_count{service="say \"hi\""} 0"#));
    }
}
