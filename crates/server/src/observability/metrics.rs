//! Prometheus metrics collection and exposition endpoint.

use std::{sync::OnceLock, time::Duration};

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
    TextEncoder, core::Collector,
};
use salvo::{
    Request, Response, handler,
    http::{
        StatusCode,
        header::{CONTENT_TYPE, HeaderValue},
    },
};
use tracing::error;

use syncbridge_app::{domain::jobs::records::Queue, engine::JobEvents};

#[derive(Debug)]
struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    requests_in_flight: IntGauge,
    jobs_processed_total: IntCounterVec,
    job_duration_seconds: HistogramVec,
    jobs_in_flight: IntGaugeVec,
}

static METRICS: OnceLock<Option<Metrics>> = OnceLock::new();

#[derive(Debug)]
pub(super) struct InFlightRequestGuard {
    tracked: bool,
}

impl InFlightRequestGuard {
    pub(super) fn track() -> Self {
        if let Some(metrics) = metrics() {
            metrics.requests_in_flight.inc();
            return Self { tracked: true };
        }

        Self { tracked: false }
    }
}

impl Drop for InFlightRequestGuard {
    fn drop(&mut self) {
        if self.tracked
            && let Some(metrics) = metrics()
        {
            metrics.requests_in_flight.dec();
        }
    }
}

pub(super) fn observe_request(method: &str, route: &str, status_code: u16, duration_seconds: f64) {
    let Some(metrics) = metrics() else {
        return;
    };

    let status_class = status_class(status_code);
    let status_code = status_code.to_string();

    metrics
        .requests_total
        .with_label_values(&[method, route, status_class, status_code.as_str()])
        .inc();

    metrics
        .request_duration_seconds
        .with_label_values(&[method, route])
        .observe(duration_seconds);
}

/// Job counters fed by the worker pools.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct JobMetrics;

impl JobEvents for JobMetrics {
    fn job_started(&self, queue: Queue) {
        if let Some(metrics) = metrics() {
            metrics
                .jobs_in_flight
                .with_label_values(&[queue.as_str()])
                .inc();
        }
    }

    fn job_finished(&self, queue: Queue, outcome: &str, duration: Duration) {
        let Some(metrics) = metrics() else {
            return;
        };

        metrics
            .jobs_in_flight
            .with_label_values(&[queue.as_str()])
            .dec();

        metrics
            .jobs_processed_total
            .with_label_values(&[queue.as_str(), outcome])
            .inc();

        metrics
            .job_duration_seconds
            .with_label_values(&[queue.as_str()])
            .observe(duration.as_secs_f64());
    }
}

#[handler]
pub(crate) async fn metrics_handler(_req: &mut Request, res: &mut Response) {
    let Some(metrics) = metrics() else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        return;
    };

    let encoder = TextEncoder::new();
    let metric_families = metrics.registry.gather();

    let mut encoded = Vec::new();

    if let Err(source) = encoder.encode(&metric_families, &mut encoded) {
        error!("failed to encode metrics response: {source}");
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

        return;
    }

    let content_type = match HeaderValue::from_str(encoder.format_type()) {
        Ok(value) => value,
        Err(source) => {
            error!("failed to encode metrics content type header: {source}");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

            return;
        }
    };

    res.headers_mut().insert(CONTENT_TYPE, content_type);
    res.render(String::from_utf8_lossy(&encoded).into_owned());
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get_or_init(build_metrics).as_ref()
}

fn register<M>(registry: &Registry, name: &str, metric: Result<M, prometheus::Error>) -> Option<M>
where
    M: Collector + Clone + 'static,
{
    let metric = match metric {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create {name} metric: {source}");
            return None;
        }
    };

    if let Err(source) = registry.register(Box::new(metric.clone())) {
        error!("failed to register {name} metric: {source}");
        return None;
    }

    Some(metric)
}

fn build_metrics() -> Option<Metrics> {
    let registry = Registry::new();

    let requests_total = register(
        &registry,
        "requests_total",
        IntCounterVec::new(
            Opts::new(
                "syncbridge_http_requests_total",
                "Total HTTP requests partitioned by method, route, status class, and status code.",
            ),
            &["method", "route", "status_class", "status_code"],
        ),
    )?;

    let request_duration_seconds = register(
        &registry,
        "request_duration",
        HistogramVec::new(
            HistogramOpts::new(
                "syncbridge_http_request_duration_seconds",
                "HTTP request duration in seconds partitioned by method and route.",
            )
            .buckets(vec![
                0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ]),
            &["method", "route"],
        ),
    )?;

    let requests_in_flight = register(
        &registry,
        "requests_in_flight",
        IntGauge::with_opts(Opts::new(
            "syncbridge_http_requests_in_flight",
            "Current number of in-flight HTTP requests.",
        )),
    )?;

    let jobs_processed_total = register(
        &registry,
        "jobs_processed_total",
        IntCounterVec::new(
            Opts::new(
                "syncbridge_jobs_processed_total",
                "Job attempts partitioned by queue and outcome.",
            ),
            &["queue", "outcome"],
        ),
    )?;

    let job_duration_seconds = register(
        &registry,
        "job_duration",
        HistogramVec::new(
            HistogramOpts::new(
                "syncbridge_job_duration_seconds",
                "Job attempt duration in seconds partitioned by queue.",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
            &["queue"],
        ),
    )?;

    let jobs_in_flight = register(
        &registry,
        "jobs_in_flight",
        IntGaugeVec::new(
            Opts::new(
                "syncbridge_jobs_in_flight",
                "Job attempts currently running, partitioned by queue.",
            ),
            &["queue"],
        ),
    )?;

    Some(Metrics {
        registry,
        requests_total,
        request_duration_seconds,
        requests_in_flight,
        jobs_processed_total,
        job_duration_seconds,
        jobs_in_flight,
    })
}

fn status_class(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use salvo::{
        Router, Service,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use syncbridge_app::{domain::jobs::records::Queue, engine::JobEvents};

    use super::{JobMetrics, metrics_handler, observe_request, status_class};

    async fn scrape() -> TestResult<String> {
        let service =
            Service::new(Router::new().push(Router::with_path("metrics").get(metrics_handler)));

        Ok(TestClient::get("http://example.com/metrics")
            .send(&service)
            .await
            .take_string()
            .await?)
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_http_metrics() -> TestResult {
        observe_request("POST", "/tenants/{uuid}/webhooks/erp", 202, 0.042);
        observe_request("POST", "/tenants/{uuid}/webhooks/erp", 500, 0.123);

        let response = scrape().await?;

        assert!(
            response.contains("syncbridge_http_requests_total"),
            "expected requests_total metric in response"
        );
        assert!(
            response.contains("syncbridge_http_request_duration_seconds"),
            "expected request_duration metric in response"
        );
        assert!(
            response.contains("syncbridge_http_requests_in_flight"),
            "expected in-flight metric in response"
        );

        Ok(())
    }

    #[tokio::test]
    async fn job_events_are_counted_per_queue_and_outcome() -> TestResult {
        let events = JobMetrics;

        events.job_started(Queue::Orders);
        events.job_finished(Queue::Orders, "completed", Duration::from_millis(80));

        let response = scrape().await?;

        let counted = response.lines().any(|line| {
            line.starts_with("syncbridge_jobs_processed_total{")
                && line.contains("queue=\"orders\"")
                && line.contains("outcome=\"completed\"")
        });

        assert!(counted, "expected processed counter labelled by queue and outcome");
        assert!(
            response.contains("syncbridge_job_duration_seconds"),
            "expected job duration histogram"
        );
        assert!(
            response.contains("syncbridge_jobs_in_flight{queue=\"orders\"}"),
            "expected in-flight gauge for the orders queue"
        );

        Ok(())
    }

    #[test]
    fn status_codes_fold_into_classes() {
        assert_eq!(status_class(202), "2xx");
        assert_eq!(status_class(404), "4xx");
        assert_eq!(status_class(503), "5xx");
        assert_eq!(status_class(42), "other");
    }
}
