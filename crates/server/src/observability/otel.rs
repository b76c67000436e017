//! OpenTelemetry tracer provider setup.

use std::time::Duration;

use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};

use crate::config::{ServerConfig, observability::ObservabilityConfig};

use super::ObservabilityError;

pub(super) fn build_tracer_provider(
    config: &ServerConfig,
) -> Result<SdkTracerProvider, ObservabilityError> {
    let observability = &config.observability;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(observability.otel_exporter_otlp_endpoint.clone())
        .with_timeout(Duration::from_secs(
            observability.otel_exporter_otlp_timeout_seconds,
        ))
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_sampler(Sampler::ParentBased(Box::new(Sampler::TraceIdRatioBased(
            clamp_sample_ratio(observability.otel_trace_sample_ratio),
        ))))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource(observability))
        .with_batch_exporter(exporter)
        .build())
}

/// Namespace shared by the server and any worker-only deployment.
const SERVICE_NAMESPACE: &str = "syncbridge";

fn resource(observability: &ObservabilityConfig) -> Resource {
    Resource::builder_empty()
        .with_service_name(observability.otel_service_name.clone())
        .with_attributes([
            KeyValue::new("service.namespace", SERVICE_NAMESPACE),
            KeyValue::new("service.version", observability.otel_service_version.clone()),
            KeyValue::new(
                "deployment.environment.name",
                observability.otel_deployment_environment.clone(),
            ),
        ])
        .build()
}

fn clamp_sample_ratio(sample_ratio: f64) -> f64 {
    sample_ratio.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use clap::Parser as _;
    use opentelemetry::{Key, Value};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn sample_ratio_is_clamped_to_unit_range() {
        assert!((clamp_sample_ratio(1.5) - 1.0).abs() < f64::EPSILON, "upper bound");
        assert!(clamp_sample_ratio(-0.2).abs() < f64::EPSILON, "lower bound");
        assert!((clamp_sample_ratio(0.25) - 0.25).abs() < f64::EPSILON, "in range");
    }

    #[test]
    fn resource_names_the_service_and_environment() -> TestResult {
        let config = ServerConfig::try_parse_from([
            "syncbridge-server",
            "--database-url",
            "postgres://localhost/syncbridge",
            "--ecommerce-base-url",
            "https://shop.example.com/api",
            "--erp-base-url",
            "https://erp.example.com/ws",
            "--otel-deployment-environment",
            "staging",
        ])?;

        let resource = resource(&config.observability);

        assert_eq!(
            resource.get(&Key::new("service.name")),
            Some(Value::from("syncbridge-server"))
        );
        assert_eq!(
            resource.get(&Key::new("service.namespace")),
            Some(Value::from(SERVICE_NAMESPACE))
        );
        assert_eq!(
            resource.get(&Key::new("deployment.environment.name")),
            Some(Value::from("staging"))
        );

        Ok(())
    }
}
