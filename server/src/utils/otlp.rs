//! OTLP utility functions
//!
//! Provides reusable functions for working with OTLP protobuf types:
//! - Attribute lookup and string conversion
//! - Shared attribute keys used for job resolution
//! - Data point counting across the metrics tree

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use opentelemetry_proto::tonic::common::v1::{AnyValue, KeyValue, any_value};
use opentelemetry_proto::tonic::metrics::v1::metric::Data;

// ============================================================================
// SHARED ATTRIBUTE KEYS
// ============================================================================

/// Attribute keys that identify the job producing a data point
pub mod keys {
    pub const JOB: &str = "job";
    pub const SERVICE_NAME: &str = "service.name";
    pub const SCRAPE_JOB: &str = "scrape_job";
}

// ============================================================================
// ATTRIBUTE LOOKUP
// ============================================================================

/// Find the first attribute with the given key.
///
/// The key counts as present even when its value is unset.
pub fn find_attribute<'a>(attrs: &'a [KeyValue], key: &str) -> Option<&'a KeyValue> {
    attrs.iter().find(|kv| kv.key == key)
}

/// String form of an attribute value, empty when the value is unset
pub fn attribute_value_string(kv: &KeyValue) -> String {
    kv.value.as_ref().map(any_value_to_string).unwrap_or_default()
}

/// Convert AnyValue to string representation.
///
/// The result is deterministic for a given value: kvlist entries keep their
/// wire order and bytes are standard base64.
pub fn any_value_to_string(value: &AnyValue) -> String {
    match &value.value {
        Some(any_value::Value::StringValue(s)) => s.clone(),
        Some(any_value::Value::BoolValue(b)) => b.to_string(),
        Some(any_value::Value::IntValue(i)) => i.to_string(),
        Some(any_value::Value::DoubleValue(d)) => d.to_string(),
        Some(any_value::Value::ArrayValue(arr)) => {
            let values: Vec<String> = arr.values.iter().map(any_value_to_string).collect();
            serde_json::to_string(&values).unwrap_or_default()
        }
        Some(any_value::Value::KvlistValue(kvlist)) => {
            let map: serde_json::Map<String, serde_json::Value> = kvlist
                .values
                .iter()
                .filter_map(|kv| {
                    kv.value.as_ref().map(|v| {
                        (
                            kv.key.clone(),
                            serde_json::Value::String(any_value_to_string(v)),
                        )
                    })
                })
                .collect();
            serde_json::to_string(&map).unwrap_or_default()
        }
        Some(any_value::Value::BytesValue(b)) => BASE64.encode(b),
        None => String::new(),
    }
}

/// Build a string-valued KeyValue attribute
pub fn string_attr(key: &str, value: &str) -> KeyValue {
    KeyValue {
        key: key.to_string(),
        value: Some(AnyValue {
            value: Some(any_value::Value::StringValue(value.to_string())),
        }),
    }
}

// ============================================================================
// TREE STATISTICS
// ============================================================================

/// Count all data points in a metrics request, across every metric type
pub fn count_data_points(request: &ExportMetricsServiceRequest) -> usize {
    request
        .resource_metrics
        .iter()
        .flat_map(|rm| &rm.scope_metrics)
        .flat_map(|sm| &sm.metrics)
        .map(|m| match &m.data {
            Some(Data::Gauge(g)) => g.data_points.len(),
            Some(Data::Sum(s)) => s.data_points.len(),
            Some(Data::Histogram(h)) => h.data_points.len(),
            Some(Data::ExponentialHistogram(eh)) => eh.data_points.len(),
            Some(Data::Summary(s)) => s.data_points.len(),
            None => 0,
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_proto::tonic::common::v1::{ArrayValue, KeyValueList};
    use opentelemetry_proto::tonic::metrics::v1::{
        Gauge, Metric, NumberDataPoint, ResourceMetrics, ScopeMetrics, Summary, SummaryDataPoint,
    };

    #[test]
    fn test_find_attribute_first_match_wins() {
        let attrs = vec![string_attr("job", "a"), string_attr("job", "b")];
        let kv = find_attribute(&attrs, "job").unwrap();
        assert_eq!(attribute_value_string(kv), "a");
    }

    #[test]
    fn test_find_attribute_missing() {
        let attrs = vec![string_attr("service.name", "svc")];
        assert!(find_attribute(&attrs, "job").is_none());
    }

    #[test]
    fn test_attribute_value_unset_is_empty() {
        let kv = KeyValue {
            key: "job".to_string(),
            value: None,
        };
        assert_eq!(attribute_value_string(&kv), "");
    }

    #[test]
    fn test_any_value_to_string_scalars() {
        let int = AnyValue {
            value: Some(any_value::Value::IntValue(42)),
        };
        let boolean = AnyValue {
            value: Some(any_value::Value::BoolValue(true)),
        };
        let bytes = AnyValue {
            value: Some(any_value::Value::BytesValue(vec![0xab, 0x01])),
        };
        assert_eq!(any_value_to_string(&int), "42");
        assert_eq!(any_value_to_string(&boolean), "true");
        assert_eq!(any_value_to_string(&bytes), "qwE=");
    }

    #[test]
    fn test_any_value_to_string_array() {
        let value = AnyValue {
            value: Some(any_value::Value::ArrayValue(ArrayValue {
                values: vec![
                    AnyValue {
                        value: Some(any_value::Value::StringValue("x".to_string())),
                    },
                    AnyValue {
                        value: Some(any_value::Value::IntValue(1)),
                    },
                ],
            })),
        };
        assert_eq!(any_value_to_string(&value), r#"["x","1"]"#);
    }

    fn kvlist(pairs: &[(&str, &str)]) -> AnyValue {
        AnyValue {
            value: Some(any_value::Value::KvlistValue(KeyValueList {
                values: pairs.iter().map(|(k, v)| string_attr(k, v)).collect(),
            })),
        }
    }

    #[test]
    fn test_any_value_to_string_kvlist_keeps_wire_order() {
        let value = kvlist(&[("zone", "b"), ("app", "api"), ("env", "prod")]);
        assert_eq!(
            any_value_to_string(&value),
            r#"{"zone":"b","app":"api","env":"prod"}"#
        );
    }

    #[test]
    fn test_any_value_to_string_kvlist_is_stable() {
        let pairs: Vec<(String, String)> = (0..8).map(|i| (format!("k{i}"), "v".to_string())).collect();
        let pairs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        let first = any_value_to_string(&kvlist(&pairs));
        for _ in 0..50 {
            assert_eq!(any_value_to_string(&kvlist(&pairs)), first);
        }
    }

    #[test]
    fn test_count_data_points() {
        let request = ExportMetricsServiceRequest {
            resource_metrics: vec![ResourceMetrics {
                scope_metrics: vec![ScopeMetrics {
                    metrics: vec![
                        Metric {
                            name: "a".to_string(),
                            data: Some(Data::Gauge(Gauge {
                                data_points: vec![NumberDataPoint::default(); 3],
                            })),
                            ..Default::default()
                        },
                        Metric {
                            name: "b".to_string(),
                            data: Some(Data::Summary(Summary {
                                data_points: vec![SummaryDataPoint::default()],
                            })),
                            ..Default::default()
                        },
                        Metric {
                            name: "c".to_string(),
                            data: None,
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                }],
                ..Default::default()
            }],
        };
        assert_eq!(count_data_points(&request), 4);
    }
}
