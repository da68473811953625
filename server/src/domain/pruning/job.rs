//! Job resolution from data point attributes

use opentelemetry_proto::tonic::common::v1::KeyValue;

use crate::utils::otlp::{attribute_value_string, find_attribute, keys};

/// Attribute keys consulted for the job, highest precedence first
pub const JOB_ATTRIBUTE_PRECEDENCE: [&str; 3] = [keys::JOB, keys::SERVICE_NAME, keys::SCRAPE_JOB];

/// Resolve the job identity of a data point.
///
/// The first key of [`JOB_ATTRIBUTE_PRECEDENCE`] present in `attrs` decides,
/// whatever its value (an empty string included). Returns an empty string
/// when none is present.
pub fn resolve_job(attrs: &[KeyValue]) -> String {
    JOB_ATTRIBUTE_PRECEDENCE
        .iter()
        .find_map(|key| find_attribute(attrs, key))
        .map(attribute_value_string)
        .unwrap_or_default()
}
