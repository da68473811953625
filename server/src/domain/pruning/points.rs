//! Uniform view over the five OTLP data point shapes

use opentelemetry_proto::tonic::common::v1::KeyValue;
use opentelemetry_proto::tonic::metrics::v1::{
    ExponentialHistogramDataPoint, HistogramDataPoint, NumberDataPoint, SummaryDataPoint,
    metric::Data,
};

/// Attribute access shared by every data point shape
trait PointAttributes {
    fn attributes(&self) -> &[KeyValue];
}

impl PointAttributes for NumberDataPoint {
    fn attributes(&self) -> &[KeyValue] {
        &self.attributes
    }
}

impl PointAttributes for HistogramDataPoint {
    fn attributes(&self) -> &[KeyValue] {
        &self.attributes
    }
}

impl PointAttributes for ExponentialHistogramDataPoint {
    fn attributes(&self) -> &[KeyValue] {
        &self.attributes
    }
}

impl PointAttributes for SummaryDataPoint {
    fn attributes(&self) -> &[KeyValue] {
        &self.attributes
    }
}

/// Mutable view of a metric's data points, tagged by metric type
pub enum MetricPoints<'a> {
    Gauge(&'a mut Vec<NumberDataPoint>),
    Sum(&'a mut Vec<NumberDataPoint>),
    Histogram(&'a mut Vec<HistogramDataPoint>),
    ExponentialHistogram(&'a mut Vec<ExponentialHistogramDataPoint>),
    Summary(&'a mut Vec<SummaryDataPoint>),
}

impl<'a> MetricPoints<'a> {
    pub fn new(data: &'a mut Data) -> Self {
        match data {
            Data::Gauge(g) => Self::Gauge(&mut g.data_points),
            Data::Sum(s) => Self::Sum(&mut s.data_points),
            Data::Histogram(h) => Self::Histogram(&mut h.data_points),
            Data::ExponentialHistogram(eh) => Self::ExponentialHistogram(&mut eh.data_points),
            Data::Summary(s) => Self::Summary(&mut s.data_points),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Gauge(_) => "gauge",
            Self::Sum(_) => "sum",
            Self::Histogram(_) => "histogram",
            Self::ExponentialHistogram(_) => "exponential_histogram",
            Self::Summary(_) => "summary",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Gauge(p) | Self::Sum(p) => p.len(),
            Self::Histogram(p) => p.len(),
            Self::ExponentialHistogram(p) => p.len(),
            Self::Summary(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attribute lists of every data point, in order
    pub fn attributes(&self) -> Vec<&[KeyValue]> {
        match self {
            Self::Gauge(p) | Self::Sum(p) => collect_attributes(p.as_slice()),
            Self::Histogram(p) => collect_attributes(p.as_slice()),
            Self::ExponentialHistogram(p) => collect_attributes(p.as_slice()),
            Self::Summary(p) => collect_attributes(p.as_slice()),
        }
    }

    /// Keep the data point at index `i` iff `keep[i]`, preserving order.
    /// Points beyond the end of `keep` are kept. Returns the number removed.
    pub fn retain_marked(&mut self, keep: &[bool]) -> usize {
        match self {
            Self::Gauge(p) | Self::Sum(p) => retain_marked(&mut **p, keep),
            Self::Histogram(p) => retain_marked(&mut **p, keep),
            Self::ExponentialHistogram(p) => retain_marked(&mut **p, keep),
            Self::Summary(p) => retain_marked(&mut **p, keep),
        }
    }
}

fn collect_attributes<P: PointAttributes>(points: &[P]) -> Vec<&[KeyValue]> {
    points.iter().map(PointAttributes::attributes).collect()
}

fn retain_marked<P>(points: &mut Vec<P>, keep: &[bool]) -> usize {
    let before = points.len();
    let mut flags = keep.iter().copied();
    // Vec::retain visits each element exactly once, in order
    points.retain(|_| flags.next().unwrap_or(true));
    before - points.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_proto::tonic::metrics::v1::{Gauge, Histogram, Summary};

    use crate::utils::otlp::string_attr;

    fn number_point(job: &str, time: u64) -> NumberDataPoint {
        NumberDataPoint {
            attributes: vec![string_attr("job", job)],
            time_unix_nano: time,
            ..Default::default()
        }
    }

    #[test]
    fn test_gauge_view() {
        let mut data = Data::Gauge(Gauge {
            data_points: vec![number_point("a", 1), number_point("b", 2)],
        });
        let points = MetricPoints::new(&mut data);
        assert_eq!(points.kind(), "gauge");
        assert_eq!(points.len(), 2);
        assert_eq!(points.attributes()[1][0].key, "job");
    }

    #[test]
    fn test_retain_marked_preserves_order() {
        let mut data = Data::Gauge(Gauge {
            data_points: vec![
                number_point("a", 1),
                number_point("b", 2),
                number_point("c", 3),
                number_point("d", 4),
            ],
        });
        let removed = MetricPoints::new(&mut data).retain_marked(&[true, false, true, false]);
        assert_eq!(removed, 2);

        let Data::Gauge(g) = data else {
            panic!("expected gauge");
        };
        let times: Vec<u64> = g.data_points.iter().map(|p| p.time_unix_nano).collect();
        assert_eq!(times, vec![1, 3]);
    }

    #[test]
    fn test_retain_marked_short_mask_keeps_tail() {
        let mut data = Data::Histogram(Histogram {
            data_points: vec![HistogramDataPoint::default(); 3],
            aggregation_temporality: 2,
        });
        let mut points = MetricPoints::new(&mut data);
        assert_eq!(points.retain_marked(&[false]), 1);
        assert_eq!(points.len(), 2);
    }

    #[test]
    fn test_empty_summary_view() {
        let mut data = Data::Summary(Summary {
            data_points: Vec::new(),
        });
        let points = MetricPoints::new(&mut data);
        assert_eq!(points.kind(), "summary");
        assert!(points.is_empty());
        assert!(points.attributes().is_empty());
    }
}
