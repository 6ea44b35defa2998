//! Bounded per-parameter history for plots.

use std::collections::VecDeque;

use robowatch_types::ParamValue;

/// Maximum number of samples kept per parameter.
pub const TIMELINE_CAPACITY: usize = 50;

/// One timestamped reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp_ms: i64,
    pub value: ParamValue,
}

/// Rolling history of one parameter, oldest first.
///
/// Holds at most [`TIMELINE_CAPACITY`] samples; pushing onto a full timeline
/// drops the oldest sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundedTimeline {
    samples: VecDeque<Sample>,
}

impl BoundedTimeline {
    /// Create an empty timeline.
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(TIMELINE_CAPACITY),
        }
    }

    /// Append a reading, evicting the oldest once over capacity.
    pub fn push(&mut self, timestamp_ms: i64, value: ParamValue) {
        self.samples.push_back(Sample {
            timestamp_ms,
            value,
        });
        if self.samples.len() > TIMELINE_CAPACITY {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterate samples from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> {
        self.samples.iter()
    }

    /// The most recent reading.
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Numeric points for plotting.
    ///
    /// Returns `None` if any sample has no numeric view, which marks the
    /// parameter as non-plottable for display.
    pub fn plottable(&self) -> Option<Vec<(i64, f64)>> {
        self.samples
            .iter()
            .map(|s| s.value.as_f64().map(|v| (s.timestamp_ms, v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_keeps_last_fifty() {
        let mut timeline = BoundedTimeline::new();
        for i in 1..=51 {
            timeline.push(i, ParamValue::Int(i));
        }

        assert_eq!(timeline.len(), TIMELINE_CAPACITY);
        let values: Vec<i64> = timeline.iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(values, (2..=51).collect::<Vec<_>>());
        assert_eq!(timeline.latest().map(|s| s.timestamp_ms), Some(51));
    }

    #[test]
    fn test_text_sample_makes_timeline_non_plottable() {
        let mut timeline = BoundedTimeline::new();
        timeline.push(1, ParamValue::Float(1.5));
        timeline.push(2, ParamValue::Text("stalled".into()));

        assert_eq!(timeline.len(), 2);
        assert!(timeline.plottable().is_none());
    }

    #[test]
    fn test_null_sample_makes_timeline_non_plottable() {
        let mut timeline = BoundedTimeline::new();
        timeline.push(1, ParamValue::Float(0.5));
        timeline.push(2, ParamValue::Null);

        assert_eq!(timeline.latest().map(|s| &s.value), Some(&ParamValue::Null));
        assert!(timeline.plottable().is_none());
    }

    #[test]
    fn test_plottable_maps_booleans() {
        let mut timeline = BoundedTimeline::new();
        timeline.push(1, ParamValue::Bool(false));
        timeline.push(2, ParamValue::Int(3));

        assert_eq!(timeline.plottable(), Some(vec![(1, 0.0), (2, 3.0)]));
    }
}
