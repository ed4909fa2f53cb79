/// Utility functions for averaging, merging and formatting
use log::debug;
use time::{format_description, OffsetDateTime};

use crate::models::MeasurementMap;

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Arithmetic mean of a sample sequence
///
/// An empty sequence averages to 0 rather than failing.
pub fn average(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }

    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Merge `source` into `target`, later values overwrite earlier ones
pub fn merge_into(target: &mut MeasurementMap, source: MeasurementMap) {
    for (channel, value) in source {
        if let Some(previous) = target.insert(channel.clone(), value) {
            debug!(
                "Channel {} overwritten: {} -> {}",
                channel, previous, value
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_sequence_averages_to_zero() {
        assert_eq!(average(&[]), 0.0);
    }

    #[test]
    fn average_of_known_values() {
        assert_eq!(average(&[1.0, 2.0, 3.0, 4.0]), 2.5);
        assert_eq!(average(&[1.0, 0.0, 0.0, 1.0]), 0.5);
    }

    proptest! {
        #[test]
        fn average_is_sum_over_len(samples in prop::collection::vec(-1.0e6f64..1.0e6, 1..64)) {
            let expected = samples.iter().sum::<f64>() / samples.len() as f64;
            prop_assert_eq!(average(&samples), expected);
        }

        #[test]
        fn average_of_constant_is_the_constant(value in -1.0e6f64..1.0e6, len in 1usize..32) {
            let samples = vec![value; len];
            let avg = average(&samples);
            prop_assert!((avg - value).abs() <= value.abs() * 1e-12);
        }
    }

    #[test]
    fn merge_is_last_writer_wins() {
        let mut target = MeasurementMap::new();
        target.insert("a".to_string(), 1.0);
        target.insert("b".to_string(), 2.0);

        let mut source = MeasurementMap::new();
        source.insert("b".to_string(), 5.0);
        source.insert("c".to_string(), 3.0);

        merge_into(&mut target, source);

        assert_eq!(target.len(), 3);
        assert_eq!(target["a"], 1.0);
        assert_eq!(target["b"], 5.0);
        assert_eq!(target["c"], 3.0);
    }

    #[test]
    fn datetime_format() {
        let dt = OffsetDateTime::from_unix_timestamp(0).unwrap();
        assert_eq!(format_datetime(&dt), "01.01.1970 - 00:00:00");
    }
}
