//! Clock and timing utilities for stream synchronization.
//!
//! Screen video, camera video, microphone and system audio are captured by
//! independent recorders that start at slightly different real-world
//! instants. Every track records its start as a signed nanosecond offset from
//! the recording epoch. This module provides utilities for:
//! - Converting between nanoseconds and seconds
//! - Expressing one stream's start relative to a reference stream
//! - Mapping a render timestamp onto another stream's local clock
//! - Measuring drift between streams

/// Nanoseconds per second.
pub const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Convert a nanosecond value to seconds.
pub fn ns_to_secs(ns: i64) -> f64 {
    ns as f64 / NANOS_PER_SEC
}

/// Convert seconds to nanoseconds, rounding to the nearest nanosecond.
pub fn secs_to_ns(secs: f64) -> i64 {
    (secs * NANOS_PER_SEC).round() as i64
}

/// Aligns streams against a reference stream (normally the screen video).
///
/// The render timeline's zero is the first frame of the reference stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamAlignment {
    /// Start of the reference stream, in ns from the recording epoch.
    reference_offset_ns: i64,
}

impl StreamAlignment {
    /// Create an alignment anchored at the reference stream's start offset.
    pub fn new(reference_offset_ns: i64) -> Self {
        Self {
            reference_offset_ns,
        }
    }

    /// Offset of the reference stream from the recording epoch.
    pub fn reference_offset_ns(&self) -> i64 {
        self.reference_offset_ns
    }

    /// How many seconds after the reference the given stream started.
    /// Negative when the stream started first.
    pub fn relative_offset_secs(&self, stream_offset_ns: i64) -> f64 {
        ns_to_secs(stream_offset_ns - self.reference_offset_ns)
    }

    /// Map a render-timeline timestamp onto a stream's local clock.
    ///
    /// Timestamps before the stream started are pinned to its first frame.
    pub fn to_stream_time(&self, timeline_secs: f64, stream_offset_ns: i64) -> f64 {
        (timeline_secs - self.relative_offset_secs(stream_offset_ns)).max(0.0)
    }

    /// Drift measurement of a stream against the reference start.
    pub fn drift(&self, stream_offset_ns: i64) -> DriftMeasurement {
        DriftMeasurement {
            reference_ns: self.reference_offset_ns,
            measured_ns: stream_offset_ns,
        }
    }
}

/// Drift measurement between two streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftMeasurement {
    /// Timestamp in the reference stream (ns).
    pub reference_ns: i64,
    /// Timestamp in the measured stream (ns).
    pub measured_ns: i64,
}

impl DriftMeasurement {
    /// Drift in nanoseconds (positive = measured is behind the reference).
    pub fn drift_ns(&self) -> i64 {
        self.measured_ns - self.reference_ns
    }

    /// Drift in milliseconds.
    pub fn drift_ms(&self) -> f64 {
        self.drift_ns() as f64 / 1_000_000.0
    }

    /// Whether drift exceeds an acceptable threshold.
    pub fn exceeds_threshold_ms(&self, threshold_ms: f64) -> bool {
        self.drift_ms().abs() > threshold_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ns_to_secs_conversion() {
        assert!((ns_to_secs(1_500_000_000) - 1.5).abs() < 1e-9);
        assert!((ns_to_secs(-250_000_000) + 0.25).abs() < 1e-9);
        assert_eq!(secs_to_ns(2.0), 2_000_000_000);
        assert_eq!(secs_to_ns(0.1), 100_000_000);
    }

    #[test]
    fn test_relative_offset_against_reference() {
        let alignment = StreamAlignment::new(200_000_000);
        assert!((alignment.relative_offset_secs(450_000_000) - 0.25).abs() < 1e-9);
        assert!((alignment.relative_offset_secs(100_000_000) + 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_to_stream_time_pins_before_stream_start() {
        // Camera started 0.5s after the screen.
        let alignment = StreamAlignment::new(0);
        assert_eq!(alignment.to_stream_time(0.2, 500_000_000), 0.0);
        assert!((alignment.to_stream_time(2.0, 500_000_000) - 1.5).abs() < 1e-9);
        // Camera started before the screen: its clock runs ahead.
        assert!((alignment.to_stream_time(1.0, -300_000_000) - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_drift_measurement() {
        let drift = StreamAlignment::new(1_000_000_000).drift(1_050_000_000);
        assert_eq!(drift.drift_ns(), 50_000_000);
        assert!((drift.drift_ms() - 50.0).abs() < 1e-9);
        assert!(drift.exceeds_threshold_ms(10.0));
        assert!(!drift.exceeds_threshold_ms(100.0));
    }
}
