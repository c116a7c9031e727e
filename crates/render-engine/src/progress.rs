//! Render progress shared between worker threads and the reporting loop.

use parking_lot::Mutex;

#[derive(Debug, Default, Clone, Copy)]
struct ProgressState {
    total_secs: f64,
    latest_secs: f64,
}

/// Tracks how far along the render timeline an export has reached.
///
/// Workers report the timestamp of each composited frame; frames may finish
/// out of order, so only the furthest timestamp counts.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    state: Mutex<ProgressState>,
}

impl ProgressTracker {
    pub fn new(total_secs: f64) -> Self {
        let tracker = Self::default();
        tracker.reset(total_secs);
        tracker
    }

    /// Start a new run over `total_secs` of timeline.
    pub fn reset(&self, total_secs: f64) {
        let mut state = self.state.lock();
        state.total_secs = if total_secs.is_finite() {
            total_secs.max(0.0)
        } else {
            0.0
        };
        state.latest_secs = 0.0;
    }

    /// Record that the frame at `t` has been composited.
    pub fn update(&self, t: f64) {
        if !t.is_finite() {
            return;
        }
        let mut state = self.state.lock();
        if t > state.latest_secs {
            state.latest_secs = t;
        }
    }

    /// Fraction complete in `[0, 1]`. Zero when the total is unknown.
    pub fn progress(&self) -> f64 {
        let state = self.state.lock();
        if state.total_secs <= 0.0 {
            return 0.0;
        }
        (state.latest_secs / state.total_secs).clamp(0.0, 1.0)
    }

    /// Furthest timestamp reported so far.
    pub fn latest(&self) -> f64 {
        self.state.lock().latest_secs
    }

    pub fn total(&self) -> f64 {
        self.state.lock().total_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn test_progress_keeps_furthest_time() {
        let tracker = ProgressTracker::new(10.0);
        tracker.update(5.0);
        tracker.update(2.0);
        assert_eq!(tracker.latest(), 5.0);
        assert!((tracker.progress() - 0.5).abs() < 1e-12);

        tracker.update(50.0);
        assert_eq!(tracker.progress(), 1.0);
    }

    #[test]
    fn test_zero_total_reports_zero() {
        let tracker = ProgressTracker::new(0.0);
        tracker.update(3.0);
        assert_eq!(tracker.progress(), 0.0);

        tracker.reset(f64::NAN);
        assert_eq!(tracker.total(), 0.0);
        assert_eq!(tracker.latest(), 0.0);
    }

    #[test]
    fn test_concurrent_updates() {
        let tracker = Arc::new(ProgressTracker::new(1000.0));
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for i in 0..250 {
                        tracker.update((i * 4 + worker) as f64);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tracker.latest(), 999.0);
    }

    proptest! {
        #[test]
        fn prop_progress_never_moves_backwards(
            times in prop::collection::vec(0.0f64..20.0, 1..64),
        ) {
            let tracker = ProgressTracker::new(10.0);
            let mut last = 0.0;
            for t in &times {
                tracker.update(*t);
                let p = tracker.progress();
                prop_assert!(p >= last);
                prop_assert!((0.0..=1.0).contains(&p));
                last = p;
            }
            let max = times.iter().cloned().fold(0.0, f64::max);
            prop_assert!((tracker.progress() - (max / 10.0).min(1.0)).abs() < 1e-12);
        }
    }
}
