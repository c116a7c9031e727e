//! Cursor position lookup and Gaussian smoothing.
//!
//! Raw per-frame cursor samples carry enough timing and measurement noise to
//! make a follow-zoom visibly jitter. The smoother averages every raw sample
//! within `±window` of the query time, weighted by
//! `exp(-(dt / (window / 3))^2)`.
//!
//! The same instant is usually queried twice per frame (once by the zoom
//! resolver, once by the cursor overlay), so results are memoized by exact
//! timestamp in a bounded LRU cache shared across render threads.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use zoomreel_common::clock::secs_to_ns;
use zoomreel_project_model::event::CursorSample;
use zoomreel_project_model::geometry::{Point2D, Size};

/// A cursor sample mapped onto the render timeline and video space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedPoint {
    pub time_secs: f64,
    pub position: Point2D,
}

/// Cursor smoothing engine.
pub struct CursorSmoother {
    samples: Vec<TimedPoint>,
    window_secs: f64,
    cache: Option<Mutex<LruCache<i64, Point2D>>>,
}

impl CursorSmoother {
    /// Build from recorded samples.
    ///
    /// Sample times are shifted by `recording_start_secs` onto the render
    /// timeline and positions are mapped into `video` space. Samples must be
    /// sorted by capture time. A `cache_capacity` of zero disables memoization.
    pub fn new(
        samples: &[CursorSample],
        video: Size,
        recording_start_secs: f64,
        window_secs: f64,
        cache_capacity: usize,
    ) -> Self {
        let points = samples
            .iter()
            .map(|s| TimedPoint {
                time_secs: s.captured_at_secs - recording_start_secs,
                position: s.video_position(video),
            })
            .collect();
        Self::from_points(points, window_secs, cache_capacity)
    }

    /// Build from samples already on the render timeline.
    pub fn from_points(samples: Vec<TimedPoint>, window_secs: f64, cache_capacity: usize) -> Self {
        let cache = NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self {
            samples,
            window_secs,
            cache,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn samples(&self) -> &[TimedPoint] {
        &self.samples
    }

    /// Number of memoized timestamps.
    pub fn cache_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.lock().len())
    }

    /// Raw cursor position at `t`, linearly interpolated between the two
    /// bracketing samples.
    ///
    /// Queries outside the sampled range are pinned to the nearest endpoint.
    pub fn position_at(&self, t: f64) -> Option<Point2D> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;

        if t <= first.time_secs {
            return Some(first.position);
        }
        if t >= last.time_secs {
            return Some(last.position);
        }

        // First sample strictly after t; 1..len because of the checks above.
        let idx = self.samples.partition_point(|s| s.time_secs <= t);
        let before = &self.samples[idx - 1];
        let after = &self.samples[idx];

        let duration = after.time_secs - before.time_secs;
        if duration <= 0.0 {
            return Some(before.position);
        }

        let fraction = (t - before.time_secs) / duration;
        Some(Point2D::lerp(&before.position, &after.position, fraction))
    }

    /// Gaussian-weighted average of the raw samples around `t`.
    ///
    /// Falls back to `(x, y)` when no sample lies within the window. Results
    /// are memoized by `t` alone, so callers must pass the same position for
    /// the same instant.
    pub fn smooth(&self, x: f64, y: f64, t: f64) -> Point2D {
        let key = secs_to_ns(t);
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.lock().get(&key) {
                return *hit;
            }
        }

        let smoothed = self.weighted_average(t).unwrap_or(Point2D::new(x, y));

        if let Some(cache) = &self.cache {
            cache.lock().put(key, smoothed);
        }
        smoothed
    }

    /// Interpolated then smoothed cursor position at `t`.
    pub fn smoothed_position_at(&self, t: f64) -> Option<Point2D> {
        let raw = self.position_at(t)?;
        Some(self.smooth(raw.x, raw.y, t))
    }

    fn weighted_average(&self, t: f64) -> Option<Point2D> {
        if self.window_secs <= 0.0 {
            return None;
        }

        let lo = self
            .samples
            .partition_point(|s| s.time_secs < t - self.window_secs);
        let hi = self
            .samples
            .partition_point(|s| s.time_secs <= t + self.window_secs);
        if lo >= hi {
            return None;
        }

        let sigma = self.window_secs / 3.0;
        let (mut sum_x, mut sum_y, mut sum_w) = (0.0, 0.0, 0.0);
        for sample in &self.samples[lo..hi] {
            let w = (-((sample.time_secs - t) / sigma).powi(2)).exp();
            sum_x += sample.position.x * w;
            sum_y += sample.position.y * w;
            sum_w += w;
        }

        if sum_w <= f64::EPSILON {
            return None;
        }
        Some(Point2D::new(sum_x / sum_w, sum_y / sum_w))
    }
}

impl std::fmt::Debug for CursorSmoother {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorSmoother")
            .field("samples", &self.samples.len())
            .field("window_secs", &self.window_secs)
            .field("cached", &self.cache_len())
            .finish()
    }
}
