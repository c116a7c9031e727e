//! Time lookups for overlay streams.

use zoomreel_project_model::event::{ClickEvent, OverlayPlacementEvent};

/// Placement in effect at `t`: the latest event at or before `t`.
///
/// Queries before the first event resolve to the first event. Events must be
/// sorted by `elapsed_secs`.
pub fn active_overlay(
    events: &[OverlayPlacementEvent],
    t: f64,
) -> Option<&OverlayPlacementEvent> {
    let at_or_before = events.partition_point(|e| e.elapsed_secs <= t);
    events.get(at_or_before.saturating_sub(1))
}

/// A click whose highlight is still on screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecentClick {
    pub click: ClickEvent,
    /// Seconds since the click, in `[0, window)`.
    pub age_secs: f64,
}

/// Clicks that happened within `window_secs` before render time `t`.
///
/// Click times are shifted by `recording_start_secs` onto the render
/// timeline. Clicks must be sorted by capture time.
pub fn recent_clicks(
    clicks: &[ClickEvent],
    t: f64,
    window_secs: f64,
    recording_start_secs: f64,
) -> Vec<RecentClick> {
    if window_secs <= 0.0 {
        return vec![];
    }
    let render_time = |c: &ClickEvent| c.captured_at_secs - recording_start_secs;
    let end = clicks.partition_point(|c| render_time(c) <= t);
    let start = clicks[..end].partition_point(|c| render_time(c) <= t - window_secs);

    clicks[start..end]
        .iter()
        .map(|c| RecentClick {
            click: *c,
            age_secs: t - render_time(c),
        })
        .collect()
}
