//! Zoom state resolution.
//!
//! For any render timestamp the resolver answers: is a zoom active, how far
//! along is it (`progress` in `[0, 1]`), and which rectangle of the video
//! should it frame. Three tracking behaviors exist, each resolved by its own
//! function and dispatched through a single `match`.
//!
//! # Click zoom
//!
//! Each click group produces one session:
//!
//! ```text
//! start = first - (zoom_in + pre_pause)      end = last + post_pause + zoom_out
//! |-- zoom in --|-- pre --|-- hold / pan ... --|-- post --|-- zoom out --|
//! ```
//!
//! While fully zoomed the box holds on each click for its post-click pause,
//! then pans toward the next click. Long pans are shortened so the subject
//! never leaves the frame.

use std::sync::Arc;

use serde::Serialize;
use zoomreel_project_model::composition::{CompositionConfig, TrackingMode, ZoomTuning};
use zoomreel_project_model::event::ClickEvent;
use zoomreel_project_model::geometry::{BoundingBox, Point2D, Size};

use crate::click_group::{group_clicks, ClickGroup};
use crate::cursor_smooth::CursorSmoother;
use crate::easing::eased_fraction;

/// Slack on session boundaries for float rounding in frame timestamps.
const BOUNDARY_EPSILON_SECS: f64 = 1e-9;

/// Per-timestamp output of the resolver.
///
/// `bounding_box` is present exactly when `is_zooming` is true.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZoomState {
    pub is_zooming: bool,
    pub progress: f64,
    pub bounding_box: Option<BoundingBox>,
}

impl ZoomState {
    pub fn passthrough() -> Self {
        Self {
            is_zooming: false,
            progress: 0.0,
            bounding_box: None,
        }
    }

    pub fn zooming(progress: f64, bounding_box: BoundingBox) -> Self {
        Self {
            is_zooming: true,
            progress: progress.clamp(0.0, 1.0),
            bounding_box: Some(bounding_box),
        }
    }
}

/// One click group's zoom window, precomputed on the render timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoomSession {
    pub start_secs: f64,
    pub end_secs: f64,
    /// Render-timeline time of each click.
    click_secs: Vec<f64>,
    /// Single-click box for each click.
    boxes: Vec<BoundingBox>,
    /// Duration of the pan from click `i` to click `i + 1`.
    pan_secs: Vec<f64>,
    /// Box spanning every click in the group.
    group_box: BoundingBox,
}

impl ZoomSession {
    fn build(group: &ClickGroup, video: Size, recording_start_secs: f64, tuning: &ZoomTuning) -> Self {
        let click_secs: Vec<f64> = group
            .clicks()
            .iter()
            .map(|c| c.captured_at_secs - recording_start_secs)
            .collect();
        let boxes: Vec<BoundingBox> = group
            .clicks()
            .iter()
            .map(|c| click_bounding_box(std::slice::from_ref(c), video, tuning))
            .collect();

        let pan_secs = boxes
            .windows(2)
            .zip(click_secs.windows(2))
            .map(|(pair, times)| pan_duration(&pair[0], &pair[1], times[1] - times[0], tuning))
            .collect();

        let first = click_secs[0];
        let last = click_secs[click_secs.len() - 1];

        Self {
            start_secs: first - (tuning.zoom_in_secs + tuning.pre_click_pause_secs),
            end_secs: last + tuning.post_click_pause_secs + tuning.zoom_out_secs,
            group_box: click_bounding_box(group.clicks(), video, tuning),
            click_secs,
            boxes,
            pan_secs,
        }
    }

    /// Whether `t` falls inside the session, both ends inclusive.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs - BOUNDARY_EPSILON_SECS && t <= self.end_secs + BOUNDARY_EPSILON_SECS
    }

    pub fn click_count(&self) -> usize {
        self.click_secs.len()
    }

    pub fn first_click_secs(&self) -> f64 {
        self.click_secs[0]
    }

    pub fn last_click_secs(&self) -> f64 {
        self.click_secs[self.click_secs.len() - 1]
    }

    /// Box spanning every click of the group.
    pub fn group_box(&self) -> BoundingBox {
        self.group_box
    }

    /// Single-click boxes, in click order.
    pub fn click_boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    fn resolve(&self, t: f64, tuning: &ZoomTuning) -> ZoomState {
        let zoom_in_end = self.first_click_secs() - tuning.pre_click_pause_secs;
        if t < zoom_in_end {
            let progress = eased_fraction(t - self.start_secs, tuning.zoom_in_secs);
            return ZoomState::zooming(progress, self.boxes[0]);
        }

        let zoom_out_start = self.last_click_secs() + tuning.post_click_pause_secs;
        if t >= zoom_out_start {
            let progress = 1.0 - eased_fraction(t - zoom_out_start, tuning.zoom_out_secs);
            return ZoomState::zooming(progress, self.boxes[self.boxes.len() - 1]);
        }

        ZoomState::zooming(1.0, self.held_box(t, tuning.post_click_pause_secs))
    }

    /// Box while fully zoomed: hold on a click through its post-click pause,
    /// then pan toward the next click.
    fn held_box(&self, t: f64, post_pause: f64) -> BoundingBox {
        let paused_through = self.click_secs.partition_point(|c| c + post_pause <= t);
        if paused_through == 0 {
            return self.boxes[0];
        }

        let i = paused_through - 1;
        let Some(next) = self.boxes.get(i + 1) else {
            return self.boxes[i];
        };

        let elapsed = t - (self.click_secs[i] + post_pause);
        let duration = self.pan_secs[i];
        if elapsed >= duration {
            return *next;
        }
        BoundingBox::lerp(&self.boxes[i], next, eased_fraction(elapsed, duration))
    }
}

/// What the resolver tracks.
#[derive(Debug, Clone)]
pub enum TrackingInput {
    Passthrough,
    Clicks(Vec<ZoomSession>),
    CursorFollow(Arc<CursorSmoother>),
}

/// Resolves the zoom state for any render timestamp.
///
/// Immutable after construction; the only shared mutable state is the
/// smoother's cache, which is internally locked.
#[derive(Debug, Clone)]
pub struct ZoomStateResolver {
    input: TrackingInput,
    video: Size,
    tuning: ZoomTuning,
}

impl ZoomStateResolver {
    pub fn passthrough(video: Size) -> Self {
        Self {
            input: TrackingInput::Passthrough,
            video,
            tuning: ZoomTuning::default(),
        }
    }

    /// Click-zoom resolver from pre-grouped clicks.
    pub fn click_zoom(
        groups: &[ClickGroup],
        video: Size,
        recording_start_secs: f64,
        tuning: ZoomTuning,
    ) -> Self {
        let sessions: Vec<ZoomSession> = groups
            .iter()
            .map(|g| ZoomSession::build(g, video, recording_start_secs, &tuning))
            .collect();
        tracing::debug!(sessions = sessions.len(), "Built click zoom sessions");
        Self {
            input: TrackingInput::Clicks(sessions),
            video,
            tuning,
        }
    }

    pub fn cursor_follow(smoother: Arc<CursorSmoother>, video: Size, tuning: ZoomTuning) -> Self {
        Self {
            input: TrackingInput::CursorFollow(smoother),
            video,
            tuning,
        }
    }

    /// Build the resolver selected by `config.tracking`.
    pub fn from_config(
        config: &CompositionConfig,
        clicks: &[ClickEvent],
        smoother: Arc<CursorSmoother>,
    ) -> Self {
        let video = config.output_size();
        match config.tracking {
            TrackingMode::Passthrough => Self::passthrough(video),
            TrackingMode::ClickZoom => {
                let groups = group_clicks(clicks, config.zoom.group_gap_secs);
                Self::click_zoom(
                    &groups,
                    video,
                    config.recording_start_secs,
                    config.zoom.clone(),
                )
            }
            TrackingMode::CursorFollow => {
                Self::cursor_follow(smoother, video, config.zoom.clone())
            }
        }
    }

    pub fn input(&self) -> &TrackingInput {
        &self.input
    }

    pub fn tuning(&self) -> &ZoomTuning {
        &self.tuning
    }

    pub fn video_size(&self) -> Size {
        self.video
    }

    /// Zoom sessions in click-zoom mode; empty otherwise.
    pub fn sessions(&self) -> &[ZoomSession] {
        match &self.input {
            TrackingInput::Clicks(sessions) => sessions,
            _ => &[],
        }
    }

    /// Zoom state at render time `t` (seconds).
    pub fn resolve(&self, t: f64) -> ZoomState {
        match &self.input {
            TrackingInput::Passthrough => ZoomState::passthrough(),
            TrackingInput::Clicks(sessions) => self.resolve_clicks(sessions, t),
            TrackingInput::CursorFollow(smoother) => self.resolve_follow(smoother, t),
        }
    }

    /// The first session containing `t` wins.
    fn resolve_clicks(&self, sessions: &[ZoomSession], t: f64) -> ZoomState {
        sessions
            .iter()
            .find(|s| s.contains(t))
            .map_or_else(ZoomState::passthrough, |s| s.resolve(t, &self.tuning))
    }

    fn resolve_follow(&self, smoother: &CursorSmoother, t: f64) -> ZoomState {
        let center = smoother
            .smoothed_position_at(t)
            .unwrap_or_else(|| self.video.center());
        ZoomState::zooming(
            1.0,
            BoundingBox::new(
                center.x,
                center.y,
                self.tuning.follow_box_width,
                self.tuning.follow_box_height,
            ),
        )
    }
}

/// Box framing a set of clicks, in video space.
///
/// Each axis is padded by `max(padding_ratio * extent, min_padding_px)` on
/// both sides, then the box is clamped into the frame.
pub fn click_bounding_box(clicks: &[ClickEvent], video: Size, tuning: &ZoomTuning) -> BoundingBox {
    let points: Vec<Point2D> = clicks.iter().map(|c| c.video_position(video)).collect();
    if points.is_empty() {
        return BoundingBox::full_frame(video);
    }

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in &points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    let pad_x = (tuning.padding_ratio * (max_x - min_x)).max(tuning.min_padding_px);
    let pad_y = (tuning.padding_ratio * (max_y - min_y)).max(tuning.min_padding_px);

    BoundingBox::from_extents(min_x - pad_x, min_y - pad_y, max_x + pad_x, max_y + pad_y)
        .clamp_to(video)
}

/// Time to pan between two click boxes given `available` seconds.
///
/// When the next box's center lies farther than `pan_trigger_ratio` of the
/// current box's half extent, the pan runs at `pan_speed_px_per_sec` with a
/// floor of `min_pan_secs`, never exceeding the available time.
fn pan_duration(from: &BoundingBox, to: &BoundingBox, available: f64, tuning: &ZoomTuning) -> f64 {
    let available = available.max(0.0);
    let distance = from.center().distance_to(&to.center());
    if distance <= tuning.pan_trigger_ratio * from.half_extent() {
        return available;
    }

    let required = if tuning.pan_speed_px_per_sec > 0.0 {
        distance / tuning.pan_speed_px_per_sec
    } else {
        available
    };
    available.min(required.max(tuning.min_pan_secs))
}
