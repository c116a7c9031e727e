//! Cursor overlay stage, drawn in source (pre-zoom) coordinates.

use image::{imageops, RgbaImage};
use zoomreel_processing_core::cursor_smooth::CursorSmoother;
use zoomreel_processing_core::easing::eased_fraction;
use zoomreel_processing_core::overlay::recent_clicks;
use zoomreel_project_model::composition::{CursorOverlayConfig, CursorOverlayStyle};
use zoomreel_project_model::event::ClickEvent;
use zoomreel_project_model::geometry::Size;

use crate::context::RenderContext;
use crate::draw::draw_ring;

/// Ring radius at the moment of the click, relative to its final radius.
const RING_START_RATIO: f64 = 0.4;
const RING_THICKNESS_RATIO: f64 = 0.15;
const MIN_RING_THICKNESS: f64 = 2.0;

/// Inputs the cursor overlay reads for one frame.
pub struct CursorOverlayInput<'a> {
    pub config: &'a CursorOverlayConfig,
    pub clicks: &'a [ClickEvent],
    pub smoother: &'a CursorSmoother,
    pub recording_start_secs: f64,
}

/// Draw the configured cursor decoration onto a video-sized frame.
pub fn apply_cursor_overlay(
    frame: &mut RgbaImage,
    t: f64,
    input: &CursorOverlayInput<'_>,
    ctx: &RenderContext,
) {
    let video = Size::new(frame.width(), frame.height());
    match input.config.style {
        CursorOverlayStyle::None => {}
        CursorOverlayStyle::ClickHighlight => draw_click_rings(frame, t, video, input, ctx),
        CursorOverlayStyle::EnlargedPointer => draw_pointer(frame, t, video, input, ctx),
    }
}

fn draw_click_rings(
    frame: &mut RgbaImage,
    t: f64,
    video: Size,
    input: &CursorOverlayInput<'_>,
    ctx: &RenderContext,
) {
    let duration = input.config.highlight_duration_secs;
    for recent in recent_clicks(input.clicks, t, duration, input.recording_start_secs) {
        let fraction = (recent.age_secs / duration).clamp(0.0, 1.0);
        let grow = RING_START_RATIO + (1.0 - RING_START_RATIO) * eased_fraction(recent.age_secs, duration);
        let radius = input.config.highlight_radius * grow;
        let thickness = (radius * RING_THICKNESS_RATIO).max(MIN_RING_THICKNESS);

        let at = video.flip_y(recent.click.video_position(video));
        draw_ring(
            frame,
            at.x as f32,
            at.y as f32,
            radius as f32,
            thickness as f32,
            ctx.highlight_color,
            (1.0 - fraction) as f32,
        );
    }
}

fn draw_pointer(
    frame: &mut RgbaImage,
    t: f64,
    video: Size,
    input: &CursorOverlayInput<'_>,
    ctx: &RenderContext,
) {
    let Some(position) = input.smoother.smoothed_position_at(t) else {
        return;
    };
    let tip = video.flip_y(position);
    if !tip.x.is_finite() || !tip.y.is_finite() {
        return;
    }
    imageops::overlay(
        frame,
        &ctx.pointer_sprite,
        tip.x.round() as i64,
        tip.y.round() as i64,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use zoomreel_processing_core::cursor_smooth::TimedPoint;
    use zoomreel_project_model::composition::CompositionConfig;
    use zoomreel_project_model::geometry::Point2D;

    fn black(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255]))
    }

    fn input<'a>(
        config: &'a CursorOverlayConfig,
        clicks: &'a [ClickEvent],
        smoother: &'a CursorSmoother,
    ) -> CursorOverlayInput<'a> {
        CursorOverlayInput {
            config,
            clicks,
            smoother,
            recording_start_secs: 0.0,
        }
    }

    #[test]
    fn test_ring_drawn_at_click_in_frame_space() {
        let ctx = RenderContext::build(&CompositionConfig::default());
        let config = CursorOverlayConfig {
            style: CursorOverlayStyle::ClickHighlight,
            highlight_radius: 20.0,
            highlight_color: "#ffffff".to_string(),
            ..CursorOverlayConfig::default()
        };
        let ctx = RenderContext {
            highlight_color: [255, 255, 255, 255],
            ..ctx
        };
        // Click near the top-left of a 200x200 reference.
        let clicks = vec![ClickEvent::new(1.0, 50.0, 50.0, 200, 200)];
        let smoother = CursorSmoother::from_points(vec![], 0.1, 0);
        let mut frame = black(200, 200);

        apply_cursor_overlay(&mut frame, 1.25, &input(&config, &clicks, &smoother), &ctx);

        // Ring center stays clear; the ring itself lands in the top half.
        assert_eq!(*frame.get_pixel(50, 50), Rgba([0, 0, 0, 255]));
        let lit_top = (0..100).any(|y| frame.get_pixel(50, y)[0] > 0);
        let lit_bottom = (120..200).any(|y| frame.get_pixel(50, y)[0] > 0);
        assert!(lit_top);
        assert!(!lit_bottom);
    }

    #[test]
    fn test_expired_clicks_leave_frame_untouched() {
        let ctx = RenderContext::build(&CompositionConfig::default());
        let config = CursorOverlayConfig {
            style: CursorOverlayStyle::ClickHighlight,
            ..CursorOverlayConfig::default()
        };
        let clicks = vec![ClickEvent::new(1.0, 50.0, 50.0, 200, 200)];
        let smoother = CursorSmoother::from_points(vec![], 0.1, 0);
        let mut frame = black(200, 200);

        apply_cursor_overlay(&mut frame, 3.0, &input(&config, &clicks, &smoother), &ctx);
        assert!(frame.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_pointer_tip_follows_smoothed_cursor() {
        let ctx = RenderContext::build(&CompositionConfig::default());
        let config = CursorOverlayConfig {
            style: CursorOverlayStyle::EnlargedPointer,
            ..CursorOverlayConfig::default()
        };
        // Video space: (40, 160) in a 200-high frame is (40, 40) in frame space.
        let smoother = CursorSmoother::from_points(
            vec![TimedPoint {
                time_secs: 0.0,
                position: Point2D::new(40.0, 160.0),
            }],
            0.1,
            0,
        );
        let mut frame = black(200, 200);
        apply_cursor_overlay(&mut frame, 0.0, &input(&config, &[], &smoother), &ctx);

        assert_eq!(*frame.get_pixel(41, 42), Rgba([255, 255, 255, 255]));
        assert_eq!(*frame.get_pixel(10, 10), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_pointer_without_samples_is_passthrough() {
        let ctx = RenderContext::build(&CompositionConfig::default());
        let config = CursorOverlayConfig {
            style: CursorOverlayStyle::EnlargedPointer,
            ..CursorOverlayConfig::default()
        };
        let smoother = CursorSmoother::from_points(vec![], 0.1, 0);
        let mut frame = black(50, 50);
        apply_cursor_overlay(&mut frame, 0.0, &input(&config, &[], &smoother), &ctx);
        assert!(frame.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }
}
