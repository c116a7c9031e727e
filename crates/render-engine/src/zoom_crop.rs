//! Zoom stage: crop the frame around the zoom target and scale it back up.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use zoomreel_processing_core::zoom::ZoomState;
use zoomreel_project_model::geometry::{PixelRect, Point2D, Size};

/// Zoom factors closer to 1 than this are treated as no zoom.
const MIN_EFFECTIVE_ZOOM: f64 = 1.0 + 1e-6;

/// Source rectangle (frame space) the zoom state asks for.
///
/// The magnification ramps from 1 to the box's zoom factor with `progress`,
/// and the crop center moves from the frame center to the box center.
/// Returns `None` when the state needs no crop.
pub fn crop_rect(state: &ZoomState, video: Size, max_zoom: f64) -> Option<PixelRect> {
    if !state.is_zooming || video.is_empty() {
        return None;
    }
    let target = state.bounding_box.as_ref()?;
    if !target.is_valid() {
        return None;
    }

    let progress = state.progress.clamp(0.0, 1.0);
    let zoom = 1.0 + (target.zoom_factor(video, max_zoom) - 1.0) * progress;
    if !zoom.is_finite() || zoom < MIN_EFFECTIVE_ZOOM {
        return None;
    }

    let width = ((video.w() / zoom).round() as u32).clamp(1, video.width);
    let height = ((video.h() / zoom).round() as u32).clamp(1, video.height);

    let center = video.flip_y(Point2D::lerp(&video.center(), &target.center(), progress));
    if !center.x.is_finite() || !center.y.is_finite() {
        return None;
    }
    let max_x = (video.width - width) as f64;
    let max_y = (video.height - height) as f64;
    let x = (center.x - width as f64 / 2.0).round().clamp(0.0, max_x);
    let y = (center.y - height as f64 / 2.0).round().clamp(0.0, max_y);

    Some(PixelRect::new(x as i64, y as i64, width, height))
}

/// Apply the zoom state to a video-sized frame.
///
/// Returns `None` for passthrough.
pub fn apply_zoom(frame: &RgbaImage, state: &ZoomState, max_zoom: f64) -> Option<RgbaImage> {
    let video = Size::new(frame.width(), frame.height());
    let rect = crop_rect(state, video, max_zoom)?;
    let cropped = imageops::crop_imm(
        frame,
        rect.x as u32,
        rect.y as u32,
        rect.width,
        rect.height,
    )
    .to_image();
    Some(imageops::resize(
        &cropped,
        video.width,
        video.height,
        FilterType::Lanczos3,
    ))
}
