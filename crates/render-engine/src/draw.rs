//! Pixel-level drawing helpers shared by the compositor stages.
//!
//! All coordinates here are frame space (top-left origin). Drawing clips to
//! the image bounds and blends with straight (non-premultiplied) alpha.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use zoomreel_project_model::composition::parse_hex_color;
use zoomreel_project_model::geometry::PixelRect;

/// Parse a hex color, falling back (with a warning) when malformed.
pub fn color_or(hex: &str, fallback: [u8; 4], what: &str) -> [u8; 4] {
    parse_hex_color(hex).unwrap_or_else(|| {
        tracing::warn!(color = hex, what, "Invalid color, using fallback");
        fallback
    })
}

/// Blend `color` over `dst` at `coverage` (0..=1) times the color's alpha.
#[inline]
pub fn blend_pixel(dst: &mut Rgba<u8>, color: [u8; 4], coverage: f32) {
    let a = (color[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let dst_a = dst[3] as f32 / 255.0;
    let out_a = a + dst_a * (1.0 - a);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let src = color[c] as f32;
        let under = dst[c] as f32;
        dst[c] = ((src * a + under * dst_a * (1.0 - a)) / out_a).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

/// Signed distance from a point to a rounded rectangle's edge
/// (negative inside).
fn rounded_rect_distance(px: f32, py: f32, w: f32, h: f32, radius: f32) -> f32 {
    let r = radius.min(w / 2.0).min(h / 2.0).max(0.0);
    let qx = (px - w / 2.0).abs() - (w / 2.0 - r);
    let qy = (py - h / 2.0).abs() - (h / 2.0 - r);
    let outside = (qx.max(0.0).powi(2) + qy.max(0.0).powi(2)).sqrt();
    outside + qx.max(qy).min(0.0) - r
}

/// Anti-aliased coverage of pixel `(x, y)` by a rounded rect of size `w x h`
/// anchored at the origin.
fn rounded_rect_coverage(x: u32, y: u32, w: f32, h: f32, radius: f32) -> f32 {
    let d = rounded_rect_distance(x as f32 + 0.5, y as f32 + 0.5, w, h, radius);
    (0.5 - d).clamp(0.0, 1.0)
}

/// Fill a rounded rectangle, blending over existing pixels.
pub fn fill_rounded_rect(img: &mut RgbaImage, rect: PixelRect, radius: f32, color: [u8; 4]) {
    if rect.is_empty() {
        return;
    }
    let (img_w, img_h) = img.dimensions();
    let x0 = rect.x.max(0);
    let y0 = rect.y.max(0);
    let x1 = (rect.x + rect.width as i64).min(img_w as i64);
    let y1 = (rect.y + rect.height as i64).min(img_h as i64);
    let (w, h) = (rect.width as f32, rect.height as f32);

    for y in y0..y1 {
        for x in x0..x1 {
            let coverage =
                rounded_rect_coverage((x - rect.x) as u32, (y - rect.y) as u32, w, h, radius);
            if coverage > 0.0 {
                blend_pixel(img.get_pixel_mut(x as u32, y as u32), color, coverage);
            }
        }
    }
}

/// Clear everything outside rounded corners of the whole image.
pub fn round_corners(img: &mut RgbaImage, radius: f32) {
    if radius <= 0.0 {
        return;
    }
    let (w, h) = img.dimensions();
    let r = radius.min(w as f32 / 2.0).min(h as f32 / 2.0);
    let band = r.ceil() as u32;
    for y in 0..h {
        let near_y = y < band || y + band >= h;
        if !near_y {
            continue;
        }
        for x in (0..band.min(w)).chain(w.saturating_sub(band).max(band.min(w))..w) {
            let coverage = rounded_rect_coverage(x, y, w as f32, h as f32, r);
            if coverage < 1.0 {
                let px = img.get_pixel_mut(x, y);
                px[3] = (px[3] as f32 * coverage).round() as u8;
            }
        }
    }
}

/// Anti-aliased ring centered at `(cx, cy)`.
pub fn draw_ring(
    img: &mut RgbaImage,
    cx: f32,
    cy: f32,
    radius: f32,
    thickness: f32,
    color: [u8; 4],
    opacity: f32,
) {
    if radius <= 0.0 || thickness <= 0.0 || opacity <= 0.0 {
        return;
    }
    let (img_w, img_h) = img.dimensions();
    let outer = radius + thickness / 2.0;
    let inner = (radius - thickness / 2.0).max(0.0);

    let min_x = ((cx - outer - 1.0).floor().max(0.0)) as u32;
    let min_y = ((cy - outer - 1.0).floor().max(0.0)) as u32;
    let max_x = ((cx + outer + 1.0).ceil().max(0.0) as u32).min(img_w);
    let max_y = ((cy + outer + 1.0).ceil().max(0.0) as u32).min(img_h);

    for y in min_y..max_y {
        for x in min_x..max_x {
            let dx = x as f32 + 0.5 - cx;
            let dy = y as f32 + 0.5 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let coverage = (outer - dist + 0.5).clamp(0.0, 1.0) * (dist - inner + 0.5).clamp(0.0, 1.0);
            if coverage > 0.0 {
                blend_pixel(img.get_pixel_mut(x, y), color, coverage * opacity);
            }
        }
    }
}

/// Largest `(w, h)` with the source aspect ratio that fits in the bounds.
pub fn fit_within(src_w: u32, src_h: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 || max_w == 0 || max_h == 0 {
        return (0, 0);
    }
    let scale = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    let w = ((src_w as f64 * scale).round() as u32).clamp(1, max_w);
    let h = ((src_h as f64 * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

/// Scale to cover `target_w x target_h`, center-cropping the overflow
/// (CSS `object-fit: cover`).
pub fn aspect_fill(src: &RgbaImage, target_w: u32, target_h: u32, filter: FilterType) -> RgbaImage {
    let (src_w, src_h) = src.dimensions();
    if src_w == 0 || src_h == 0 || target_w == 0 || target_h == 0 {
        return RgbaImage::new(target_w, target_h);
    }

    let src_aspect = src_w as f64 / src_h as f64;
    let target_aspect = target_w as f64 / target_h as f64;

    let (crop_x, crop_y, crop_w, crop_h) = if src_aspect > target_aspect {
        // Wider than target: trim left and right.
        let visible = ((src_h as f64 * target_aspect).round() as u32).clamp(1, src_w);
        ((src_w - visible) / 2, 0, visible, src_h)
    } else {
        let visible = ((src_w as f64 / target_aspect).round() as u32).clamp(1, src_h);
        (0, (src_h - visible) / 2, src_w, visible)
    };

    let cropped = imageops::crop_imm(src, crop_x, crop_y, crop_w, crop_h).to_image();
    if (crop_w, crop_h) == (target_w, target_h) {
        return cropped;
    }
    imageops::resize(&cropped, target_w, target_h, filter)
}
