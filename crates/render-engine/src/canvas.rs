//! Canvas stage: frame the recording on a padded, rounded background.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use zoomreel_project_model::composition::{Background, CanvasStyleConfig};
use zoomreel_project_model::geometry::{PixelRect, Size};

use crate::draw::{aspect_fill, color_or, fill_rounded_rect, fit_within, round_corners};

const FALLBACK_BACKGROUND: [u8; 4] = [0x1a, 0x1a, 0x1a, 0xff];

/// Shadow offset below the content window, as a fraction of the blur.
const SHADOW_DROP_RATIO: f32 = 0.5;

/// Pre-rendered background plus the rect the recording is placed in.
///
/// Built once per export; the background (and its baked-in shadow) is only
/// cloned per frame.
#[derive(Debug, Clone)]
pub struct CanvasBase {
    background: RgbaImage,
    content: PixelRect,
    corner_radius: f32,
}

impl CanvasBase {
    /// Build the canvas for frames of `frame` size on an `output` canvas.
    ///
    /// Returns `None` when the padding leaves no room for content.
    pub fn build(style: &CanvasStyleConfig, output: Size, frame: Size) -> Option<Self> {
        if output.is_empty() || frame.is_empty() {
            return None;
        }
        let pad = style.padding.saturating_mul(2);
        let (w, h) = fit_within(
            frame.width,
            frame.height,
            output.width.saturating_sub(pad),
            output.height.saturating_sub(pad),
        );
        if w == 0 || h == 0 {
            tracing::warn!(
                padding = style.padding,
                width = output.width,
                height = output.height,
                "Canvas padding leaves no room for content, skipping canvas"
            );
            return None;
        }

        let content = PixelRect::new(
            ((output.width - w) / 2) as i64,
            ((output.height - h) / 2) as i64,
            w,
            h,
        );
        let corner_radius = style.corner_radius as f32;

        let mut background = render_background(&style.background, output);
        if style.shadow_intensity > 0.0 {
            draw_shadow(&mut background, content, corner_radius, style);
        }

        Some(Self {
            background,
            content,
            corner_radius,
        })
    }

    pub fn content_rect(&self) -> PixelRect {
        self.content
    }

    pub fn size(&self) -> Size {
        Size::new(self.background.width(), self.background.height())
    }

    /// Place `frame` in the content rect.
    pub fn apply(&self, frame: &RgbaImage) -> RgbaImage {
        let mut window = if frame.dimensions() == (self.content.width, self.content.height) {
            frame.clone()
        } else {
            imageops::resize(frame, self.content.width, self.content.height, FilterType::Triangle)
        };
        round_corners(&mut window, self.corner_radius);

        let mut out = self.background.clone();
        imageops::overlay(&mut out, &window, self.content.x, self.content.y);
        out
    }
}

fn render_background(background: &Background, output: Size) -> RgbaImage {
    match background {
        Background::Color { color } => RgbaImage::from_pixel(
            output.width,
            output.height,
            Rgba(color_or(color, FALLBACK_BACKGROUND, "canvas background")),
        ),
        Background::Image { path } => match image::open(path) {
            Ok(img) => aspect_fill(&img.to_rgba8(), output.width, output.height, FilterType::Triangle),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load canvas background image, using solid fill"
                );
                RgbaImage::from_pixel(output.width, output.height, Rgba(FALLBACK_BACKGROUND))
            }
        },
    }
}

fn draw_shadow(background: &mut RgbaImage, content: PixelRect, radius: f32, style: &CanvasStyleConfig) {
    let alpha = (style.shadow_intensity.clamp(0.0, 1.0) * 255.0).round() as u8;
    let mut layer = RgbaImage::new(background.width(), background.height());
    let drop = (style.shadow_blur * SHADOW_DROP_RATIO).round() as i64;
    fill_rounded_rect(
        &mut layer,
        PixelRect::new(content.x, content.y + drop, content.width, content.height),
        radius,
        [0, 0, 0, alpha],
    );
    let layer = if style.shadow_blur > 0.0 {
        imageproc::filter::gaussian_blur_f32(&layer, style.shadow_blur)
    } else {
        layer
    };
    imageops::overlay(background, &layer, 0, 0);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(padding: u32) -> CanvasStyleConfig {
        CanvasStyleConfig {
            enabled: true,
            background: Background::Color {
                color: "#0000ff".to_string(),
            },
            corner_radius: 8,
            shadow_intensity: 0.0,
            shadow_blur: 0.0,
            padding,
        }
    }

    #[test]
    fn test_content_rect_is_centered_and_fitted() {
        let base = CanvasBase::build(&style(10), Size::new(200, 100), Size::new(200, 100)).unwrap();
        assert_eq!(base.content_rect(), PixelRect::new(20, 10, 160, 80));
        assert_eq!(base.size(), Size::new(200, 100));
    }

    #[test]
    fn test_apply_places_frame_over_background() {
        let base = CanvasBase::build(&style(10), Size::new(200, 100), Size::new(200, 100)).unwrap();
        let frame = RgbaImage::from_pixel(200, 100, Rgba([255, 0, 0, 255]));
        let out = base.apply(&frame);

        assert_eq!(out.dimensions(), (200, 100));
        assert_eq!(*out.get_pixel(2, 2), Rgba([0, 0, 255, 255]));
        assert_eq!(*out.get_pixel(100, 50), Rgba([255, 0, 0, 255]));
        // Rounded corner of the window shows the background.
        assert_eq!(*out.get_pixel(20, 10), Rgba([0, 0, 255, 255]));
        assert_eq!(*out.get_pixel(30, 50), Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_oversized_padding_disables_canvas() {
        assert!(CanvasBase::build(&style(60), Size::new(100, 100), Size::new(100, 100)).is_none());
    }

    #[test]
    fn test_missing_background_image_falls_back() {
        let mut s = style(4);
        s.background = Background::Image {
            path: "/nonexistent/zoomreel/background.png".into(),
        };
        let base = CanvasBase::build(&s, Size::new(40, 40), Size::new(40, 40)).unwrap();
        let out = base.apply(&RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255])));
        assert_eq!(*out.get_pixel(0, 0), Rgba(FALLBACK_BACKGROUND));
    }

    #[test]
    fn test_shadow_darkens_below_window() {
        let mut s = style(20);
        s.background = Background::Color {
            color: "#ffffff".to_string(),
        };
        s.shadow_intensity = 1.0;
        s.shadow_blur = 4.0;
        let base = CanvasBase::build(&s, Size::new(100, 100), Size::new(100, 100)).unwrap();
        let out = base.apply(&RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255])));
        // Just below the content window (which ends at y = 80).
        assert!(out.get_pixel(50, 81)[0] < 255);
        assert_eq!(*out.get_pixel(2, 2), Rgba([255, 255, 255, 255]));
    }
}
