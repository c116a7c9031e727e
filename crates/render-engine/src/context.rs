//! Expensive render resources, built once and shared by all frames.

use std::path::Path;
use std::sync::Arc;

use ab_glyph::FontArc;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point;
use parking_lot::Mutex;
use zoomreel_project_model::composition::CompositionConfig;
use zoomreel_project_model::geometry::Size;

use crate::canvas::CanvasBase;
use crate::draw::color_or;

/// Arrow outline in a 24 px box, tip at the origin.
const POINTER_OUTLINE: &[(f32, f32)] = &[
    (0.0, 0.0),
    (0.0, 17.0),
    (4.5, 13.0),
    (7.5, 20.0),
    (10.5, 18.8),
    (7.5, 12.0),
    (13.0, 12.0),
];
const POINTER_BASE_PX: f32 = 24.0;
const POINTER_BORDER_PX: f32 = 1.5;

/// DejaVu Sans, used for subtitles when no font is configured.
static EMBEDDED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

/// Fonts, sprites, parsed colors and the canvas background.
#[derive(Debug)]
pub struct RenderContext {
    pub font: Option<FontArc>,
    pub canvas: Option<CanvasBase>,
    pub pointer_sprite: RgbaImage,
    pub highlight_color: [u8; 4],
    pub subtitle_text_color: [u8; 4],
    pub subtitle_box_color: [u8; 4],
}

impl RenderContext {
    /// Load and pre-render everything the stages need.
    ///
    /// Missing or invalid resources are logged and left out; the stage that
    /// needs them passes frames through instead.
    pub fn build(config: &CompositionConfig) -> Self {
        let output = config.output_size();

        let font = if config.subtitles.enabled {
            subtitle_font(config.subtitles.font_path.as_deref())
        } else {
            None
        };

        let canvas = if config.canvas.enabled {
            CanvasBase::build(&config.canvas, output, output)
        } else {
            None
        };

        Self {
            font,
            canvas,
            pointer_sprite: pointer_sprite(config.cursor.pointer_scale as f32),
            highlight_color: color_or(&config.cursor.highlight_color, [255, 213, 79, 204], "highlight"),
            subtitle_text_color: color_or(&config.subtitles.text_color, [255, 255, 255, 255], "subtitle text"),
            subtitle_box_color: color_or(&config.subtitles.box_color, [0, 0, 0, 179], "subtitle box"),
        }
    }

    pub fn canvas_size(&self) -> Option<Size> {
        self.canvas.as_ref().map(|c| c.size())
    }
}

/// The configured subtitle font, or the embedded one when none is set or the
/// configured file cannot be loaded.
fn subtitle_font(path: Option<&Path>) -> Option<FontArc> {
    if let Some(path) = path {
        let loaded = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontArc::try_from_vec(bytes).map_err(|e| e.to_string()));
        match loaded {
            Ok(font) => return Some(font),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to load subtitle font, using embedded font");
            }
        }
    }
    match FontArc::try_from_slice(EMBEDDED_FONT) {
        Ok(font) => Some(font),
        Err(e) => {
            tracing::warn!(error = %e, "Embedded font unusable, subtitles will not be burned in");
            None
        }
    }
}

/// Render the pointer arrow at `scale` times its base size.
///
/// The arrow tip sits at the sprite origin.
pub fn pointer_sprite(scale: f32) -> RgbaImage {
    let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
    let side = (POINTER_BASE_PX * scale).ceil() as u32 + 2;
    let mut sprite = RgbaImage::new(side, side);

    let polygon = |grow: f32, offset: f32| -> Vec<Point<i32>> {
        POINTER_OUTLINE
            .iter()
            .map(|&(x, y)| {
                Point::new(
                    (x * scale * grow + offset).round() as i32,
                    (y * scale * grow + offset).round() as i32,
                )
            })
            .collect()
    };

    let border = POINTER_BORDER_PX * scale.max(1.0);
    draw_polygon_mut(&mut sprite, &polygon(1.0, 0.0), Rgba([255, 255, 255, 255]));
    let inner_scale = ((POINTER_BASE_PX * scale - 2.0 * border) / (POINTER_BASE_PX * scale)).max(0.1);
    draw_polygon_mut(&mut sprite, &polygon(inner_scale, border), Rgba([0, 0, 0, 255]));
    sprite
}

/// Lazily built [`RenderContext`] shared across render threads.
///
/// The first frame to need it builds it under the lock; later frames get a
/// clone of the `Arc`.
#[derive(Debug, Default)]
pub struct SharedRenderContext {
    slot: Mutex<Option<Arc<RenderContext>>>,
}

impl SharedRenderContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_init(&self, config: &CompositionConfig) -> Arc<RenderContext> {
        let mut slot = self.slot.lock();
        if let Some(ctx) = slot.as_ref() {
            return Arc::clone(ctx);
        }
        tracing::debug!("Building render context");
        let ctx = Arc::new(RenderContext::build(config));
        *slot = Some(Arc::clone(&ctx));
        ctx
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_is_built_once() {
        let shared = SharedRenderContext::new();
        assert!(!shared.is_initialized());

        let config = CompositionConfig::default();
        let a = shared.get_or_init(&config);
        let b = shared.get_or_init(&config);
        assert!(Arc::ptr_eq(&a, &b));
        assert!(shared.is_initialized());
    }

    #[test]
    fn test_concurrent_init_shares_one_context() {
        let shared = Arc::new(SharedRenderContext::new());
        let config = Arc::new(CompositionConfig::default());
        let contexts: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                let config = Arc::clone(&config);
                std::thread::spawn(move || shared.get_or_init(&config))
            })
            .map(|h| h.join().unwrap())
            .collect();
        assert!(contexts.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn test_missing_font_falls_back_to_embedded() {
        let mut config = CompositionConfig::default();
        config.subtitles.font_path = Some("/nonexistent/zoomreel/font.ttf".into());
        assert!(RenderContext::build(&config).font.is_some());

        config.subtitles.font_path = None;
        assert!(RenderContext::build(&config).font.is_some());

        config.subtitles.enabled = false;
        assert!(RenderContext::build(&config).font.is_none());
    }

    #[test]
    fn test_canvas_only_when_enabled() {
        let mut config = CompositionConfig {
            width: 320,
            height: 180,
            ..CompositionConfig::default()
        };
        assert!(RenderContext::build(&config).canvas.is_none());
        config.canvas.enabled = true;
        config.canvas.padding = 10;
        assert_eq!(
            RenderContext::build(&config).canvas_size(),
            Some(Size::new(320, 180))
        );
    }

    #[test]
    fn test_pointer_sprite_scales() {
        let small = pointer_sprite(1.0);
        let big = pointer_sprite(2.0);
        assert!(big.width() > small.width());
        // Tip is opaque, far corner is transparent.
        assert_eq!(big.get_pixel(1, 2)[3], 255);
        assert_eq!(big.get_pixel(big.width() - 1, 0)[3], 0);
    }
}
