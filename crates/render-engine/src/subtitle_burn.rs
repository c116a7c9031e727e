//! Subtitle stage: burn the active cue into the frame.

use ab_glyph::{Font, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use zoomreel_project_model::composition::SubtitleStyle;
use zoomreel_project_model::geometry::{PixelRect, Size};
use zoomreel_project_model::subtitle::{active_at, SubtitleEntry};

use crate::context::RenderContext;
use crate::draw::fill_rounded_rect;

const LINE_SPACING: f32 = 1.25;

/// Rounded box behind a block of centered lines, anchored at the bottom
/// margin.
pub fn caption_box(frame: Size, line_widths: &[u32], line_height: u32, style: &SubtitleStyle) -> PixelRect {
    let text_w = line_widths.iter().copied().max().unwrap_or(0);
    let lines = line_widths.len() as u32;
    let padding = style.box_padding.saturating_mul(2);
    let width = text_w.saturating_add(padding);
    let height = line_height.saturating_mul(lines).saturating_add(padding);

    let x = (frame.width as i64 - width as i64) / 2;
    let y = frame.height as i64 - style.bottom_margin as i64 - height as i64;
    PixelRect::new(x, y, width, height)
}

/// Draw the first cue active at `t`. Returns whether anything was drawn.
///
/// Without a usable font the frame is left as is.
pub fn burn_subtitle(
    frame: &mut RgbaImage,
    entries: &[SubtitleEntry],
    t: f64,
    style: &SubtitleStyle,
    ctx: &RenderContext,
) -> bool {
    if !style.enabled {
        return false;
    }
    let Some(entry) = active_at(entries, t) else {
        return false;
    };
    let Some(font) = ctx.font.as_ref() else {
        return false;
    };

    let lines: Vec<&str> = entry
        .text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.is_empty() || style.font_size <= 0.0 {
        return false;
    }

    let scale = PxScale::from(style.font_size);
    let widths: Vec<u32> = lines.iter().map(|l| text_size(scale, font, l).0).collect();
    let line_height = (style.font_size * LINE_SPACING).ceil() as u32;
    let ascent_pad = ((line_height as f32 - font_height(font, scale)) / 2.0).max(0.0) as i32;

    let frame_size = Size::new(frame.width(), frame.height());
    let rect = caption_box(frame_size, &widths, line_height, style);
    fill_rounded_rect(frame, rect, style.corner_radius as f32, ctx.subtitle_box_color);

    for (i, (line, width)) in lines.iter().zip(&widths).enumerate() {
        let x = (frame_size.width as i64 - *width as i64) / 2;
        let y = rect.y + style.box_padding as i64 + i as i64 * line_height as i64;
        draw_text_mut(
            frame,
            Rgba(ctx.subtitle_text_color),
            x as i32,
            y as i32 + ascent_pad,
            scale,
            font,
            line,
        );
    }

    tracing::trace!(t, text = %entry.text, "Burned subtitle");
    true
}

fn font_height(font: &impl Font, scale: PxScale) -> f32 {
    let units = font.height_unscaled();
    let per_unit = font
        .units_per_em()
        .map(|em| scale.y / em)
        .unwrap_or(0.0);
    units * per_unit
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoomreel_project_model::composition::CompositionConfig;

    fn style() -> SubtitleStyle {
        SubtitleStyle {
            bottom_margin: 20,
            box_padding: 10,
            ..SubtitleStyle::default()
        }
    }

    #[test]
    fn test_caption_box_is_centered_above_margin() {
        let rect = caption_box(Size::new(400, 300), &[100, 180], 30, &style());
        assert_eq!(rect, PixelRect::new(100, 200, 200, 80));
    }

    #[test]
    fn test_caption_box_saturates_on_extreme_style() {
        let extreme = SubtitleStyle {
            box_padding: u32::MAX,
            ..style()
        };
        let rect = caption_box(Size::new(400, 300), &[u32::MAX], u32::MAX, &extreme);
        assert_eq!((rect.width, rect.height), (u32::MAX, u32::MAX));

        let many_lines = vec![10; 4];
        let rect = caption_box(Size::new(400, 300), &many_lines, u32::MAX / 2, &style());
        assert_eq!(rect.height, u32::MAX);
    }

    #[test]
    fn test_no_font_is_passthrough() {
        let mut config = CompositionConfig::default();
        config.subtitles.enabled = false;
        let ctx = RenderContext::build(&config);
        assert!(ctx.font.is_none());
        let entries = vec![SubtitleEntry::new("hello", 0.0, 2.0)];
        let mut frame = RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255]));
        assert!(!burn_subtitle(&mut frame, &entries, 1.0, &style(), &ctx));
        assert!(frame.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
    }

    #[test]
    fn test_default_config_burns_active_cue() {
        let mut config = CompositionConfig::default();
        config.subtitles.font_size = 20.0;
        let ctx = RenderContext::build(&config);
        assert!(ctx.font.is_some());

        let entries = vec![
            SubtitleEntry::new("first", 0.0, 1.0),
            SubtitleEntry::new("second", 2.0, 1.0),
        ];
        let style = SubtitleStyle {
            font_size: 20.0,
            ..style()
        };
        let mut frame = RgbaImage::from_pixel(320, 200, Rgba([0, 0, 0, 255]));
        assert!(!burn_subtitle(&mut frame, &entries, 1.5, &style, &ctx));
        assert!(burn_subtitle(&mut frame, &entries, 2.5, &style, &ctx));

        // White text pixels inside the bottom caption area, nothing above it.
        let lit = |y0: u32, y1: u32| {
            (y0..y1).any(|y| (0..320).any(|x| frame.get_pixel(x, y)[0] > 200))
        };
        assert!(lit(120, 180));
        assert!(!lit(0, 100));
    }
}
