//! Composition settings: how an export turns source frames into output frames.
//!
//! Every block is `#[serde(default)]` so older `project.json` files and
//! hand-written configs only need to name what they change.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::geometry::Size;

/// Per-project export composition settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Output frame rate.
    pub fps: u32,

    /// Recording-clock time of the first screen frame. Click and cursor
    /// times are shifted by this so they share the render timeline's zero.
    pub recording_start_secs: f64,

    /// How the virtual camera follows the action.
    pub tracking: TrackingMode,

    pub zoom: ZoomTuning,

    pub cursor: CursorOverlayConfig,

    pub subtitles: SubtitleStyle,

    pub canvas: CanvasStyleConfig,

    pub pip: PipConfig,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 60,
            recording_start_secs: 0.0,
            tracking: TrackingMode::default(),
            zoom: ZoomTuning::default(),
            cursor: CursorOverlayConfig::default(),
            subtitles: SubtitleStyle::default(),
            canvas: CanvasStyleConfig::default(),
            pip: PipConfig::default(),
        }
    }
}

impl CompositionConfig {
    pub fn output_size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Zoom tracking behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrackingMode {
    /// No zoom; frames pass through at full size.
    #[default]
    Passthrough,
    /// Zoom into each group of clicks, panning between clicks.
    ClickZoom,
    /// Keep a fixed-size window centered on the smoothed cursor.
    CursorFollow,
}

/// Timing and framing parameters for zoom sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomTuning {
    /// Duration of the zoom-in animation (seconds).
    pub zoom_in_secs: f64,

    /// Duration of the zoom-out animation (seconds).
    pub zoom_out_secs: f64,

    /// Time fully zoomed in before the first click of a group.
    pub pre_click_pause_secs: f64,

    /// Time the frame holds on a click before panning on or zooming out.
    pub post_click_pause_secs: f64,

    /// A gap at or above this starts a new click group.
    pub group_gap_secs: f64,

    /// Padding per axis as a fraction of the click extent.
    pub padding_ratio: f64,

    /// Lower bound for padding per axis (output pixels).
    pub min_padding_px: f64,

    /// Pan speed used to shorten long pans (output pixels per second).
    pub pan_speed_px_per_sec: f64,

    /// Shortest pan a shortened pan may take (seconds).
    pub min_pan_secs: f64,

    /// Pans are shortened when the next click is farther than this fraction
    /// of the current box's half extent.
    pub pan_trigger_ratio: f64,

    /// Upper bound on the magnification factor.
    pub max_zoom: f64,

    /// Follow-box width in cursor-follow mode (output pixels).
    pub follow_box_width: f64,

    /// Follow-box height in cursor-follow mode (output pixels).
    pub follow_box_height: f64,

    /// Half-width of the Gaussian cursor smoothing window (seconds).
    pub smoothing_window_secs: f64,
}

impl Default for ZoomTuning {
    fn default() -> Self {
        Self {
            zoom_in_secs: 1.0,
            zoom_out_secs: 1.0,
            pre_click_pause_secs: 0.4,
            post_click_pause_secs: 0.4,
            group_gap_secs: 3.0,
            padding_ratio: 0.3,
            min_padding_px: 150.0,
            pan_speed_px_per_sec: 800.0,
            min_pan_secs: 0.3,
            pan_trigger_ratio: 0.7,
            max_zoom: 2.2,
            follow_box_width: 1200.0,
            follow_box_height: 900.0,
            smoothing_window_secs: 0.1,
        }
    }
}

/// What to draw at the cursor before zooming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CursorOverlayStyle {
    #[default]
    None,
    /// Expanding ring at each recent click.
    ClickHighlight,
    /// A scaled-up pointer sprite at the smoothed cursor.
    EnlargedPointer,
}

/// Cursor overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorOverlayConfig {
    pub style: CursorOverlayStyle,

    /// How long a click ring stays visible.
    pub highlight_duration_secs: f64,

    /// Final ring radius in source pixels.
    pub highlight_radius: f64,

    /// Ring color as hex (`#rrggbb` or `#rrggbbaa`).
    pub highlight_color: String,

    /// Pointer sprite scale relative to a 24 px arrow.
    pub pointer_scale: f64,
}

impl Default for CursorOverlayConfig {
    fn default() -> Self {
        Self {
            style: CursorOverlayStyle::None,
            highlight_duration_secs: 0.5,
            highlight_radius: 40.0,
            highlight_color: "#ffd54fcc".to_string(),
            pointer_scale: 2.0,
        }
    }
}

/// Burned-in subtitle appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleStyle {
    pub enabled: bool,

    /// TrueType/OpenType font. Unset means the embedded DejaVu Sans.
    pub font_path: Option<PathBuf>,

    /// Glyph height in output pixels.
    pub font_size: f32,

    pub text_color: String,

    /// Fill of the rounded box behind the text.
    pub box_color: String,

    /// Distance from the frame bottom to the box bottom.
    pub bottom_margin: u32,

    /// Space between text and box edge.
    pub box_padding: u32,

    pub corner_radius: u32,
}

impl Default for SubtitleStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            font_path: None,
            font_size: 42.0,
            text_color: "#ffffff".to_string(),
            box_color: "#000000b3".to_string(),
            bottom_margin: 60,
            box_padding: 16,
            corner_radius: 12,
        }
    }
}

/// Canvas fill behind the framed recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    /// Solid color as hex string (for example `#1a1a1a`).
    Color { color: String },
    /// Image scaled to fill the canvas and center-cropped.
    Image { path: PathBuf },
}

impl Default for Background {
    fn default() -> Self {
        Self::Color {
            color: "#1a1a1a".to_string(),
        }
    }
}

/// Canvas/background styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasStyleConfig {
    pub enabled: bool,

    pub background: Background,

    /// Rounded corner radius in output pixels.
    pub corner_radius: u32,

    /// Shadow intensity multiplier in `[0.0, 1.0]`. Zero disables the shadow.
    pub shadow_intensity: f64,

    /// Blur radius of the drop shadow.
    pub shadow_blur: f32,

    /// Padding around the content window in output pixels.
    pub padding: u32,
}

impl Default for CanvasStyleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            background: Background::default(),
            corner_radius: 20,
            shadow_intensity: 0.60,
            shadow_blur: 18.0,
            padding: 56,
        }
    }
}

/// Picture-in-picture camera overlay settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipConfig {
    pub enabled: bool,

    /// Rounded corner radius in output pixels.
    pub corner_radius: u32,
}

impl Default for PipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            corner_radius: 16,
        }
    }
}

/// Parse `#rrggbb` or `#rrggbbaa` into RGBA bytes.
pub fn parse_hex_color(hex: &str) -> Option<[u8; 4]> {
    let digits = hex.trim().strip_prefix('#')?;
    if !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
    match digits.len() {
        6 => Some([channel(0)?, channel(2)?, channel(4)?, 255]),
        8 => Some([channel(0)?, channel(2)?, channel(4)?, channel(6)?]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: CompositionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, CompositionConfig::default());
        assert_eq!(config.tracking, TrackingMode::Passthrough);
        assert!((config.zoom.max_zoom - 2.2).abs() < 1e-9);
        assert!((config.zoom.pan_speed_px_per_sec - 800.0).abs() < 1e-9);
        assert!(!config.canvas.enabled);
    }

    #[test]
    fn test_partial_blocks() {
        let raw = r##"{
            "tracking": "click_zoom",
            "zoom": {"max_zoom": 3.0},
            "canvas": {"enabled": true, "background": {"kind": "image", "path": "bg.png"}},
            "cursor": {"style": "enlarged_pointer"}
        }"##;
        let config: CompositionConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.tracking, TrackingMode::ClickZoom);
        assert!((config.zoom.max_zoom - 3.0).abs() < 1e-9);
        assert!((config.zoom.zoom_in_secs - 1.0).abs() < 1e-9);
        assert_eq!(
            config.canvas.background,
            Background::Image {
                path: PathBuf::from("bg.png")
            }
        );
        assert_eq!(config.canvas.padding, 56);
        assert_eq!(config.cursor.style, CursorOverlayStyle::EnlargedPointer);
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#1a1a1a"), Some([0x1a, 0x1a, 0x1a, 255]));
        assert_eq!(parse_hex_color("#000000b3"), Some([0, 0, 0, 0xb3]));
        assert_eq!(parse_hex_color("1a1a1a"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }
}
