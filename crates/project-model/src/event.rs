//! Recorded event streams.
//!
//! Streams are stored as append-only JSONL, one event per line. Lines starting
//! with `#` carry stream headers and are skipped on parse.
//!
//! Click and cursor coordinates are pixels of the reference surface (top-left
//! origin) together with that surface's size. Overlay placement rectangles are
//! fractions of the output canvas.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::geometry::{PixelRect, Point2D, Size};

/// Anything carrying a position on the recording timeline.
pub trait TimedEvent {
    /// Event time in seconds.
    fn time_secs(&self) -> f64;
}

/// A mouse click captured during recording.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClickEvent {
    /// Capture time in seconds on the recording clock.
    #[serde(rename = "t")]
    pub captured_at_secs: f64,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "ref_w")]
    pub reference_width: u32,
    #[serde(rename = "ref_h")]
    pub reference_height: u32,
}

impl ClickEvent {
    pub fn new(
        captured_at_secs: f64,
        x: f64,
        y: f64,
        reference_width: u32,
        reference_height: u32,
    ) -> Self {
        Self {
            captured_at_secs,
            x,
            y,
            reference_width,
            reference_height,
        }
    }

    /// Position in video space (bottom-left origin) for the given output size.
    pub fn video_position(&self, video: Size) -> Point2D {
        video.reference_to_video(self.x, self.y, self.reference_width, self.reference_height)
    }
}

impl TimedEvent for ClickEvent {
    fn time_secs(&self) -> f64 {
        self.captured_at_secs
    }
}

/// A cursor position sampled once per captured source frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CursorSample {
    #[serde(rename = "t")]
    pub captured_at_secs: f64,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "ref_w")]
    pub reference_width: u32,
    #[serde(rename = "ref_h")]
    pub reference_height: u32,
}

impl CursorSample {
    pub fn new(
        captured_at_secs: f64,
        x: f64,
        y: f64,
        reference_width: u32,
        reference_height: u32,
    ) -> Self {
        Self {
            captured_at_secs,
            x,
            y,
            reference_width,
            reference_height,
        }
    }

    /// Position in video space (bottom-left origin) for the given output size.
    pub fn video_position(&self, video: Size) -> Point2D {
        video.reference_to_video(self.x, self.y, self.reference_width, self.reference_height)
    }
}

impl TimedEvent for CursorSample {
    fn time_secs(&self) -> f64 {
        self.captured_at_secs
    }
}

/// Where the picture-in-picture window sat from `elapsed_secs` onward.
///
/// Geometry is normalized to `[0, 1]` of the output canvas, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayPlacementEvent {
    #[serde(rename = "t")]
    pub elapsed_secs: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayPlacementEvent {
    pub fn new(elapsed_secs: f64, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            elapsed_secs,
            x,
            y,
            width,
            height,
        }
    }

    /// Resolve the normalized rectangle against a canvas, in frame space.
    ///
    /// The result is clipped to the canvas. Returns `None` when any field is
    /// non-finite or outside `[0, 1]`, or when the clipped rectangle rounds
    /// to zero area.
    pub fn rect_in(&self, canvas: Size) -> Option<PixelRect> {
        let fields = [self.x, self.y, self.width, self.height];
        if fields.iter().any(|v| !v.is_finite() || !(0.0..=1.0).contains(v)) {
            return None;
        }

        let x0 = (self.x * canvas.w()).round();
        let y0 = (self.y * canvas.h()).round();
        let x1 = ((self.x + self.width) * canvas.w()).round().min(canvas.w());
        let y1 = ((self.y + self.height) * canvas.h()).round().min(canvas.h());
        if x1 - x0 < 1.0 || y1 - y0 < 1.0 {
            return None;
        }

        Some(PixelRect::new(
            x0 as i64,
            y0 as i64,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        ))
    }
}

impl TimedEvent for OverlayPlacementEvent {
    fn time_secs(&self) -> f64 {
        self.elapsed_secs
    }
}

/// Index of the first event whose time precedes its predecessor's.
pub fn first_out_of_order<T: TimedEvent>(events: &[T]) -> Option<usize> {
    events
        .windows(2)
        .position(|pair| pair[1].time_secs() < pair[0].time_secs())
        .map(|i| i + 1)
}

/// Whether events are sorted by time (non-decreasing).
pub fn is_time_ordered<T: TimedEvent>(events: &[T]) -> bool {
    first_out_of_order(events).is_none()
}

/// Parse a JSONL event stream (one JSON object per line).
pub fn parse_jsonl<T: DeserializeOwned>(jsonl: &str) -> Result<Vec<T>, serde_json::Error> {
    jsonl
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(serde_json::from_str)
        .collect()
}

/// Serialize events to JSONL, optionally preceded by a `#` header line.
pub fn serialize_jsonl<T: Serialize>(
    events: &[T],
    header: Option<&str>,
) -> Result<String, serde_json::Error> {
    let mut output = String::new();
    if let Some(header) = header {
        output.push_str("# ");
        output.push_str(header);
        output.push('\n');
    }
    for event in events {
        output.push_str(&serde_json::to_string(event)?);
        output.push('\n');
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_json_format() {
        let click = ClickEvent::new(2.0, 100.0, 100.0, 1000, 1000);
        let json = serde_json::to_string(&click).unwrap();
        assert!(json.contains("\"t\":2.0"));
        assert!(json.contains("\"ref_w\":1000"));
        assert!(json.contains("\"ref_h\":1000"));
    }

    #[test]
    fn test_parse_jsonl_skips_header_and_blank_lines() {
        let jsonl = "# {\"stream\":\"cursor\"}\n\n{\"t\":0.5,\"x\":10,\"y\":20,\"ref_w\":100,\"ref_h\":100}\n";
        let parsed: Vec<CursorSample> = parse_jsonl(jsonl).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!((parsed[0].captured_at_secs - 0.5).abs() < 1e-9);
        assert!((parsed[0].y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_jsonl_write_then_read() {
        let events = vec![
            OverlayPlacementEvent::new(0.0, 0.7, 0.7, 0.25, 0.25),
            OverlayPlacementEvent::new(5.0, 0.05, 0.7, 0.25, 0.25),
        ];
        let jsonl = serialize_jsonl(&events, Some("overlay v1")).unwrap();
        assert!(jsonl.starts_with("# overlay v1\n"));
        let parsed: Vec<OverlayPlacementEvent> = parse_jsonl(&jsonl).unwrap();
        assert_eq!(parsed, events);
    }

    #[test]
    fn test_overlay_rect_resolves_in_frame_space() {
        let canvas = Size::new(200, 100);
        let rect = OverlayPlacementEvent::new(0.0, 0.5, 0.5, 0.25, 0.5).rect_in(canvas);
        assert_eq!(rect, Some(PixelRect::new(100, 50, 50, 50)));
    }

    #[test]
    fn test_overlay_rect_is_clipped_to_canvas() {
        let canvas = Size::new(200, 100);
        let rect = OverlayPlacementEvent::new(0.0, 0.8, 0.9, 0.5, 0.5).rect_in(canvas);
        assert_eq!(rect, Some(PixelRect::new(160, 90, 40, 10)));
    }

    #[test]
    fn test_overlay_rect_out_of_range_is_degenerate() {
        let canvas = Size::new(200, 100);
        for event in [
            OverlayPlacementEvent::new(0.0, 0.1, 0.1, 1.0e7, 1.0e7),
            OverlayPlacementEvent::new(0.0, -0.5, 0.1, 0.2, 0.2),
            OverlayPlacementEvent::new(0.0, 0.1, 1.5, 0.2, 0.2),
            OverlayPlacementEvent::new(0.0, 0.1, 0.1, 0.0, 0.2),
            OverlayPlacementEvent::new(0.0, 0.1, 0.1, f64::NAN, 0.2),
            OverlayPlacementEvent::new(0.0, 1.0, 0.1, 0.2, 0.2),
        ] {
            assert_eq!(event.rect_in(canvas), None, "{event:?}");
        }
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        let result: Result<Vec<ClickEvent>, _> = parse_jsonl("{\"t\":\"soon\"}\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_video_position_scales_and_flips() {
        let click = ClickEvent::new(0.0, 800.0, 800.0, 1000, 1000);
        let p = click.video_position(Size::new(1000, 1000));
        assert!((p.x - 800.0).abs() < 1e-9);
        assert!((p.y - 200.0).abs() < 1e-9);

        let sample = CursorSample::new(0.0, 1280.0, 360.0, 2560, 1440);
        let p = sample.video_position(Size::new(1920, 1080));
        assert!((p.x - 960.0).abs() < 1e-9);
        assert!((p.y - 810.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlay_rect_resolution() {
        let event = OverlayPlacementEvent::new(0.0, 0.75, 0.5, 0.2, 0.25);
        let rect = event.rect_in(Size::new(1920, 1080)).unwrap();
        assert_eq!(rect, PixelRect::new(1440, 540, 384, 270));

        assert!(OverlayPlacementEvent::new(0.0, 0.5, 0.5, 0.0, 0.2)
            .rect_in(Size::new(1920, 1080))
            .is_none());
        assert!(OverlayPlacementEvent::new(0.0, f64::NAN, 0.5, 0.2, 0.2)
            .rect_in(Size::new(1920, 1080))
            .is_none());
        assert!(OverlayPlacementEvent::new(0.0, 0.0, 0.0, 0.0001, 0.2)
            .rect_in(Size::new(100, 100))
            .is_none());
    }

    #[test]
    fn test_time_order_detection() {
        let ordered = vec![
            ClickEvent::new(1.0, 0.0, 0.0, 10, 10),
            ClickEvent::new(1.0, 0.0, 0.0, 10, 10),
            ClickEvent::new(2.0, 0.0, 0.0, 10, 10),
        ];
        assert!(is_time_ordered(&ordered));

        let unordered = vec![
            CursorSample::new(1.0, 0.0, 0.0, 10, 10),
            CursorSample::new(3.0, 0.0, 0.0, 10, 10),
            CursorSample::new(2.0, 0.0, 0.0, 10, 10),
        ];
        assert_eq!(first_out_of_order(&unordered), Some(2));
        assert!(is_time_ordered::<ClickEvent>(&[]));
    }
}
