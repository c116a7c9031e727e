//! Picture-in-picture stage: the camera feed in its recorded placement.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use parking_lot::Mutex;
use zoomreel_common::error::ZoomreelResult;
use zoomreel_processing_core::overlay::active_overlay;
use zoomreel_project_model::event::OverlayPlacementEvent;
use zoomreel_project_model::geometry::Size;

use crate::draw::{aspect_fill, round_corners};
use crate::source::CameraFrameSource;

/// A camera reader plus its start offset on the render timeline.
///
/// The reader is stateful, so fetches from concurrent frames serialize on
/// its lock.
pub struct CameraFeed {
    reader: Mutex<Box<dyn CameraFrameSource>>,
    start_offset_secs: f64,
}

impl CameraFeed {
    pub fn new(reader: Box<dyn CameraFrameSource>, start_offset_secs: f64) -> Self {
        Self {
            reader: Mutex::new(reader),
            start_offset_secs,
        }
    }

    pub fn start_offset_secs(&self) -> f64 {
        self.start_offset_secs
    }

    /// Camera frame for render time `t`.
    pub fn frame_for(&self, t: f64) -> ZoomreelResult<RgbaImage> {
        let local = (t - self.start_offset_secs).max(0.0);
        self.reader.lock().frame_at(local)
    }
}

impl std::fmt::Debug for CameraFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraFeed")
            .field("start_offset_secs", &self.start_offset_secs)
            .finish_non_exhaustive()
    }
}

/// Composite the camera frame into the placement active at `t`.
///
/// Returns whether the overlay was drawn. Missing placements, degenerate
/// rects and camera read failures leave the frame unchanged.
pub fn apply_pip(
    frame: &mut RgbaImage,
    placements: &[OverlayPlacementEvent],
    t: f64,
    camera: &CameraFeed,
    corner_radius: f32,
) -> bool {
    let Some(placement) = active_overlay(placements, t) else {
        return false;
    };
    let canvas = Size::new(frame.width(), frame.height());
    let Some(rect) = placement.rect_in(canvas) else {
        tracing::debug!(t, ?placement, "Degenerate overlay placement, skipping camera");
        return false;
    };

    let camera_frame = match camera.frame_for(t) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!(t, error = %e, "Camera frame unavailable, skipping overlay");
            return false;
        }
    };

    let mut window = aspect_fill(&camera_frame, rect.width, rect.height, FilterType::CatmullRom);
    round_corners(&mut window, corner_radius);
    imageops::overlay(frame, &window, rect.x, rect.y);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use std::sync::Arc;
    use zoomreel_common::error::ZoomreelError;

    /// Solid-color camera that records every requested time.
    struct FakeCamera {
        requests: Arc<Mutex<Vec<f64>>>,
        fail: bool,
    }

    impl CameraFrameSource for FakeCamera {
        fn frame_at(&mut self, secs: f64) -> ZoomreelResult<RgbaImage> {
            self.requests.lock().push(secs);
            if self.fail {
                return Err(ZoomreelError::source_frame(secs, "decoder stalled"));
            }
            Ok(RgbaImage::from_pixel(40, 30, Rgba([0, 255, 0, 255])))
        }
    }

    fn feed(offset: f64, fail: bool) -> (CameraFeed, Arc<Mutex<Vec<f64>>>) {
        let requests = Arc::new(Mutex::new(vec![]));
        let camera = FakeCamera {
            requests: Arc::clone(&requests),
            fail,
        };
        (CameraFeed::new(Box::new(camera), offset), requests)
    }

    fn black() -> RgbaImage {
        RgbaImage::from_pixel(200, 100, Rgba([0, 0, 0, 255]))
    }

    #[test]
    fn test_overlay_drawn_in_resolved_rect() {
        let (camera, requests) = feed(1.5, false);
        let placements = vec![
            OverlayPlacementEvent::new(0.0, 0.0, 0.0, 0.25, 0.5),
            OverlayPlacementEvent::new(5.0, 0.5, 0.5, 0.25, 0.5),
        ];
        let mut frame = black();
        assert!(apply_pip(&mut frame, &placements, 6.0, &camera, 0.0));

        let inside = frame.get_pixel(120, 70);
        assert!(inside[1] > 250 && inside[0] < 5);
        assert_eq!(*frame.get_pixel(20, 20), Rgba([0, 0, 0, 255]));
        assert_eq!(requests.lock().as_slice(), &[4.5]);
    }

    #[test]
    fn test_camera_time_never_negative() {
        let (camera, requests) = feed(3.0, false);
        let placements = vec![OverlayPlacementEvent::new(0.0, 0.1, 0.1, 0.2, 0.2)];
        let mut frame = black();
        apply_pip(&mut frame, &placements, 1.0, &camera, 4.0);
        assert_eq!(requests.lock().as_slice(), &[0.0]);
    }

    #[test]
    fn test_failures_pass_through() {
        let (camera, _) = feed(0.0, true);
        let placements = vec![OverlayPlacementEvent::new(0.0, 0.1, 0.1, 0.2, 0.2)];
        let mut frame = black();
        assert!(!apply_pip(&mut frame, &placements, 1.0, &camera, 4.0));
        assert!(frame.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));

        let (camera, requests) = feed(0.0, false);
        assert!(!apply_pip(&mut frame, &[], 1.0, &camera, 4.0));
        let degenerate = vec![OverlayPlacementEvent::new(0.0, 0.1, 0.1, 0.0, 0.2)];
        assert!(!apply_pip(&mut frame, &degenerate, 1.0, &camera, 4.0));
        assert!(requests.lock().is_empty());
    }

    #[test]
    fn test_oversized_placement_passes_through() {
        let (camera, requests) = feed(0.0, false);
        let placements = vec![OverlayPlacementEvent::new(0.0, 0.1, 0.1, 1.0e7, 1.0e7)];
        let mut frame = black();
        assert!(!apply_pip(&mut frame, &placements, 1.0, &camera, 4.0));
        assert!(frame.pixels().all(|p| *p == Rgba([0, 0, 0, 255])));
        assert!(requests.lock().is_empty());
    }

    #[test]
    fn test_placement_past_the_edge_is_clipped() {
        let (camera, _) = feed(0.0, false);
        let placements = vec![OverlayPlacementEvent::new(0.0, 0.75, 0.5, 0.5, 0.75)];
        let mut frame = black();
        assert!(apply_pip(&mut frame, &placements, 1.0, &camera, 0.0));
        assert_eq!(frame.dimensions(), (200, 100));
        let corner = frame.get_pixel(199, 99);
        assert!(corner[1] > 250 && corner[0] < 5);
        assert_eq!(*frame.get_pixel(140, 40), Rgba([0, 0, 0, 255]));
    }
}
