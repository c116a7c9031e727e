//! Frame compositor: turns one source frame and its timestamp into one
//! output frame.
//!
//! Stages run in a fixed order, each on the previous stage's full output:
//!
//! ```text
//! source ── resize to video ── cursor overlay ── zoom crop ── subtitles ── canvas ── picture-in-picture
//! ```
//!
//! A stage that cannot produce a result leaves the frame as it was. Only an
//! unreadable source frame or an unallocatable output fails the frame.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use zoomreel_common::error::{ZoomreelError, ZoomreelResult};
use zoomreel_processing_core::cursor_smooth::CursorSmoother;
use zoomreel_processing_core::zoom::{ZoomState, ZoomStateResolver};
use zoomreel_project_model::composition::CompositionConfig;
use zoomreel_project_model::event::{ClickEvent, CursorSample, OverlayPlacementEvent};
use zoomreel_project_model::geometry::Size;
use zoomreel_project_model::project::LoadedProject;
use zoomreel_project_model::subtitle::SubtitleEntry;

use crate::context::SharedRenderContext;
use crate::cursor_overlay::{apply_cursor_overlay, CursorOverlayInput};
use crate::pip::{apply_pip, CameraFeed};
use crate::progress::ProgressTracker;
use crate::source::{CameraFrameSource, FrameSource};
use crate::subtitle_burn::burn_subtitle;
use crate::zoom_crop::apply_zoom;

/// Event streams a composition reads. Each stream must be time-ordered.
#[derive(Debug, Clone, Default)]
pub struct EventStreams {
    pub clicks: Vec<ClickEvent>,
    pub cursor: Vec<CursorSample>,
    pub overlay: Vec<OverlayPlacementEvent>,
    pub subtitles: Vec<SubtitleEntry>,
}

impl EventStreams {
    pub fn from_project(project: &LoadedProject) -> Self {
        Self {
            clicks: project.clicks.clone(),
            cursor: project.cursor.clone(),
            overlay: project.overlay.clone(),
            subtitles: project.subtitles.clone(),
        }
    }
}

/// Per-export compositor. Safe to call from many render threads at once.
pub struct FrameCompositor {
    config: CompositionConfig,
    video: Size,
    streams: EventStreams,
    smoother: Arc<CursorSmoother>,
    resolver: ZoomStateResolver,
    context: SharedRenderContext,
    camera: Option<CameraFeed>,
    progress: Arc<ProgressTracker>,
}

impl FrameCompositor {
    /// Build a compositor for `config`.
    ///
    /// `cache_capacity` bounds the cursor smoother's memo cache.
    pub fn new(
        config: CompositionConfig,
        streams: EventStreams,
        progress: Arc<ProgressTracker>,
        cache_capacity: usize,
    ) -> Self {
        let video = config.output_size();
        let smoother = Arc::new(CursorSmoother::new(
            &streams.cursor,
            video,
            config.recording_start_secs,
            config.zoom.smoothing_window_secs,
            cache_capacity,
        ));
        let resolver = ZoomStateResolver::from_config(&config, &streams.clicks, Arc::clone(&smoother));

        tracing::debug!(
            width = video.width,
            height = video.height,
            tracking = ?config.tracking,
            clicks = streams.clicks.len(),
            cursor_samples = streams.cursor.len(),
            sessions = resolver.sessions().len(),
            "Built frame compositor"
        );

        Self {
            config,
            video,
            streams,
            smoother,
            resolver,
            context: SharedRenderContext::new(),
            camera: None,
            progress,
        }
    }

    /// Attach a camera for picture-in-picture, starting `start_offset_secs`
    /// into the render timeline.
    pub fn with_camera(mut self, reader: Box<dyn CameraFrameSource>, start_offset_secs: f64) -> Self {
        self.camera = Some(CameraFeed::new(reader, start_offset_secs));
        self
    }

    pub fn config(&self) -> &CompositionConfig {
        &self.config
    }

    /// Size frames are composited at before the canvas stage.
    pub fn video_size(&self) -> Size {
        self.video
    }

    /// Size of every output frame.
    pub fn output_size(&self) -> Size {
        self.context
            .get_or_init(&self.config)
            .canvas_size()
            .unwrap_or(self.video)
    }

    pub fn resolver(&self) -> &ZoomStateResolver {
        &self.resolver
    }

    pub fn smoother(&self) -> &CursorSmoother {
        &self.smoother
    }

    pub fn progress(&self) -> &Arc<ProgressTracker> {
        &self.progress
    }

    pub fn zoom_state_at(&self, t: f64) -> ZoomState {
        self.resolver.resolve(t)
    }

    /// Composite `source`, presented at render time `t`.
    pub fn composite(&self, source: RgbaImage, t: f64) -> ZoomreelResult<RgbaImage> {
        check_allocatable(self.video)?;
        if source.width() == 0 || source.height() == 0 {
            return Err(ZoomreelError::source_frame(t, "empty source frame"));
        }

        let ctx = self.context.get_or_init(&self.config);

        let mut frame = if source.dimensions() == (self.video.width, self.video.height) {
            source
        } else {
            imageops::resize(&source, self.video.width, self.video.height, FilterType::Lanczos3)
        };

        let cursor_input = CursorOverlayInput {
            config: &self.config.cursor,
            clicks: &self.streams.clicks,
            smoother: &self.smoother,
            recording_start_secs: self.config.recording_start_secs,
        };
        apply_cursor_overlay(&mut frame, t, &cursor_input, &ctx);

        let state = self.resolver.resolve(t);
        if let Some(zoomed) = apply_zoom(&frame, &state, self.config.zoom.max_zoom) {
            frame = zoomed;
        }

        burn_subtitle(&mut frame, &self.streams.subtitles, t, &self.config.subtitles, &ctx);

        if let Some(canvas) = &ctx.canvas {
            frame = canvas.apply(&frame);
        }

        if self.config.pip.enabled {
            if let Some(camera) = &self.camera {
                apply_pip(
                    &mut frame,
                    &self.streams.overlay,
                    t,
                    camera,
                    self.config.pip.corner_radius as f32,
                );
            }
        }

        self.progress.update(t);
        Ok(frame)
    }

    /// Read frame `index` from `source` and composite it.
    ///
    /// Read failures surface as [`ZoomreelError::SourceFrame`] for that frame.
    pub fn render_frame(&self, source: &dyn FrameSource, index: usize) -> ZoomreelResult<RgbaImage> {
        let t = source.timestamp_of(index);
        let frame = source.read_frame(index).map_err(|e| match e {
            ZoomreelError::SourceFrame { .. } => e,
            other => ZoomreelError::source_frame(t, other.to_string()),
        })?;
        self.composite(frame, t)
    }
}

impl std::fmt::Debug for FrameCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCompositor")
            .field("video", &self.video)
            .field("tracking", &self.config.tracking)
            .field("smoother", &self.smoother)
            .field("camera", &self.camera)
            .finish_non_exhaustive()
    }
}

fn check_allocatable(size: Size) -> ZoomreelResult<()> {
    if size.is_empty() {
        return Err(ZoomreelError::render(format!(
            "Output size {}x{} is empty",
            size.width, size.height
        )));
    }
    let bytes = (size.width as usize)
        .checked_mul(size.height as usize)
        .and_then(|px| px.checked_mul(4));
    if bytes.is_none() {
        return Err(ZoomreelError::render(format!(
            "Output size {}x{} overflows the frame buffer",
            size.width, size.height
        )));
    }
    Ok(())
}
