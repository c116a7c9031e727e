//! Export driver: renders every source frame of a project through the
//! compositor and hands the results to a render backend.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;
use zoomreel_common::clock::StreamAlignment;
use zoomreel_common::error::{ZoomreelError, ZoomreelResult};
use zoomreel_project_model::geometry::Size;
use zoomreel_project_model::project::{LoadedProject, Tracks};

use crate::compositor::{EventStreams, FrameCompositor};
use crate::progress::ProgressTracker;
use crate::source::{FrameSource, ImageSequenceSource};

/// Default bound on memoized smoothed cursor positions.
pub const DEFAULT_SMOOTHING_CACHE: usize = 8192;

/// How often the progress callback fires while frames render.
const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// An export job ready to be rendered.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Project root directory.
    pub project_dir: PathBuf,

    /// Directory of screen frames (image sequence).
    pub frames_dir: PathBuf,

    /// Directory of camera frames for picture-in-picture.
    pub camera_dir: Option<PathBuf>,

    /// Where composited frames are written.
    pub output_dir: PathBuf,

    /// Screen frame rate. Defaults to the recording fps.
    pub source_fps: Option<f64>,

    /// Camera frame rate. Defaults to the screen frame rate.
    pub camera_fps: Option<f64>,

    /// Render threads; zero lets rayon decide.
    pub worker_threads: usize,

    pub smoothing_cache_capacity: usize,

    /// Abort on the first unreadable frame instead of skipping it.
    pub fail_fast: bool,
}

impl ExportJob {
    pub fn new(
        project_dir: impl Into<PathBuf>,
        frames_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project_dir: project_dir.into(),
            frames_dir: frames_dir.into(),
            camera_dir: None,
            output_dir: output_dir.into(),
            source_fps: None,
            camera_fps: None,
            worker_threads: 0,
            smoothing_cache_capacity: DEFAULT_SMOOTHING_CACHE,
            fail_fast: false,
        }
    }
}

/// Progress callback for export rendering.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send>;

/// Export progress report.
#[derive(Debug, Clone)]
pub struct ExportProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    /// Frames rendered so far.
    pub frames_rendered: u64,

    /// Total frames to render.
    pub total_frames: u64,

    /// Estimated time remaining in seconds.
    pub eta_secs: f64,

    /// Current stage.
    pub stage: ExportStage,
}

/// Stages of the export process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Preparing,
    Rendering,
    Finalizing,
    Complete,
    Failed,
}

/// Outcome of a finished export.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub backend: String,
    pub frames_written: u64,
    pub frames_failed: u64,
    pub elapsed_secs: f64,
}

/// Destination for composited frames.
///
/// `write_frame` is called from many render threads, in any frame order.
pub trait RenderBackend: Send + Sync {
    /// Called once before any frame is written.
    fn prepare(&self, frame_size: Size, total_frames: usize) -> ZoomreelResult<()>;

    fn write_frame(&self, index: usize, frame: &RgbaImage) -> ZoomreelResult<()>;

    /// Called once after the last frame. Returns the output location.
    fn finish(&self) -> ZoomreelResult<PathBuf>;

    /// Backend name.
    fn name(&self) -> &str;
}

/// Writes numbered PNG files (`frame_000000.png`, ...).
#[derive(Debug, Clone)]
pub struct PngSequenceBackend {
    dir: PathBuf,
}

impl PngSequenceBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{index:06}.png"))
    }
}

impl RenderBackend for PngSequenceBackend {
    fn prepare(&self, frame_size: Size, total_frames: usize) -> ZoomreelResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        tracing::info!(
            dir = %self.dir.display(),
            width = frame_size.width,
            height = frame_size.height,
            total_frames,
            "Writing PNG sequence"
        );
        Ok(())
    }

    fn write_frame(&self, index: usize, frame: &RgbaImage) -> ZoomreelResult<()> {
        let path = self.frame_path(index);
        frame
            .save(&path)
            .map_err(|e| ZoomreelError::render(format!("Failed to write {}: {e}", path.display())))
    }

    fn finish(&self) -> ZoomreelResult<PathBuf> {
        Ok(self.dir.clone())
    }

    fn name(&self) -> &str {
        "png-sequence"
    }
}

/// Export the project as composited frames.
///
/// This is the main entry point for rendering.
pub async fn export_project(
    job: ExportJob,
    progress: Option<ProgressCallback>,
) -> ZoomreelResult<ExportSummary> {
    let backend: Arc<dyn RenderBackend> = Arc::new(PngSequenceBackend::new(&job.output_dir));
    export_with_backend(job, backend, progress).await
}

/// Export through a caller-supplied backend.
pub async fn export_with_backend(
    job: ExportJob,
    backend: Arc<dyn RenderBackend>,
    progress: Option<ProgressCallback>,
) -> ZoomreelResult<ExportSummary> {
    let started = Instant::now();
    let report = |p: ExportProgress| {
        if let Some(cb) = &progress {
            cb(p);
        }
    };

    tracing::info!(
        project = %job.project_dir.display(),
        frames = %job.frames_dir.display(),
        output = %job.output_dir.display(),
        backend = backend.name(),
        "Starting export"
    );

    if !job.project_dir.exists() {
        return Err(ZoomreelError::FileNotFound {
            path: job.project_dir.clone(),
        });
    }

    report(ExportProgress {
        progress: 0.0,
        frames_rendered: 0,
        total_frames: 0,
        eta_secs: 0.0,
        stage: ExportStage::Preparing,
    });

    let prepared = match prepare(&job, backend.as_ref()) {
        Ok(prepared) => prepared,
        Err(e) => {
            report(failed_progress(0, 0));
            return Err(e);
        }
    };
    let total_frames = prepared.source.frame_count() as u64;
    let counters = Arc::new(RenderCounters::default());

    let render = {
        let compositor = Arc::clone(&prepared.compositor);
        let source = Arc::clone(&prepared.source);
        let backend = Arc::clone(&backend);
        let counters = Arc::clone(&counters);
        let threads = job.worker_threads;
        let fail_fast = job.fail_fast;
        tokio::task::spawn_blocking(move || {
            render_all(&compositor, source.as_ref(), backend.as_ref(), &counters, threads, fail_fast)
        })
    };
    tokio::pin!(render);

    let mut ticker = tokio::time::interval(PROGRESS_POLL_INTERVAL);
    let outcome = loop {
        tokio::select! {
            joined = &mut render => {
                break joined.map_err(|e| ZoomreelError::render(format!("Render task failed: {e}")))
                    .and_then(|result| result);
            }
            _ = ticker.tick() => {
                report(progress_report(
                    prepared.compositor.progress().progress(),
                    counters.done(),
                    total_frames,
                    started.elapsed().as_secs_f64(),
                ));
            }
        }
    };

    if let Err(e) = outcome {
        tracing::error!(error = %e, "Export failed");
        report(failed_progress(counters.done(), total_frames));
        return Err(e);
    }

    report(ExportProgress {
        progress: 1.0,
        frames_rendered: counters.done(),
        total_frames,
        eta_secs: 0.0,
        stage: ExportStage::Finalizing,
    });
    let output_dir = backend.finish()?;

    let summary = ExportSummary {
        output_dir,
        backend: backend.name().to_string(),
        frames_written: counters.written.load(Ordering::Relaxed),
        frames_failed: counters.failed.load(Ordering::Relaxed),
        elapsed_secs: started.elapsed().as_secs_f64(),
    };
    write_report(&job.output_dir, &summary);

    tracing::info!(
        frames_written = summary.frames_written,
        frames_failed = summary.frames_failed,
        elapsed_secs = summary.elapsed_secs,
        "Export complete"
    );
    report(ExportProgress {
        progress: 1.0,
        frames_rendered: counters.done(),
        total_frames,
        eta_secs: 0.0,
        stage: ExportStage::Complete,
    });

    Ok(summary)
}

struct PreparedExport {
    compositor: Arc<FrameCompositor>,
    source: Arc<ImageSequenceSource>,
}

fn prepare(job: &ExportJob, backend: &dyn RenderBackend) -> ZoomreelResult<PreparedExport> {
    let project = LoadedProject::load(&job.project_dir)
        .map_err(|e| ZoomreelError::project(e.to_string()))?;
    for issue in project.data_issues() {
        tracing::warn!(issue = %issue, "Project data issue");
    }

    let fps = job
        .source_fps
        .unwrap_or(project.project.recording.fps as f64);
    let source = ImageSequenceSource::open(&job.frames_dir, fps)?;

    let composition = project.project.composition.clone();
    let tracker = Arc::new(ProgressTracker::new(timeline_end_secs(&source)));
    let mut compositor = FrameCompositor::new(
        composition,
        EventStreams::from_project(&project),
        tracker,
        job.smoothing_cache_capacity,
    );

    if let Some(camera_dir) = &job.camera_dir {
        match ImageSequenceSource::open(camera_dir, job.camera_fps.unwrap_or(fps)) {
            Ok(camera) => {
                let offset = camera_offset_secs(&project.project.tracks);
                tracing::info!(
                    dir = %camera_dir.display(),
                    offset_secs = offset,
                    "Attaching camera overlay"
                );
                compositor = compositor.with_camera(Box::new(camera), offset);
            }
            Err(e) => {
                tracing::warn!(
                    dir = %camera_dir.display(),
                    error = %e,
                    "Camera frames unavailable, exporting without picture-in-picture"
                );
            }
        }
    }

    backend.prepare(compositor.output_size(), source.frame_count())?;

    Ok(PreparedExport {
        compositor: Arc::new(compositor),
        source: Arc::new(source),
    })
}

/// Timestamp of the last frame: the point at which progress reads 1.0.
fn timeline_end_secs(source: &dyn FrameSource) -> f64 {
    match source.frame_count() {
        0 => 0.0,
        n => source.timestamp_of(n - 1),
    }
}

/// Camera start on the render timeline, relative to the screen track.
pub fn camera_offset_secs(tracks: &Tracks) -> f64 {
    match (&tracks.screen, &tracks.camera) {
        (Some(screen), Some(camera)) => {
            StreamAlignment::new(screen.offset_ns).relative_offset_secs(camera.offset_ns)
        }
        _ => 0.0,
    }
}

#[derive(Debug, Default)]
struct RenderCounters {
    written: AtomicU64,
    failed: AtomicU64,
    abort: AtomicBool,
    first_error: Mutex<Option<ZoomreelError>>,
}

impl RenderCounters {
    fn done(&self) -> u64 {
        self.written.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
    }

    fn abort_with(&self, err: ZoomreelError) {
        self.abort.store(true, Ordering::SeqCst);
        let mut first = self.first_error.lock();
        if first.is_none() {
            *first = Some(err);
        }
    }
}

fn render_all(
    compositor: &FrameCompositor,
    source: &dyn FrameSource,
    backend: &dyn RenderBackend,
    counters: &RenderCounters,
    threads: usize,
    fail_fast: bool,
) -> ZoomreelResult<()> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("zoomreel-render-{i}"));
    if threads > 0 {
        builder = builder.num_threads(threads);
    }
    let pool = builder
        .build()
        .map_err(|e| ZoomreelError::render(format!("Failed to start render threads: {e}")))?;

    pool.install(|| {
        (0..source.frame_count()).into_par_iter().for_each(|index| {
            if counters.abort.load(Ordering::SeqCst) {
                return;
            }
            let rendered = compositor
                .render_frame(source, index)
                .and_then(|frame| backend.write_frame(index, &frame));
            match rendered {
                Ok(()) => {
                    counters.written.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) if e.is_frame_local() && !fail_fast => {
                    tracing::warn!(index, error = %e, "Skipping unreadable frame");
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    counters.abort_with(e);
                }
            }
        });
    });

    match counters.first_error.lock().take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn write_report(output_dir: &Path, summary: &ExportSummary) {
    let path = output_dir.join("export-report.json");
    let written = serde_json::to_string_pretty(summary)
        .map_err(ZoomreelError::from)
        .and_then(|json| std::fs::write(&path, json).map_err(ZoomreelError::from));
    if let Err(e) = written {
        tracing::warn!(path = %path.display(), error = %e, "Failed to write export report");
    }
}

fn failed_progress(frames_rendered: u64, total_frames: u64) -> ExportProgress {
    ExportProgress {
        progress: 0.0,
        frames_rendered,
        total_frames,
        eta_secs: 0.0,
        stage: ExportStage::Failed,
    }
}

fn progress_report(
    progress: f64,
    frames_rendered: u64,
    total_frames: u64,
    elapsed_secs: f64,
) -> ExportProgress {
    let progress = progress.clamp(0.0, 1.0);
    let eta_secs = if progress > 0.0 {
        (elapsed_secs / progress) - elapsed_secs
    } else {
        0.0
    }
    .max(0.0);

    ExportProgress {
        progress,
        frames_rendered,
        total_frames,
        eta_secs,
        stage: ExportStage::Rendering,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::write_test_sequence;
    use zoomreel_project_model::project::TrackRef;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("zoomreel-export-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn track(offset_ns: i64) -> TrackRef {
        TrackRef {
            path: "sources/x".to_string(),
            duration_secs: 1.0,
            format: "png".to_string(),
            offset_ns,
        }
    }

    #[test]
    fn test_progress_report_eta() {
        let p = progress_report(0.25, 10, 40, 3.0);
        assert_eq!(p.stage, ExportStage::Rendering);
        assert!((p.eta_secs - 9.0).abs() < 1e-9);

        let idle = progress_report(0.0, 0, 40, 3.0);
        assert_eq!(idle.eta_secs, 0.0);
        assert_eq!(progress_report(7.0, 40, 40, 1.0).progress, 1.0);
    }

    #[test]
    fn test_camera_offset_from_tracks() {
        let mut tracks = Tracks::default();
        assert_eq!(camera_offset_secs(&tracks), 0.0);
        tracks.screen = Some(track(1_000_000_000));
        tracks.camera = Some(track(1_250_000_000));
        assert!((camera_offset_secs(&tracks) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_progress_total_ends_at_last_frame() {
        let root = temp_dir("progress-total");
        LoadedProject::create(&root, "demo", 32, 24, 10).unwrap();
        let frames = root.join("sources").join("screen");
        write_test_sequence(&frames, 5, 32, 24);

        let out = root.join("exports").join("frames");
        let job = ExportJob::new(&root, &frames, &out);
        let prepared = prepare(&job, &PngSequenceBackend::new(&out)).unwrap();
        assert!((prepared.compositor.progress().total() - 0.4).abs() < 1e-9);

        for index in 0..prepared.source.frame_count() {
            prepared
                .compositor
                .render_frame(prepared.source.as_ref(), index)
                .unwrap();
        }
        assert_eq!(prepared.compositor.progress().progress(), 1.0);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_export_writes_every_frame() {
        let root = temp_dir("all");
        LoadedProject::create(&root, "demo", 32, 24, 10).unwrap();
        let frames = root.join("sources").join("screen");
        write_test_sequence(&frames, 5, 32, 24);

        let reports = Arc::new(Mutex::new(vec![]));
        let sink = Arc::clone(&reports);
        let callback: ProgressCallback = Box::new(move |p: ExportProgress| sink.lock().push(p.stage));

        let out = root.join("exports").join("frames");
        let mut job = ExportJob::new(&root, &frames, &out);
        job.worker_threads = 2;
        let summary = export_project(job, Some(callback)).await.unwrap();

        assert_eq!(summary.frames_written, 5);
        assert_eq!(summary.frames_failed, 0);
        assert!(out.join("frame_000004.png").exists());
        assert!(out.join("export-report.json").exists());

        let stages = reports.lock().clone();
        assert_eq!(stages.first(), Some(&ExportStage::Preparing));
        assert_eq!(stages.last(), Some(&ExportStage::Complete));
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_unreadable_frame_is_skipped_or_fatal() {
        let root = temp_dir("corrupt");
        LoadedProject::create(&root, "demo", 16, 16, 10).unwrap();
        let frames = root.join("sources").join("screen");
        write_test_sequence(&frames, 4, 16, 16);
        std::fs::write(frames.join("frame_000002.png"), b"garbage").unwrap();

        let out = root.join("exports").join("frames");
        let summary = export_project(ExportJob::new(&root, &frames, &out), None)
            .await
            .unwrap();
        assert_eq!(summary.frames_written, 3);
        assert_eq!(summary.frames_failed, 1);
        assert!(!out.join("frame_000002.png").exists());

        let mut strict = ExportJob::new(&root, &frames, root.join("exports").join("strict"));
        strict.fail_fast = true;
        let err = export_project(strict, None).await.unwrap_err();
        assert!(err.is_frame_local());
        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn test_missing_project_dir() {
        let root = temp_dir("missing");
        let err = export_project(ExportJob::new(&root, root.join("f"), root.join("o")), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ZoomreelError::FileNotFound { .. }));
    }
}
