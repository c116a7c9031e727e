//! Export a project to composited frames.

use std::io::Write;
use std::path::PathBuf;

use zoomreel_common::config::AppConfig;
use zoomreel_render_engine::export::{export_project, ExportJob, ExportProgress};

pub struct ExportArgs {
    pub path: PathBuf,
    pub frames: PathBuf,
    pub camera: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub fps: Option<f64>,
    pub camera_fps: Option<f64>,
    pub threads: Option<usize>,
    pub fail_fast: bool,
}

pub async fn run(config: &AppConfig, args: ExportArgs) -> anyhow::Result<()> {
    println!("Exporting project at: {}", args.path.display());

    let output_dir = args
        .output
        .unwrap_or_else(|| args.path.join("exports").join("frames"));

    let mut job = ExportJob::new(&args.path, &args.frames, &output_dir);
    job.camera_dir = args.camera;
    job.source_fps = args.fps;
    job.camera_fps = args.camera_fps;
    job.worker_threads = args.threads.unwrap_or(config.render.worker_threads);
    job.smoothing_cache_capacity = config.render.smoothing_cache_capacity;
    job.fail_fast = args.fail_fast;

    println!("  Frames: {}", job.frames_dir.display());
    if let Some(camera) = &job.camera_dir {
        println!("  Camera: {}", camera.display());
    }
    println!("  Output: {}", output_dir.display());

    let progress_cb: Box<dyn Fn(ExportProgress) + Send> = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames, ETA: {:.0}s)  ",
            p.progress * 100.0,
            p.frames_rendered,
            p.total_frames,
            p.eta_secs,
        );
        let _ = std::io::stdout().flush();
    });

    match export_project(job, Some(progress_cb)).await {
        Ok(summary) => {
            println!(
                "\nExport complete: {} ({} frames written, {} skipped, {:.1}s)",
                summary.output_dir.display(),
                summary.frames_written,
                summary.frames_failed,
                summary.elapsed_secs,
            );
            Ok(())
        }
        Err(e) => {
            println!();
            Err(anyhow::anyhow!("Export failed: {e}"))
        }
    }
}
