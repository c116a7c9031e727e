//! Inspect click grouping and zoom behavior without rendering.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use zoomreel_processing_core::{group_clicks, CursorSmoother, ZoomStateResolver};
use zoomreel_project_model::{LoadedProject, TrackingMode};
use zoomreel_render_engine::export::DEFAULT_SMOOTHING_CACHE;

fn load(path: &Path) -> anyhow::Result<LoadedProject> {
    LoadedProject::load(path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))
}

fn resolver_for(project: &LoadedProject) -> ZoomStateResolver {
    let composition = &project.project.composition;
    let smoother = Arc::new(CursorSmoother::new(
        &project.cursor,
        composition.output_size(),
        composition.recording_start_secs,
        composition.zoom.smoothing_window_secs,
        DEFAULT_SMOOTHING_CACHE,
    ));
    ZoomStateResolver::from_config(composition, &project.clicks, smoother)
}

pub fn run(path: PathBuf, group_gap: Option<f64>) -> anyhow::Result<()> {
    let project = load(&path)?;
    let composition = &project.project.composition;
    let gap = group_gap.unwrap_or(composition.zoom.group_gap_secs);

    println!("Analyzing project: {}", project.project.name);
    println!("  Clicks: {}", project.clicks.len());
    println!("  Group gap: {gap:.2}s");
    println!();

    let groups = group_clicks(&project.clicks, gap);
    println!("Click groups ({}):", groups.len());
    for (i, g) in groups.iter().enumerate() {
        println!(
            "  #{:<3} {:>8.3}s - {:>8.3}s  {} click(s)",
            i + 1,
            g.first().captured_at_secs,
            g.last().captured_at_secs,
            g.len()
        );
    }
    println!();

    let mut tuning = composition.zoom.clone();
    tuning.group_gap_secs = gap;
    let resolver = ZoomStateResolver::click_zoom(
        &groups,
        composition.output_size(),
        composition.recording_start_secs,
        tuning,
    );

    println!("Zoom sessions (render timeline):");
    for (i, s) in resolver.sessions().iter().enumerate() {
        let b = s.group_box();
        println!(
            "  #{:<3} {:>8.3}s - {:>8.3}s  box {:.0}x{:.0} at ({:.0}, {:.0})",
            i + 1,
            s.start_secs,
            s.end_secs,
            b.width,
            b.height,
            b.center_x,
            b.center_y
        );
    }

    if !matches!(composition.tracking, TrackingMode::ClickZoom) {
        println!();
        println!(
            "Note: tracking mode is {:?}; sessions above are shown for reference only.",
            composition.tracking
        );
    }

    Ok(())
}

pub fn probe(path: PathBuf, at: f64) -> anyhow::Result<()> {
    let project = load(&path)?;
    let state = resolver_for(&project).resolve(at);
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
