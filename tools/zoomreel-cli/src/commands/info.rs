//! Show project information.

use std::path::PathBuf;

use zoomreel_project_model::LoadedProject;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project =
        LoadedProject::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let p = &project.project;

    println!("Project: {}", p.name);
    println!("  ID: {}", p.id);
    println!("  Created: {}", p.created_at);
    println!("  Modified: {}", p.modified_at);
    println!();

    println!("Recording:");
    println!(
        "  Resolution: {}x{} @ {}fps",
        p.recording.capture_width, p.recording.capture_height, p.recording.fps
    );
    println!("  Scale factor: {}", p.recording.scale_factor);
    println!("  Window only: {}", p.recording.window_only);
    println!();

    println!("Tracks:");
    let tracks = p.tracks.present();
    if tracks.is_empty() {
        println!("  (none)");
    }
    for (label, t) in tracks {
        println!(
            "  {label}: {} ({:.1}s, {}, offset {}ns)",
            t.path, t.duration_secs, t.format, t.offset_ns
        );
    }
    println!();

    println!("Streams:");
    println!("  Clicks: {}", project.clicks.len());
    println!("  Cursor samples: {}", project.cursor.len());
    println!("  Overlay placements: {}", project.overlay.len());
    println!("  Subtitles: {}", project.subtitles.len());
    println!();

    let c = &p.composition;
    println!("Composition:");
    println!("  Output: {}x{} @ {}fps", c.width, c.height, c.fps);
    println!("  Tracking: {:?}", c.tracking);
    println!("  Cursor overlay: {:?}", c.cursor.style);
    println!(
        "  Zoom: in {:.2}s / out {:.2}s, pauses {:.2}s/{:.2}s, max {:.1}x",
        c.zoom.zoom_in_secs,
        c.zoom.zoom_out_secs,
        c.zoom.pre_click_pause_secs,
        c.zoom.post_click_pause_secs,
        c.zoom.max_zoom
    );
    println!(
        "  Canvas: {}",
        if c.canvas.enabled { "enabled" } else { "disabled" }
    );
    println!(
        "  Subtitles: {}",
        match (&c.subtitles.enabled, &c.subtitles.font_path) {
            (false, _) => "disabled".to_string(),
            (true, None) => "enabled (embedded font)".to_string(),
            (true, Some(font)) => format!("enabled ({})", font.display()),
        }
    );

    Ok(())
}
