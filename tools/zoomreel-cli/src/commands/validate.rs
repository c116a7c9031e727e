//! Validate a project bundle.

use std::path::PathBuf;

use zoomreel_common::clock::StreamAlignment;
use zoomreel_project_model::LoadedProject;

pub fn run(path: PathBuf, drift_threshold_ms: f64) -> anyhow::Result<()> {
    println!("Validating project at: {}", path.display());

    let project = match LoadedProject::load(&path) {
        Ok(p) => p,
        Err(e) => {
            println!("  FAIL: Could not load project: {e}");
            return Err(anyhow::anyhow!("Validation failed"));
        }
    };

    println!("  OK: project.json loaded (v{})", project.project.version);

    let mut errors = 0usize;
    let mut warnings = 0usize;

    for issue in project.validate_sources() {
        println!("  FAIL: {issue}");
        errors += 1;
    }

    for issue in project.data_issues() {
        println!("  WARN: {issue}");
        warnings += 1;
    }

    let tracks = &project.project.tracks;
    if let Some(screen) = &tracks.screen {
        let alignment = StreamAlignment::new(screen.offset_ns);
        for (label, track) in tracks.present() {
            if label == "Screen" {
                continue;
            }
            let drift = alignment.drift(track.offset_ns);
            if drift.exceeds_threshold_ms(drift_threshold_ms) {
                println!(
                    "  WARN: {label} drifts {:.1}ms from screen (threshold {:.0}ms)",
                    drift.drift_ms(),
                    drift_threshold_ms
                );
                warnings += 1;
            }
        }
    }

    let subtitles = &project.project.composition.subtitles;
    if let Some(font) = subtitles.font_path.as_ref().filter(|_| subtitles.enabled) {
        if !font.exists() {
            println!(
                "  WARN: subtitle font {} not found; the embedded font will be used",
                font.display()
            );
            warnings += 1;
        }
    }

    println!();
    if errors == 0 {
        println!("Project is valid ({warnings} warning(s)).");
        Ok(())
    } else {
        println!("Project has {errors} error(s) and {warnings} warning(s).");
        Err(anyhow::anyhow!("Validation failed"))
    }
}
