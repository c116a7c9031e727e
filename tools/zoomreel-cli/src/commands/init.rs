//! Initialize a new Zoomreel project.

use std::path::PathBuf;

use zoomreel_common::config::AppConfig;
use zoomreel_project_model::LoadedProject;

pub fn run(
    config: &AppConfig,
    name: String,
    output: Option<PathBuf>,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
) -> anyhow::Result<()> {
    let width = width.unwrap_or(config.render.width);
    let height = height.unwrap_or(config.render.height);
    let fps = fps.unwrap_or(config.render.fps);

    let project_dir = output.unwrap_or_else(|| config.projects_dir.clone()).join(&name);
    println!("Creating project '{}' at {}", name, project_dir.display());

    let project = LoadedProject::create(&project_dir, &name, width, height, fps)
        .map_err(|e| anyhow::anyhow!("Failed to create project: {e}"))?;

    println!("Project created successfully:");
    println!("  Directory: {}", project.root.display());
    println!("  Resolution: {}x{}", width, height);
    println!("  FPS: {fps}");
    println!();
    println!("Directory structure:");
    println!("  {}/", name);
    println!("  ├── sources/     (screen and camera frames)");
    println!("  ├── meta/        (project.json, clicks/cursor/overlay .jsonl, subtitles.srt)");
    println!("  └── exports/     (rendered output)");

    Ok(())
}
