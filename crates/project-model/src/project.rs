//! Project metadata and the on-disk bundle.
//!
//! A project ties together source media, the recorded event streams, and the
//! composition settings used at export:
//!
//! ```text
//! <project>/
//!   meta/project.json
//!   meta/clicks.jsonl
//!   meta/cursor.jsonl
//!   meta/overlay.jsonl
//!   meta/subtitles.srt
//!   sources/
//!   exports/
//! ```

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::composition::CompositionConfig;
use crate::event::{
    first_out_of_order, parse_jsonl, serialize_jsonl, ClickEvent, CursorSample,
    OverlayPlacementEvent,
};
use crate::subtitle::{find_overlaps, parse_srt, to_srt, SrtError, SubtitleEntry};

pub const CLICKS_FILE: &str = "clicks.jsonl";
pub const CURSOR_FILE: &str = "cursor.jsonl";
pub const OVERLAY_FILE: &str = "overlay.jsonl";
pub const SUBTITLES_FILE: &str = "subtitles.srt";

/// Top-level project file (`project.json`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    /// Schema version.
    pub version: String,

    /// Human-readable project name.
    pub name: String,

    /// Unique project identifier.
    pub id: String,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Last modified timestamp (RFC 3339).
    pub modified_at: String,

    /// Recording configuration that was used.
    pub recording: RecordingConfig,

    /// Source media tracks.
    pub tracks: Tracks,

    /// Export composition settings.
    #[serde(default)]
    pub composition: CompositionConfig,
}

/// Configuration used during recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Capture resolution (physical pixels).
    pub capture_width: u32,
    pub capture_height: u32,

    /// Recording frame rate.
    pub fps: u32,

    /// Monitor scale factor (e.g., 1.0, 1.25, 2.0).
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,

    /// Whether a single window rather than the full screen was recorded.
    #[serde(default)]
    pub window_only: bool,
}

fn default_scale_factor() -> f64 {
    1.0
}

/// References to source media (relative to project root).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tracks {
    /// Screen capture frames.
    pub screen: Option<TrackRef>,

    /// Camera frames for picture-in-picture.
    #[serde(default)]
    pub camera: Option<TrackRef>,

    /// Microphone audio.
    #[serde(default)]
    pub mic: Option<TrackRef>,

    /// System/desktop audio.
    #[serde(default)]
    pub system_audio: Option<TrackRef>,
}

/// Reference to a media file or frame directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackRef {
    /// Relative path from project root.
    pub path: String,

    /// Duration in seconds.
    pub duration_secs: f64,

    /// Container or sequence format (for example `png-sequence`).
    #[serde(default)]
    pub format: String,

    /// Offset in nanoseconds from the recording epoch.
    /// Tracks start at slightly different instants; this realigns them.
    #[serde(default)]
    pub offset_ns: i64,
}

impl Tracks {
    /// Labelled tracks that are present, in a stable order.
    pub fn present(&self) -> Vec<(&'static str, &TrackRef)> {
        [
            ("Screen", &self.screen),
            ("Camera", &self.camera),
            ("Mic", &self.mic),
            ("System audio", &self.system_audio),
        ]
        .into_iter()
        .filter_map(|(label, track)| track.as_ref().map(|t| (label, t)))
        .collect()
    }
}

/// The complete in-memory representation of a loaded project.
#[derive(Debug, Clone)]
pub struct LoadedProject {
    /// Filesystem path to the project directory.
    pub root: PathBuf,

    /// Project metadata.
    pub project: Project,

    pub clicks: Vec<ClickEvent>,

    pub cursor: Vec<CursorSample>,

    pub overlay: Vec<OverlayPlacementEvent>,

    pub subtitles: Vec<SubtitleEntry>,
}

impl Project {
    /// Create a new project with defaults.
    pub fn new(name: impl Into<String>, width: u32, height: u32, fps: u32) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            version: "1.0".to_string(),
            name: name.into(),
            id: project_id(),
            created_at: now.clone(),
            modified_at: now,
            recording: RecordingConfig {
                capture_width: width,
                capture_height: height,
                fps,
                scale_factor: 1.0,
                window_only: false,
            },
            tracks: Tracks::default(),
            composition: CompositionConfig {
                width,
                height,
                fps,
                ..CompositionConfig::default()
            },
        }
    }
}

impl LoadedProject {
    /// Load a project from a directory.
    ///
    /// Event streams and subtitles are optional; a missing file loads as an
    /// empty stream.
    pub fn load(root: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();
        let meta = root.join("meta");

        let project_path = meta.join("project.json");
        let project_json = read_file(&project_path)?;
        let project: Project =
            serde_json::from_str(&project_json).map_err(|e| ProjectError::ParseError {
                path: project_path,
                source: e,
            })?;

        let clicks = load_stream(&meta.join(CLICKS_FILE))?;
        let cursor = load_stream(&meta.join(CURSOR_FILE))?;
        let overlay = load_stream(&meta.join(OVERLAY_FILE))?;

        let subtitles_path = meta.join(SUBTITLES_FILE);
        let subtitles = if subtitles_path.exists() {
            parse_srt(&read_file(&subtitles_path)?).map_err(|e| ProjectError::SubtitleError {
                path: subtitles_path,
                source: e,
            })?
        } else {
            vec![]
        };

        Ok(Self {
            root,
            project,
            clicks,
            cursor,
            overlay,
            subtitles,
        })
    }

    /// Save metadata, event streams, and subtitles to disk.
    pub fn save(&self) -> Result<(), ProjectError> {
        let meta_dir = self.root.join("meta");
        std::fs::create_dir_all(&meta_dir).map_err(|e| ProjectError::IoError {
            path: meta_dir.clone(),
            source: e,
        })?;

        let project_path = meta_dir.join("project.json");
        let project_json =
            serde_json::to_string_pretty(&self.project).map_err(|e| ProjectError::ParseError {
                path: project_path.clone(),
                source: e,
            })?;
        write_file(&project_path, project_json)?;

        save_stream(&meta_dir.join(CLICKS_FILE), &self.clicks, "clicks")?;
        save_stream(&meta_dir.join(CURSOR_FILE), &self.cursor, "cursor")?;
        save_stream(&meta_dir.join(OVERLAY_FILE), &self.overlay, "overlay")?;

        let subtitles_path = meta_dir.join(SUBTITLES_FILE);
        if !self.subtitles.is_empty() {
            write_file(&subtitles_path, to_srt(&self.subtitles))?;
        }

        Ok(())
    }

    /// Create a new project on disk with the standard directory structure.
    pub fn create(
        root: impl AsRef<Path>,
        name: impl Into<String>,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Self, ProjectError> {
        let root = root.as_ref().to_path_buf();

        for subdir in &["sources", "meta", "exports"] {
            std::fs::create_dir_all(root.join(subdir)).map_err(|e| ProjectError::IoError {
                path: root.join(subdir),
                source: e,
            })?;
        }

        let loaded = Self {
            root,
            project: Project::new(name, width, height, fps),
            clicks: vec![],
            cursor: vec![],
            overlay: vec![],
            subtitles: vec![],
        };
        loaded.save()?;
        Ok(loaded)
    }

    /// Resolve a track path against the project root.
    pub fn track_path(&self, track: &TrackRef) -> PathBuf {
        self.root.join(&track.path)
    }

    /// Validate that all referenced source media exist.
    pub fn validate_sources(&self) -> Vec<String> {
        self.project
            .tracks
            .present()
            .into_iter()
            .filter(|(_, track)| !self.track_path(track).exists())
            .map(|(label, track)| format!("{label} source missing: {}", track.path))
            .collect()
    }

    /// Producer contract violations in the loaded streams.
    ///
    /// Rendering does not check these; they are reported offline.
    pub fn data_issues(&self) -> Vec<String> {
        let mut issues = vec![];

        if let Some(i) = first_out_of_order(&self.clicks) {
            issues.push(format!("Click stream out of order at index {i}"));
        }
        if let Some(i) = first_out_of_order(&self.cursor) {
            issues.push(format!("Cursor stream out of order at index {i}"));
        }
        if let Some(i) = first_out_of_order(&self.overlay) {
            issues.push(format!("Overlay stream out of order at index {i}"));
        }
        for (a, b) in find_overlaps(&self.subtitles) {
            issues.push(format!(
                "Subtitles {} and {} overlap ({:.3}s-{:.3}s vs {:.3}s-{:.3}s)",
                a + 1,
                b + 1,
                self.subtitles[a].start_secs,
                self.subtitles[a].end_secs(),
                self.subtitles[b].start_secs,
                self.subtitles[b].end_secs(),
            ));
        }

        issues
    }
}

/// Errors that can occur when working with projects.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Subtitle error in {path}: {source}")]
    SubtitleError { path: PathBuf, source: SrtError },

    #[error("Invalid project: {message}")]
    ValidationError { message: String },
}

fn read_file(path: &Path) -> Result<String, ProjectError> {
    std::fs::read_to_string(path).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_file(path: &Path, content: String) -> Result<(), ProjectError> {
    std::fs::write(path, content).map_err(|e| ProjectError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn load_stream<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ProjectError> {
    if !path.exists() {
        return Ok(vec![]);
    }
    parse_jsonl(&read_file(path)?).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

fn save_stream<T: Serialize>(path: &Path, events: &[T], stream: &str) -> Result<(), ProjectError> {
    let header = format!("{{\"stream\":\"{stream}\",\"schema_version\":\"1.0\"}}");
    let jsonl = serialize_jsonl(events, Some(&header)).map_err(|e| ProjectError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;
    write_file(path, jsonl)
}

/// Time- and process-seeded identifier in UUID v4 layout.
fn project_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let seed = nanos ^ ((std::process::id() as u128) << 96);
    format!(
        "{:08x}-{:04x}-4{:03x}-{:04x}-{:012x}",
        (seed & 0xFFFF_FFFF) as u32,
        ((seed >> 32) & 0xFFFF) as u16,
        ((seed >> 48) & 0x0FFF) as u16,
        (((seed >> 60) & 0x3FFF) as u16) | 0x8000,
        (seed >> 80) & 0xFFFF_FFFF_FFFF,
    )
}
