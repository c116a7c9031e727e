//! Zoomreel Render Engine
//!
//! Offline rendering pipeline that composites source frames with the
//! recorded event streams (clicks, cursor, overlay placements, subtitles)
//! into finished output frames.
//!
//! # Pipeline Architecture
//!
//! ```text
//! screen frames ──┐
//!                 ├── Cursor Overlay
//! clicks/cursor ──┘         │
//!                           ├── Zoom Crop/Rescale
//! zoom resolver ────────────┘         │
//!                                     ├── Subtitle Burn
//! subtitles.srt ──────────────────────┘         │
//!                                               ├── Canvas
//!                                               │     │
//!                                               │     ├── Picture-in-Picture
//! camera frames + overlay.jsonl ────────────────┴─────┘         │
//!                                                               ▼
//!                                                        RenderBackend
//! ```

pub mod canvas;
pub mod compositor;
pub mod context;
pub mod cursor_overlay;
pub mod draw;
pub mod export;
pub mod pip;
pub mod progress;
pub mod source;
pub mod subtitle_burn;
pub mod zoom_crop;

pub use compositor::{EventStreams, FrameCompositor};
pub use export::*;
pub use progress::ProgressTracker;
pub use source::{CameraFrameSource, FrameSource, ImageSequenceSource};
