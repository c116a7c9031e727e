//! Zoomreel Project Model
//!
//! Defines the core data contracts for Zoomreel projects:
//! - **Events:** Timestamped clicks, frame-synchronous cursor samples, and
//!   picture-in-picture placement events
//! - **Geometry:** Output-video sizes, points, and zoom bounding boxes
//! - **Subtitles:** Timed caption entries and SRT interchange
//! - **Composition:** Tracking mode, overlay styles, canvas, and zoom tuning
//! - **Project:** Top-level metadata, tracks, and the on-disk bundle
//!
//! Click and cursor coordinates are kept in the pixel space of the surface
//! they were recorded against (top-left origin) together with that
//! surface's dimensions, so they can be mapped onto any output size.

pub mod composition;
pub mod event;
pub mod geometry;
pub mod project;
pub mod subtitle;

pub use composition::*;
pub use event::*;
pub use geometry::*;
pub use project::*;
pub use subtitle::*;
