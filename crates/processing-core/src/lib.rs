//! Zoomreel Processing Core
//!
//! Turns recorded event streams into per-timestamp framing decisions:
//! - **Click grouping:** Cluster clicks into zoom sessions
//! - **Zoom resolution:** Passthrough, click-zoom, and cursor-follow state
//! - **Cursor smoothing:** Gaussian-windowed filtering with a bounded memo cache
//! - **Overlay lookup:** Active picture-in-picture placement and recent clicks
//!
//! This crate is pure computation: no I/O and no platform dependencies.
//! Everything here is safe to share across render threads.

pub mod click_group;
pub mod cursor_smooth;
pub mod easing;
pub mod overlay;
pub mod zoom;

pub use click_group::{flatten_groups, group_clicks, ClickGroup};
pub use cursor_smooth::CursorSmoother;
pub use zoom::{TrackingInput, ZoomSession, ZoomState, ZoomStateResolver};
