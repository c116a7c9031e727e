//! Frame sources: where screen and camera pixels come from.
//!
//! Sources hand out decoded RGBA frames. Decoding a container format is
//! outside this crate; recordings are consumed as numbered image sequences.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use zoomreel_common::error::{ZoomreelError, ZoomreelResult};

/// Random-access screen frames indexed on the render timeline.
pub trait FrameSource: Send + Sync {
    /// Number of frames available.
    fn frame_count(&self) -> usize;

    /// Render-timeline time of frame `index`, in seconds.
    fn timestamp_of(&self, index: usize) -> f64;

    /// Decode frame `index`.
    fn read_frame(&self, index: usize) -> ZoomreelResult<RgbaImage>;
}

/// Time-addressed camera frames for picture-in-picture.
pub trait CameraFrameSource: Send {
    /// Camera frame showing stream time `secs`.
    fn frame_at(&mut self, secs: f64) -> ZoomreelResult<RgbaImage>;
}

const SEQUENCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

/// A directory of still images played back at a fixed rate.
///
/// Files are ordered by name, so zero-padded numbering is expected
/// (`frame_000001.png`, ...).
#[derive(Debug, Clone)]
pub struct ImageSequenceSource {
    dir: PathBuf,
    frames: Vec<PathBuf>,
    fps: f64,
    last: Option<(usize, RgbaImage)>,
}

impl ImageSequenceSource {
    /// Scan `dir` for image frames.
    pub fn open(dir: impl AsRef<Path>, fps: f64) -> ZoomreelResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.is_dir() {
            return Err(ZoomreelError::FileNotFound { path: dir });
        }
        if !(fps.is_finite() && fps > 0.0) {
            return Err(ZoomreelError::config(format!(
                "Frame rate must be positive, got {fps}"
            )));
        }

        let mut frames = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let is_frame = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| SEQUENCE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if is_frame && path.is_file() {
                frames.push(path);
            }
        }
        frames.sort();

        if frames.is_empty() {
            return Err(ZoomreelError::project(format!(
                "No image frames in {}",
                dir.display()
            )));
        }

        tracing::debug!(dir = %dir.display(), frames = frames.len(), fps, "Opened image sequence");
        Ok(Self {
            dir,
            frames,
            fps,
            last: None,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.frames.len() as f64 / self.fps
    }

    /// Frame shown at `secs`, clamped to the sequence.
    pub fn index_at(&self, secs: f64) -> usize {
        if !secs.is_finite() || secs <= 0.0 {
            return 0;
        }
        ((secs * self.fps).floor() as usize).min(self.frames.len() - 1)
    }

    fn decode(&self, index: usize) -> ZoomreelResult<RgbaImage> {
        let timestamp = self.timestamp_of(index);
        let path = self.frames.get(index).ok_or_else(|| {
            ZoomreelError::source_frame(timestamp, format!("frame index {index} out of range"))
        })?;
        let img = image::open(path).map_err(|e| {
            ZoomreelError::source_frame(timestamp, format!("{}: {e}", path.display()))
        })?;
        Ok(img.to_rgba8())
    }
}

impl FrameSource for ImageSequenceSource {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn timestamp_of(&self, index: usize) -> f64 {
        index as f64 / self.fps
    }

    fn read_frame(&self, index: usize) -> ZoomreelResult<RgbaImage> {
        self.decode(index)
    }
}

impl CameraFrameSource for ImageSequenceSource {
    fn frame_at(&mut self, secs: f64) -> ZoomreelResult<RgbaImage> {
        let index = self.index_at(secs);
        if let Some((cached, frame)) = &self.last {
            if *cached == index {
                return Ok(frame.clone());
            }
        }
        let frame = self.decode(index)?;
        self.last = Some((index, frame.clone()));
        Ok(frame)
    }
}

/// Writes a synthetic image sequence for tests.
#[cfg(test)]
pub(crate) fn write_test_sequence(dir: &Path, count: usize, width: u32, height: u32) {
    std::fs::create_dir_all(dir).unwrap();
    for i in 0..count {
        let shade = (i * 40 % 256) as u8;
        let img = RgbaImage::from_pixel(width, height, image::Rgba([shade, 0, 0, 255]));
        img.save(dir.join(format!("frame_{i:06}.png"))).unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("zoomreel-source-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_open_sorts_and_filters() {
        let dir = temp_dir("sorts");
        write_test_sequence(&dir, 3, 4, 4);
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let source = ImageSequenceSource::open(&dir, 30.0).unwrap();
        assert_eq!(source.frame_count(), 3);
        assert!((source.duration_secs() - 0.1).abs() < 1e-9);
        assert!((source.timestamp_of(2) - 2.0 / 30.0).abs() < 1e-12);
        assert_eq!(source.read_frame(1).unwrap().get_pixel(0, 0)[0], 40);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_open_rejects_missing_and_empty() {
        let missing = temp_dir("missing");
        assert!(matches!(
            ImageSequenceSource::open(&missing, 30.0),
            Err(ZoomreelError::FileNotFound { .. })
        ));

        std::fs::create_dir_all(&missing).unwrap();
        assert!(ImageSequenceSource::open(&missing, 30.0).is_err());
        let _ = std::fs::remove_dir_all(&missing);
    }

    #[test]
    fn test_corrupt_frame_is_frame_local_error() {
        let dir = temp_dir("corrupt");
        write_test_sequence(&dir, 2, 4, 4);
        std::fs::write(dir.join("frame_000001.png"), b"not a png").unwrap();

        let source = ImageSequenceSource::open(&dir, 10.0).unwrap();
        assert!(source.read_frame(0).is_ok());
        let err = source.read_frame(1).unwrap_err();
        assert!(err.is_frame_local());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_camera_lookup_clamps_time() {
        let dir = temp_dir("camera");
        write_test_sequence(&dir, 3, 4, 4);
        let mut camera = ImageSequenceSource::open(&dir, 10.0).unwrap();

        assert_eq!(camera.index_at(-1.0), 0);
        assert_eq!(camera.index_at(0.15), 1);
        assert_eq!(camera.index_at(99.0), 2);
        assert_eq!(camera.frame_at(0.15).unwrap().get_pixel(0, 0)[0], 40);
        // Served from the one-frame cache.
        assert_eq!(camera.frame_at(0.12).unwrap().get_pixel(0, 0)[0], 40);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
