//! Timed subtitle entries and SRT interchange.

use serde::{Deserialize, Serialize};

/// One caption shown over `[start_secs, start_secs + duration_secs]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtitleEntry {
    pub text: String,
    pub start_secs: f64,
    pub duration_secs: f64,
}

impl SubtitleEntry {
    pub fn new(text: impl Into<String>, start_secs: f64, duration_secs: f64) -> Self {
        Self {
            text: text.into(),
            start_secs,
            duration_secs,
        }
    }

    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.duration_secs
    }

    /// Whether `t` falls inside the entry's window (both ends inclusive).
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_secs && t <= self.end_secs()
    }

    fn overlaps(&self, other: &SubtitleEntry) -> bool {
        self.start_secs < other.end_secs() && other.start_secs < self.end_secs()
    }
}

/// The entry to display at `t`: the first one in list order whose window
/// contains it.
pub fn active_at(entries: &[SubtitleEntry], t: f64) -> Option<&SubtitleEntry> {
    entries.iter().find(|entry| entry.contains(t))
}

/// Index pairs `(i, j)`, `i < j`, of entries whose windows overlap.
///
/// Windows that merely touch at an endpoint are not reported.
pub fn find_overlaps(entries: &[SubtitleEntry]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (i, a) in entries.iter().enumerate() {
        for (j, b) in entries.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Errors raised while reading SRT content.
#[derive(Debug, thiserror::Error)]
pub enum SrtError {
    #[error("line {line}: expected timing line, found {found:?}")]
    MissingTiming { line: usize, found: String },

    #[error("line {line}: malformed timestamp {value:?}")]
    BadTimestamp { line: usize, value: String },
}

/// Parse SRT content into entries, in file order.
///
/// Cue numbers are optional; each block needs a `start --> end` line
/// followed by one or more text lines.
pub fn parse_srt(content: &str) -> Result<Vec<SubtitleEntry>, SrtError> {
    let mut entries = Vec::new();
    let mut lines = content
        .lines()
        .map(|l| l.trim_start_matches('\u{feff}').trim_end())
        .enumerate()
        .peekable();

    loop {
        while matches!(lines.peek(), Some((_, l)) if l.is_empty()) {
            lines.next();
        }
        let Some((idx, first)) = lines.next() else {
            break;
        };

        let (timing_idx, timing) = if first.contains("-->") {
            (idx, first)
        } else {
            match lines.next() {
                Some((i, l)) if l.contains("-->") => (i, l),
                Some((i, l)) => {
                    return Err(SrtError::MissingTiming {
                        line: i + 1,
                        found: l.to_string(),
                    })
                }
                None => {
                    return Err(SrtError::MissingTiming {
                        line: idx + 1,
                        found: first.to_string(),
                    })
                }
            }
        };

        let (start_raw, end_raw) = timing.split_once("-->").unwrap_or((timing, ""));
        let start = parse_srt_time(start_raw.trim()).ok_or_else(|| SrtError::BadTimestamp {
            line: timing_idx + 1,
            value: start_raw.trim().to_string(),
        })?;
        // Position hints may trail the end timestamp.
        let end_token = end_raw.split_whitespace().next().unwrap_or("");
        let end = parse_srt_time(end_token).ok_or_else(|| SrtError::BadTimestamp {
            line: timing_idx + 1,
            value: end_token.to_string(),
        })?;

        let mut text_lines = Vec::new();
        while let Some((_, l)) = lines.peek() {
            if l.is_empty() {
                break;
            }
            text_lines.push(l.to_string());
            lines.next();
        }

        entries.push(SubtitleEntry::new(
            text_lines.join("\n"),
            start,
            (end - start).max(0.0),
        ));
    }

    Ok(entries)
}

/// Render entries as SRT, numbering cues from 1.
pub fn to_srt(entries: &[SubtitleEntry]) -> String {
    let mut output = String::new();
    for (i, entry) in entries.iter().enumerate() {
        output.push_str(&format!("{}\n", i + 1));
        output.push_str(&format!(
            "{} --> {}\n",
            format_srt_time(entry.start_secs),
            format_srt_time(entry.end_secs()),
        ));
        output.push_str(&entry.text);
        output.push_str("\n\n");
    }
    output
}

/// Format seconds as `HH:MM:SS,mmm`.
fn format_srt_time(secs: f64) -> String {
    let total_ms = (secs.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02},{millis:03}")
}

/// Parse `HH:MM:SS,mmm` (a `.` separator is accepted too).
fn parse_srt_time(raw: &str) -> Option<f64> {
    let (hms, millis) = raw.split_once([',', '.']).unwrap_or((raw, "0"));
    let mut parts = hms.split(':');
    let hours: u64 = parts.next()?.trim().parse().ok()?;
    let minutes: u64 = parts.next()?.trim().parse().ok()?;
    let seconds: u64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || minutes >= 60 || seconds >= 60 {
        return None;
    }
    let millis: u64 = millis.trim().parse().ok()?;
    Some((hours * 3600 + minutes * 60 + seconds) as f64 + millis as f64 / 1000.0)
}
