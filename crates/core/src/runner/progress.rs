//! Progress scraping from ffmpeg's stderr.
//!
//! Progress is best-effort telemetry: a line without both markers is simply
//! not a progress update.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::job::Job;

static TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"time=\s*(\d+:\d+:\d+\.\d+)").unwrap());
static SPEED_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"speed=\s*(\d+(?:\.\d+)?)x").unwrap());

/// Elapsed timecode and speed multiplier from one stats line.
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    /// `HH:MM:SS.cc` position in the output.
    pub timecode: String,
    /// Encoding speed relative to real time.
    pub speed: String,
}

/// Extracts progress from a line; `None` unless both markers are present.
pub fn parse_progress(line: &str) -> Option<Progress> {
    let timecode = TIME_RE.captures(line)?.get(1)?.as_str().to_string();
    let speed = SPEED_RE.captures(line)?.get(1)?.as_str().to_string();
    Some(Progress { timecode, speed })
}

/// Renders `[pos/total] name timecode speed Nx`, padded or cut to `width`.
pub fn format_progress_line(job: &Job, progress: &Progress, width: usize) -> String {
    let line = format!(
        "[{}/{}] {} {} speed {}x",
        job.position, job.total, job.display_name, progress.timecode, progress.speed
    );
    let line: String = line.chars().take(width).collect();
    format!("{:<width$}", line, width = width)
}

/// Splits a byte stream into lines on `\n` and `\r`.
///
/// ffmpeg's `-stats` output rewrites its status line with a bare carriage
/// return, so a newline-only reader would see one endless line.
#[derive(Debug, Default)]
pub struct LineSplitter {
    pending: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk, returning the non-empty lines it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &byte in chunk {
            if byte == b'\n' || byte == b'\r' {
                if let Some(line) = self.take_line() {
                    lines.push(line);
                }
            } else {
                self.pending.push(byte);
            }
        }
        lines
    }

    /// Returns whatever is left after the stream ended.
    pub fn finish(&mut self) -> Option<String> {
        self.take_line()
    }

    fn take_line(&mut self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        (!line.is_empty()).then_some(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS_LINE: &str = "frame= 1234 fps= 98 q=-1.0 size=   10240kB time=00:01:23.45 bitrate= 999.9kbits/s speed=3.92x";

    #[test]
    fn test_parse_stats_line() {
        let progress = parse_progress(STATS_LINE).unwrap();
        assert_eq!(progress.timecode, "00:01:23.45");
        assert_eq!(progress.speed, "3.92");
    }

    #[test]
    fn test_parse_audio_only_stats_line() {
        let line = "size=    2048kB time=00:00:10.00 bitrate=1677.7kbits/s speed=  12x";
        let progress = parse_progress(line).unwrap();
        assert_eq!(progress.timecode, "00:00:10.00");
        assert_eq!(progress.speed, "12");
    }

    #[test]
    fn test_parse_requires_both_markers() {
        assert!(parse_progress("time=00:00:01.00 bitrate=N/A speed=N/A").is_none());
        assert!(parse_progress("speed=1.5x").is_none());
        assert!(parse_progress("[matroska @ 0x55] Invalid track").is_none());
        assert!(parse_progress("").is_none());
    }

    #[test]
    fn test_format_progress_line_fixed_width() {
        let job = Job::new("ffmpeg", Vec::<String>::new())
            .with_input("movie.mkv")
            .at(2, 7);
        let progress = Progress {
            timecode: "00:00:05.00".to_string(),
            speed: "1.50".to_string(),
        };

        let line = format_progress_line(&job, &progress, 60);
        assert_eq!(line.chars().count(), 60);
        assert!(line.starts_with("[2/7] movie.mkv 00:00:05.00 speed 1.50x"));

        let short = format_progress_line(&job, &progress, 10);
        assert_eq!(short, "[2/7] movi");
    }

    #[test]
    fn test_splitter_handles_carriage_returns() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"Input #0, matroska\nframe=1 time=00:00:01.00 speed=1x\rframe=2 time=00:00:02.00 speed=1x\r");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Input #0, matroska");
        assert!(lines[2].contains("00:00:02.00"));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_splitter_joins_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"time=00:00").is_empty());
        let lines = splitter.push(b":03.00 speed=2x\r\n");
        assert_eq!(lines, vec!["time=00:00:03.00 speed=2x".to_string()]);

        splitter.push(b"trailing");
        assert_eq!(splitter.finish(), Some("trailing".to_string()));
    }
}
