//! Acknowledgement-paced G-code streaming
//!
//! Implements the simple GRBL send-response protocol: one block goes out,
//! then the host blocks until exactly one reply line comes back before the
//! next block is written. The controller's serial buffer can never be
//! overrun because at most one block is ever outstanding.
//!
//! # Job lifecycle
//! 1. The listener confirms the start; declining sends nothing
//! 2. A first pass counts lines so progress can be shown as a percentage
//! 3. The stream start macro puts the controller in absolute mode
//! 4. Stale input (boot text, status pushes) is drained
//! 5. Each line is sent in file order and its acknowledgement awaited
//! 6. A reset banner in place of an acknowledgement aborts the job
//!
//! There is no resume: an aborted job must be restarted from line 1.

use crate::communication::link::DeviceLink;
use crate::communication::Transport;
use chrono::{DateTime, Utc};
use grblctl_core::{MacroLibrary, Result, SessionState};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Progress after one acknowledged line
#[derive(Debug, Clone, PartialEq)]
pub struct LineProgress<'a> {
    /// 1-based line number
    pub index: usize,
    /// Lines in the file
    pub total: usize,
    /// The line as transmitted
    pub line: &'a str,
    /// The acknowledgement received for it
    pub ack: &'a str,
    /// `index * 100 / total`, rounded to 2 decimals
    pub percent: f64,
    /// Minutes since streaming started, rounded to 2 decimals
    pub elapsed_minutes: f64,
}

/// Observer for a streaming job
///
/// All hooks have no-op defaults; `confirm_start` defaults to proceeding.
pub trait StreamListener {
    /// Asked once before anything is opened or sent; `false` cancels
    fn confirm_start(&mut self, _path: &Path) -> bool {
        true
    }

    /// Text the controller sent before the first program line
    fn on_preamble(&mut self, _text: &str) {}

    /// A line was sent and acknowledged
    fn on_line(&mut self, _progress: &LineProgress<'_>) {}

    /// The controller reset while line `index` was outstanding
    fn on_reset_detected(&mut self, _index: usize, _text: &str) {}
}

impl StreamListener for () {}

/// Summary of a finished or aborted job
#[derive(Debug, Clone, PartialEq)]
pub struct StreamReport {
    /// File that was streamed
    pub path: PathBuf,
    /// Lines counted in the first pass
    pub total_lines: usize,
    /// Lines transmitted
    pub lines_sent: usize,
    /// Wall-clock start of the job
    pub started_at: DateTime<Utc>,
    /// Time spent streaming
    pub elapsed: Duration,
}

impl StreamReport {
    /// Elapsed minutes rounded to 2 decimals
    pub fn elapsed_minutes(&self) -> f64 {
        round2(self.elapsed.as_secs_f64() / 60.0)
    }
}

/// How a job ended
#[derive(Debug, Clone, PartialEq)]
pub enum StreamOutcome {
    /// Every line was sent and acknowledged
    Completed(StreamReport),
    /// A reset was detected; no further lines were sent
    Aborted(StreamReport),
    /// The operator declined to start; nothing was sent
    Cancelled,
}

impl StreamOutcome {
    /// True for `Completed`
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The job report, if the job started
    pub fn report(&self) -> Option<&StreamReport> {
        match self {
            Self::Completed(report) | Self::Aborted(report) => Some(report),
            Self::Cancelled => None,
        }
    }
}

/// Read the next line and decode it lossily; `None` at end of file.
///
/// G-code files are not guaranteed to be UTF-8 (CAM comments often carry
/// Latin-1 bytes), so invalid sequences become U+FFFD instead of failing.
fn read_lossy_line<R: BufRead>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> std::io::Result<Option<String>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Count the lines in a file; a last line without a terminator counts
pub fn count_lines(path: &Path) -> std::io::Result<usize> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut buf = Vec::new();
    let mut total = 0;
    while read_lossy_line(&mut reader, &mut buf)?.is_some() {
        total += 1;
    }
    Ok(total)
}

/// Percentage of `index` over `total`, rounded to 2 decimals; 0 when empty
pub fn percent_complete(index: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(index as f64 * 100.0 / total as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Streams files over a device link
pub struct Streamer<'a> {
    macros: &'a MacroLibrary,
}

impl<'a> Streamer<'a> {
    /// Create a streamer using the library's stream start macro
    pub fn new(macros: &'a MacroLibrary) -> Self {
        Self { macros }
    }

    /// Stream a file line by line, paced by acknowledgements
    pub fn stream_file<T, L>(
        &self,
        link: &mut DeviceLink<T>,
        state: &mut SessionState,
        path: &Path,
        listener: &mut L,
    ) -> Result<StreamOutcome>
    where
        T: Transport,
        L: StreamListener + ?Sized,
    {
        if !listener.confirm_start(path) {
            tracing::info!("Streaming of {} cancelled", path.display());
            return Ok(StreamOutcome::Cancelled);
        }

        let total_lines = count_lines(path)?;
        let mut reader = BufReader::new(File::open(path)?);
        tracing::info!("Streaming {} ({} lines)", path.display(), total_lines);

        let started_at = Utc::now();
        let started = Instant::now();

        let start = self.macros.stream_start();
        let start_lines = start.expand(&HashMap::new())?;
        for response in link.send_macro_lines(state, &start_lines)? {
            if !response.text.is_empty() {
                listener.on_preamble(&response.text);
            }
        }
        if let Some(effect) = start.effect {
            state.apply(effect);
        }

        let stale = link.collect_available()?;
        if !stale.is_empty() {
            tracing::debug!("Flushed before streaming: {:?}", stale);
            listener.on_preamble(&stale);
        }

        let mut lines_sent = 0;
        let mut buf = Vec::new();
        // Bounded by the counted total in case the file grows mid-job
        for index in 1..=total_lines {
            let Some(line) = read_lossy_line(&mut reader, &mut buf)? else {
                break;
            };
            let line = line.trim();

            state.observe_command(line);
            link.send_line(line)?;
            lines_sent = index;
            let ack = link.collect_one_line()?;

            listener.on_line(&LineProgress {
                index,
                total: total_lines,
                line,
                ack: &ack,
                percent: percent_complete(index, total_lines),
                elapsed_minutes: round2(started.elapsed().as_secs_f64() / 60.0),
            });

            if link.banner().matches(&ack) {
                tracing::warn!(
                    "Reset detected at line {}/{}; streaming aborted",
                    index,
                    total_lines
                );
                listener.on_reset_detected(index, &ack);
                return Ok(StreamOutcome::Aborted(StreamReport {
                    path: path.to_path_buf(),
                    total_lines,
                    lines_sent,
                    started_at,
                    elapsed: started.elapsed(),
                }));
            }
        }

        let report = StreamReport {
            path: path.to_path_buf(),
            total_lines,
            lines_sent,
            started_at,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            "Done streaming {} in {:.2} minutes",
            path.display(),
            report.elapsed_minutes()
        );
        Ok(StreamOutcome::Completed(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_complete() {
        assert_eq!(percent_complete(1, 3), 33.33);
        assert_eq!(percent_complete(2, 3), 66.67);
        assert_eq!(percent_complete(3, 3), 100.0);
        assert_eq!(percent_complete(1, 1), 100.0);
        assert_eq!(percent_complete(0, 0), 0.0);
    }

    #[test]
    fn test_read_lossy_line() {
        let mut reader: &[u8] = b"G0 X1\r\n(45\xb0)\nM5";
        let mut buf = Vec::new();
        assert_eq!(
            read_lossy_line(&mut reader, &mut buf).unwrap().as_deref(),
            Some("G0 X1")
        );
        assert_eq!(
            read_lossy_line(&mut reader, &mut buf).unwrap().as_deref(),
            Some("(45\u{FFFD})")
        );
        assert_eq!(
            read_lossy_line(&mut reader, &mut buf).unwrap().as_deref(),
            Some("M5")
        );
        assert_eq!(read_lossy_line(&mut reader, &mut buf).unwrap(), None);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.004), 0.0);
        assert_eq!(round2(1.236), 1.24);
    }
}
