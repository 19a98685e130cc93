//! Operator-facing streaming progress

use super::prompt::Prompter;
use grblctl_communication::{LineProgress, StreamListener};
use std::io::Write;
use std::path::Path;

/// Prints streaming progress and asks for the go-ahead
pub struct ProgressPrinter<'a, P: Prompter, W: Write> {
    prompter: &'a mut P,
    out: &'a mut W,
}

impl<'a, P: Prompter, W: Write> ProgressPrinter<'a, P, W> {
    pub fn new(prompter: &'a mut P, out: &'a mut W) -> Self {
        Self { prompter, out }
    }

    fn emit(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::warn!("Failed to write progress: {}", e);
        }
    }
}

/// One progress line, e.g. `Sending: G0 X1 : ok : \t\t1/4=25% in 0 min`
pub fn format_progress(progress: &LineProgress<'_>) -> String {
    format!(
        "Sending: {} : {} : \t\t{}/{}={}% in {} min",
        progress.line,
        progress.ack.trim(),
        progress.index,
        progress.total,
        progress.percent,
        progress.elapsed_minutes
    )
}

impl<P: Prompter, W: Write> StreamListener for ProgressPrinter<'_, P, W> {
    fn confirm_start(&mut self, path: &Path) -> bool {
        let prompt = format!(
            "Press enter to begin streaming \"{}\" or type quit and press enter to go back to prompt. ",
            path.display()
        );
        match self.prompter.read_line(&prompt) {
            Some(answer) if answer.trim().is_empty() => true,
            _ => {
                self.emit("Streaming cancelled.");
                false
            }
        }
    }

    fn on_preamble(&mut self, text: &str) {
        self.emit(text);
    }

    fn on_line(&mut self, progress: &LineProgress<'_>) {
        let line = format_progress(progress);
        self.emit(&line);
    }

    fn on_reset_detected(&mut self, index: usize, _text: &str) {
        self.emit(&format!(
            "EMERGENCY STOPPING STREAMING at line {}, likely an emergency stop or reset",
            index
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::prompt::ScriptedPrompter;

    #[test]
    fn test_format_progress() {
        let progress = LineProgress {
            index: 1,
            total: 3,
            line: "G0 X1",
            ack: "ok",
            percent: 33.33,
            elapsed_minutes: 0.02,
        };
        assert_eq!(
            format_progress(&progress),
            "Sending: G0 X1 : ok : \t\t1/3=33.33% in 0.02 min"
        );
    }

    #[test]
    fn test_confirm_requires_empty_answer() {
        let mut prompter = ScriptedPrompter::new(["", "quit"]);
        let mut out = Vec::new();
        let mut printer = ProgressPrinter::new(&mut prompter, &mut out);

        assert!(printer.confirm_start(Path::new("job.nc")));
        assert!(!printer.confirm_start(Path::new("job.nc")));
        assert!(!printer.confirm_start(Path::new("job.nc")));

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("Streaming cancelled.").count(), 2);
        assert!(prompter.prompts()[0].contains("\"job.nc\""));
    }
}
