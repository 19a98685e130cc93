//! Line input from the operator

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::collections::VecDeque;

/// Source of operator input
pub trait Prompter {
    /// Show `prompt` and read one line.
    ///
    /// `None` means no more input (end of file or interrupt).
    fn read_line(&mut self, prompt: &str) -> Option<String>;
}

/// Terminal input with line editing and in-memory history
pub struct RustylinePrompter {
    editor: DefaultEditor,
}

impl RustylinePrompter {
    pub fn new() -> Result<Self, ReadlineError> {
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Prompter for RustylinePrompter {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Some(line)
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => None,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                None
            }
        }
    }
}

/// Canned operator input
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    lines: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedPrompter {
    /// Answer prompts with `lines` in order, then report end of input
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    /// Every prompt shown so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Prompter for ScriptedPrompter {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        self.prompts.push(prompt.to_string());
        self.lines.pop_front()
    }
}

impl<P: Prompter + ?Sized> Prompter for &mut P {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        (**self).read_line(prompt)
    }
}
