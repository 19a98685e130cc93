//! Operator input classification

use grblctl_core::Shortcut;

/// First characters of lines passed to the controller unchanged
pub const PASSTHROUGH_PREFIXES: [char; 9] = ['g', 'm', '$', '~', '!', '?', 'x', 'y', 'z'];

/// A classified console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show the help text
    Help,
    /// Close the connection and exit
    Quit,
    /// Pick a file and stream it
    Send,
    /// Run a shortcut macro
    Shortcut(Shortcut),
    /// Probe with optional thickness, speed and maxdepth tokens
    Probe(Vec<String>),
    /// Send the normalized line to the controller as is
    Raw(String),
    /// Not a command
    Invalid(String),
}

/// Classify one line of operator input.
///
/// Input is lowercased and trimmed first. Exact keywords win over
/// shortcuts, shortcuts over `probe`, and `probe` over the passthrough
/// prefixes.
pub fn classify(input: &str) -> Command {
    let normalized = input.trim().to_lowercase();

    match normalized.as_str() {
        "" => return Command::Invalid(normalized),
        "help" => return Command::Help,
        "quit" | "exit" => return Command::Quit,
        "send" => return Command::Send,
        _ => {}
    }

    if let Some(shortcut) = Shortcut::from_name(&normalized) {
        return Command::Shortcut(shortcut);
    }

    if normalized.starts_with("probe") {
        let args = normalized
            .split_whitespace()
            .skip(1)
            .map(str::to_string)
            .collect();
        return Command::Probe(args);
    }

    if normalized.starts_with(PASSTHROUGH_PREFIXES) {
        return Command::Raw(normalized);
    }

    Command::Invalid(normalized)
}
