//! Help text

use super::command::PASSTHROUGH_PREFIXES;
use grblctl_core::{format_number, ProbeParams, Shortcut};
use std::fmt::Write;

/// Render the command summary
pub fn help_text(probe: &ProbeParams) -> String {
    let mut text = String::from("\nUse the following commands:\n");
    text.push_str("\t- help: display this help message\n");
    let _ = writeln!(
        text,
        "\t- probe [thickness] [speed] [maxdepth]: probe the work surface at the current XY \
         position, down at most maxdepth (default {}) at feed speed (default {}), then set Z \
         to the touch plate thickness (default {}) and back off",
        format_number(probe.maxdepth),
        format_number(probe.speed),
        format_number(probe.thickness)
    );
    text.push_str("\t- send: choose a file and stream it (asks for confirmation)\n");
    for shortcut in Shortcut::ALL {
        let _ = writeln!(text, "\t- {}: {}", shortcut.name(), shortcut.description());
    }
    text.push_str("\t- quit/exit: close the connection and exit\n");

    let prefixes: Vec<String> = PASSTHROUGH_PREFIXES.iter().map(|c| format!("'{}'", c)).collect();
    let _ = writeln!(
        text,
        "\nAny other line starting with {} is sent directly to the controller.\n\
         Anything else is rejected.",
        prefixes.join(", ")
    );

    text.push_str(
        "\nExample commands:\n\t- probe 12\n\t- probe 20 30 5\n\t- G0 X10 Y10\n\t- $H\n\t- send\n",
    );
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_help_lists_every_command() {
        let text = help_text(&ProbeParams::default());
        for shortcut in Shortcut::ALL {
            assert!(text.contains(shortcut.name()));
        }
        assert!(text.contains("probe [thickness] [speed] [maxdepth]"));
        assert!(text.contains("(default 19.25)"));
        assert!(text.contains("quit/exit"));
    }
}
