//! Interactive command loop
//!
//! Reads one operator line at a time, classifies it and runs it against
//! the controller. Nothing runs in the background: while the prompt waits
//! the controller link is idle, and residual controller output is drained
//! after every command.

pub mod command;
pub mod help;
pub mod progress;
pub mod prompt;

pub use command::{classify, Command, PASSTHROUGH_PREFIXES};
pub use help::help_text;
pub use progress::{format_progress, ProgressPrinter};
pub use prompt::{Prompter, RustylinePrompter, ScriptedPrompter};

use grblctl_communication::{
    describe_response, DeviceLink, DeviceResponse, StreamOutcome, Streamer, Transport,
};
use grblctl_core::{Error, MacroDefinition, MacroLibrary, Result, SessionState, Shortcut};
use grblctl_settings::Config;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The interactive console
pub struct Console<T: Transport, P: Prompter, W: Write> {
    link: DeviceLink<T>,
    state: SessionState,
    macros: MacroLibrary,
    config: Config,
    prompter: P,
    out: W,
}

impl<T: Transport, P: Prompter, W: Write> Console<T, P, W> {
    /// Create a console over a link that has already been woken up
    pub fn new(
        link: DeviceLink<T>,
        macros: MacroLibrary,
        config: Config,
        prompter: P,
        out: W,
    ) -> Self {
        Self {
            link,
            state: SessionState::new(),
            macros,
            config,
            prompter,
            out,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn link(&self) -> &DeviceLink<T> {
        &self.link
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Print the command summary
    pub fn print_help(&mut self) -> Result<()> {
        let text = help_text(&self.macros.probe_defaults());
        writeln!(self.out, "{}", text)?;
        Ok(())
    }

    /// Run until the operator quits or input ends, then close the link
    pub fn run(&mut self) -> Result<()> {
        loop {
            let prompt = self.state.prompt();
            let Some(input) = self.prompter.read_line(&prompt) else {
                writeln!(self.out)?;
                break;
            };

            let flow = match self.execute(&input) {
                Ok(flow) => flow,
                Err(e) => {
                    self.report_error(&e)?;
                    Flow::Continue
                }
            };
            if flow == Flow::Quit {
                break;
            }

            if let Err(e) = self.drain_residual() {
                self.report_error(&e)?;
            }
        }

        self.close()
    }

    /// Run one line of operator input
    pub fn execute(&mut self, input: &str) -> Result<Flow> {
        match classify(input) {
            Command::Help => self.print_help()?,
            Command::Quit => return Ok(Flow::Quit),
            Command::Send => self.send_interactive()?,
            Command::Shortcut(shortcut) => self.run_shortcut(shortcut)?,
            Command::Probe(args) => self.probe(&args)?,
            Command::Raw(line) => {
                let response = self.link.send_command(&mut self.state, &line)?;
                self.show_response(&response)?;
            }
            Command::Invalid(_) => writeln!(self.out, "Invalid command. Try again.")?,
        }
        Ok(Flow::Continue)
    }

    /// Stream a file, recording it in the recent files list once it starts
    pub fn stream_file(&mut self, path: &Path) -> Result<StreamOutcome> {
        let mut printer = ProgressPrinter::new(&mut self.prompter, &mut self.out);
        let outcome = Streamer::new(&self.macros).stream_file(
            &mut self.link,
            &mut self.state,
            path,
            &mut printer,
        )?;

        match &outcome {
            StreamOutcome::Completed(report) => {
                writeln!(
                    self.out,
                    "Done streaming file in {:.2} minutes.",
                    report.elapsed.as_secs_f64() / 60.0
                )?;
            }
            StreamOutcome::Aborted(report) => {
                writeln!(
                    self.out,
                    "Streaming aborted after {} of {} lines; restart the job from the beginning.",
                    report.lines_sent, report.total_lines
                )?;
            }
            StreamOutcome::Cancelled => {}
        }
        if let Some(report) = outcome.report() {
            self.config.add_recent_file(report.path.clone());
        }
        Ok(outcome)
    }

    fn send_interactive(&mut self) -> Result<()> {
        let recent = self.config.most_recent_file().map(Path::to_path_buf);
        let prompt = match &recent {
            Some(path) => format!("File to stream [{}]: ", path.display()),
            None => "File to stream: ".to_string(),
        };

        let Some(answer) = self.prompter.read_line(&prompt) else {
            writeln!(self.out, "Streaming cancelled.")?;
            return Ok(());
        };
        let answer = answer.trim();
        let path = if answer.is_empty() {
            match recent {
                Some(path) => path,
                None => {
                    writeln!(self.out, "No file selected.")?;
                    return Ok(());
                }
            }
        } else {
            PathBuf::from(answer)
        };

        self.stream_file(&path)?;
        Ok(())
    }

    fn run_shortcut(&mut self, shortcut: Shortcut) -> Result<()> {
        let definition = self.macros.shortcut(shortcut)?.clone();
        self.run_macro(&definition, &HashMap::new())
    }

    fn probe(&mut self, args: &[String]) -> Result<()> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let params = self.macros.probe_defaults().with_args(&args);

        let prompt = format!(
            "Probe with {}? Press enter to continue or type anything to cancel. ",
            params
        );
        match self.prompter.read_line(&prompt) {
            Some(answer) if answer.trim().is_empty() => {}
            _ => {
                writeln!(self.out, "Probe cancelled.")?;
                return Ok(());
            }
        }

        let definition = self.macros.probe().clone();
        self.run_macro(&definition, &params.to_map())
    }

    fn run_macro(
        &mut self,
        definition: &MacroDefinition,
        params: &HashMap<String, f64>,
    ) -> Result<()> {
        let lines = definition.expand(params)?;
        tracing::debug!("Running macro {} ({} lines)", definition.name, lines.len());

        // Each reply is shown as soon as it is collected
        let out = &mut self.out;
        let mut shown: std::io::Result<()> = Ok(());
        let sent = self
            .link
            .send_macro_lines_with(&mut self.state, &lines, |response| {
                if shown.is_ok() {
                    shown = write_response(out, &response);
                }
            });
        shown?;
        sent?;

        if let Some(effect) = definition.effect {
            self.state.apply(effect);
        }
        Ok(())
    }

    fn show_response(&mut self, response: &DeviceResponse) -> Result<()> {
        write_response(&mut self.out, response)?;
        Ok(())
    }

    fn drain_residual(&mut self) -> Result<()> {
        let residual = self.link.collect_available()?;
        if !residual.is_empty() {
            writeln!(self.out, "received after: {}", residual)?;
        }
        Ok(())
    }

    fn report_error(&mut self, error: &Error) -> Result<()> {
        if error.is_transport_error() {
            tracing::error!("{}", error);
            writeln!(self.out, "Transport error: {}", error)?;
        } else {
            tracing::warn!("{}", error);
            writeln!(self.out, "Error: {}", error)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.link.close()?;
        writeln!(self.out, "Closed serial connection, exiting now.")?;
        self.out.flush()?;
        Ok(())
    }
}

fn write_response<W: Write>(out: &mut W, response: &DeviceResponse) -> std::io::Result<()> {
    writeln!(out, "{} : {}", response.command, response.text)?;
    if let Some(notes) = describe_response(&response.text) {
        writeln!(out, "{}", notes)?;
    }
    if response.is_reset_banner {
        tracing::warn!("Controller reset after {:?}", response.command);
        writeln!(out, "Controller reset detected.")?;
    }
    Ok(())
}
