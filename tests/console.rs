use grblctl::{Console, ScriptedPrompter};
use grblctl_communication::{
    CollectorConfig, DeviceLink, ResetBanner, ResponseCollector, ScriptedTransport,
};
use grblctl_core::{CoordinateMode, LockMode, MacroLibrary, ProbeParams};
use grblctl_settings::Config;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::NamedTempFile;

type TestConsole<'a> = Console<ScriptedTransport, &'a mut ScriptedPrompter, Vec<u8>>;

fn console<'a>(
    transport: &ScriptedTransport,
    prompter: &'a mut ScriptedPrompter,
    config: Config,
) -> TestConsole<'a> {
    let collector = ResponseCollector::new(CollectorConfig {
        poll_interval: Duration::ZERO,
        quiescence: Duration::ZERO,
    });
    let link = DeviceLink::new(transport.clone(), collector, ResetBanner::default());
    let macros = MacroLibrary::new(config.probe.params()).unwrap();
    Console::new(link, macros, config, prompter, Vec::new())
}

fn output(console: &TestConsole<'_>) -> String {
    String::from_utf8_lossy(console.output()).to_string()
}

fn gcode_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_quit_closes_connection() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert!(transport.is_closed());
    assert!(transport.written_lines().is_empty());
    assert!(output(&console).contains("Closed serial connection, exiting now."));
}

#[test]
fn test_end_of_input_quits() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert!(transport.is_closed());
}

#[test]
fn test_raw_command_is_lowercased_and_sent() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["  G0 X10 ", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert_eq!(transport.written_lines(), vec!["g0 x10"]);
    assert!(output(&console).contains("g0 x10 : ok"));
}

#[test]
fn test_error_reply_is_annotated() {
    let transport = ScriptedTransport::new().with_replies(["error:22"]);
    let mut prompter = ScriptedPrompter::new(["g1 x5", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    let text = output(&console);
    assert!(text.contains("g1 x5 : error:22"));
    assert!(text.contains("feed rate not set"));
}

#[test]
fn test_raw_mode_change_updates_prompt() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["g91", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();
    assert_eq!(console.state().coordinate_mode, CoordinateMode::Relative);
    drop(console);

    assert_eq!(
        prompter.prompts().to_vec(),
        vec!["(abs,?) >>> ".to_string(), "(rel,?) >>> ".to_string()]
    );
}

#[test]
fn test_shortcuts_send_and_update_state() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["rel", "lock", "zero", "home", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert_eq!(
        transport.written_lines(),
        vec!["G91", "$1=255", "G92 X0 Y0 Z0", "$H"]
    );
    assert_eq!(console.state().coordinate_mode, CoordinateMode::Relative);
    assert_eq!(console.state().lock_mode, LockMode::Locked);
    drop(console);

    assert_eq!(prompter.prompts()[2], "(rel,lock) >>> ");
}

#[test]
fn test_unlock_and_abs_shortcuts() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["rel", "unlock", "abs", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert_eq!(transport.written_lines(), vec!["G91", "$1=25", "G90"]);
    assert_eq!(console.state().prompt(), "(abs,unlock) >>> ");
}

#[test]
fn test_probe_confirmed() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["probe 10 30 5", "", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert_eq!(
        transport.written_lines(),
        vec!["G91", "G38.2 Z-5 F30", "G92 Z10", "G91", "G0 Z8", "G90"]
    );
    assert_eq!(console.state().coordinate_mode, CoordinateMode::Absolute);
    drop(console);

    assert!(prompter.prompts()[1].contains("thickness=10 speed=30 maxdepth=5"));
}

#[test]
fn test_probe_keeps_defaults_for_bad_tokens() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["probe 12 fast", "", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    let written = transport.written_lines();
    assert_eq!(written[1], "G38.2 Z-10 F25");
    assert_eq!(written[2], "G92 Z12");
}

#[test]
fn test_probe_uses_configured_defaults() {
    let mut config = Config::default();
    config.probe.thickness = 15.0;
    config.probe.maxdepth = 20.0;
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["probe", "", "quit"]);
    let mut console = console(&transport, &mut prompter, config);

    console.run().unwrap();

    let written = transport.written_lines();
    assert_eq!(written[1], "G38.2 Z-20 F25");
    assert_eq!(written[2], "G92 Z15");
}

#[test]
fn test_probe_declined() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["probe 10", "no", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert!(transport.written_lines().is_empty());
    assert!(output(&console).contains("Probe cancelled."));
}

#[test]
fn test_invalid_command() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["hello", "", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert!(transport.written_lines().is_empty());
    assert_eq!(
        output(&console).matches("Invalid command. Try again.").count(),
        2
    );
}

#[test]
fn test_help() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["help", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert!(output(&console).contains("Use the following commands:"));
    assert!(transport.written_lines().is_empty());
}

#[test]
fn test_residual_input_reported() {
    let transport = ScriptedTransport::always_ok();
    transport.push_inbound("<Idle|MPos:0.000,0.000,0.000|FS:0,0>");
    let mut prompter = ScriptedPrompter::new(["hello", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert!(output(&console).contains("received after: <Idle|MPos:0.000,0.000,0.000|FS:0,0>"));
}

#[test]
fn test_transport_error_returns_to_prompt() {
    let transport = ScriptedTransport::always_ok().fail_writes_after(0);
    let mut prompter = ScriptedPrompter::new(["g0 x1", "help", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    let text = output(&console);
    assert!(text.contains("Transport error: Write failed"));
    assert!(text.contains("Use the following commands:"));
    assert!(transport.is_closed());
}

#[test]
fn test_macro_failure_keeps_earlier_replies() {
    let transport = ScriptedTransport::always_ok().fail_writes_after(2);
    let mut prompter = ScriptedPrompter::new(["probe", "", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    let text = output(&console);
    assert!(text.contains("G91 : ok"));
    assert!(text.contains("G38.2 Z-10 F25 : ok"));
    assert!(text.contains("Transport error: Write failed"));
    assert!(!text.contains("G92 Z19.25 : ok"));
    assert_eq!(transport.written_lines(), vec!["G91", "G38.2 Z-10 F25"]);
}

#[test]
fn test_probe_ignores_negative_speed_and_depth() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["probe 10 -30 -5", "", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert_eq!(
        transport.written_lines(),
        vec!["G91", "G38.2 Z-10 F25", "G92 Z10", "G91", "G0 Z8", "G90"]
    );
}

#[test]
fn test_send_streams_chosen_file() {
    let file = gcode_file("G0 X1\nG0 X2\n");
    let path = file.path().to_string_lossy().to_string();
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["send", path.as_str(), "", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert_eq!(transport.written_lines(), vec!["G90", "G0 X1", "G0 X2"]);
    let text = output(&console);
    assert!(text.contains("Sending: G0 X1 : ok : \t\t1/2=50% in 0 min"));
    assert!(text.contains("Sending: G0 X2 : ok : \t\t2/2=100% in 0 min"));
    assert!(text.contains("Done streaming file in"));
    assert_eq!(console.config().recent_files, vec![file.path().to_path_buf()]);
}

#[test]
fn test_send_defaults_to_most_recent_file() {
    let file = gcode_file("G0 X1\n");
    let mut config = Config::default();
    config.add_recent_file(file.path().to_path_buf());
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["send", "", "", "quit"]);
    let mut console = console(&transport, &mut prompter, config);

    console.run().unwrap();
    drop(console);

    assert_eq!(transport.written_lines(), vec!["G90", "G0 X1"]);
    assert!(prompter.prompts()[1].contains(&file.path().display().to_string()));
}

#[test]
fn test_send_without_recent_file_cancels() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["send", "", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert!(transport.written_lines().is_empty());
    assert!(output(&console).contains("No file selected."));
}

#[test]
fn test_send_declined() {
    let file = gcode_file("G0 X1\n");
    let path = file.path().to_string_lossy().to_string();
    let transport = ScriptedTransport::always_ok();
    let mut prompter = ScriptedPrompter::new(["send", path.as_str(), "quit", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert_eq!(transport.bytes_written(), 0);
    assert!(output(&console).contains("Streaming cancelled."));
    assert!(console.config().recent_files.is_empty());
}

#[test]
fn test_send_missing_file_reports_error() {
    let transport = ScriptedTransport::always_ok();
    let mut prompter =
        ScriptedPrompter::new(["send", "/nonexistent/grblctl/job.nc", "", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert!(output(&console).contains("Error: I/O error"));
    assert_eq!(transport.bytes_written(), 0);
}

#[test]
fn test_reset_during_send_aborts() {
    let file = gcode_file("G0 X1\nG0 X2\nG0 X3\n");
    let path = file.path().to_string_lossy().to_string();
    let transport = ScriptedTransport::new()
        .with_replies(["ok", "ok", "Grbl 1.1h ['$' for help]"])
        .with_default_reply("ok");
    let mut prompter = ScriptedPrompter::new(["send", path.as_str(), "", "quit"]);
    let mut console = console(&transport, &mut prompter, Config::default());

    console.run().unwrap();

    assert_eq!(transport.written_lines(), vec!["G90", "G0 X1", "G0 X2"]);
    let text = output(&console);
    assert!(text.contains("EMERGENCY STOPPING STREAMING at line 2"));
    assert!(text.contains("Streaming aborted after 2 of 3 lines"));
    assert_eq!(console.config().recent_files, vec![PathBuf::from(&path)]);
}
