//! GRBL error and alarm code descriptions
//!
//! Used only to annotate replies shown to the operator. Error and alarm
//! replies are never acted on: they do not stop a stream.

/// Short description of a GRBL 1.1 error code
pub fn decode_error(code: u8) -> Option<&'static str> {
    let text = match code {
        1 => "G-code word missing its letter",
        2 => "bad or missing numeric value",
        3 => "'$' system command not recognized",
        4 => "negative value where a positive one was expected",
        5 => "homing cycle not enabled",
        6 => "step pulse time below 3us",
        7 => "EEPROM read failed, defaults restored",
        8 => "'$' command only valid when idle",
        9 => "G-code locked out during alarm or jog",
        10 => "soft limits require homing",
        11 => "line too long",
        12 => "setting exceeds maximum step rate",
        13 => "safety door opened",
        14 => "startup line too long for EEPROM",
        15 => "jog target exceeds machine travel",
        16 => "invalid jog command",
        17 => "laser mode requires PWM output",
        20 => "unsupported or invalid G-code command",
        21 => "more than one command from the same modal group",
        22 => "feed rate not set",
        23 => "command requires an integer value",
        24 => "more than one command needing axis words",
        25 => "repeated G-code word",
        26 => "command needs axis words but none were given",
        27 => "line number out of range",
        28 => "missing P or L value",
        29 => "unsupported work coordinate system",
        30 => "G53 requires G0 or G1",
        31 => "unused axis words with G80 active",
        32 => "arc without axis words in the selected plane",
        33 => "invalid motion target",
        34 => "arc radius error",
        35 => "arc missing offset word",
        36 => "unused G-code words left in block",
        37 => "tool length offset on the wrong axis",
        38 => "tool number too large",
        _ => return None,
    };
    Some(text)
}

/// Short description of a GRBL 1.1 alarm code
pub fn decode_alarm(code: u8) -> Option<&'static str> {
    let text = match code {
        1 => "hard limit triggered, re-home",
        2 => "soft limit: target exceeds machine travel",
        3 => "reset while in motion, re-home",
        4 => "probe not in expected initial state",
        5 => "probe did not make contact",
        6 => "homing reset",
        7 => "safety door opened while homing",
        8 => "homing failed to clear limit switch",
        9 => "homing could not find limit switch",
        _ => return None,
    };
    Some(text)
}

/// True when the reply is a bare acknowledgement
pub fn is_ok_response(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("ok")
}

/// True when any line of the reply is an `error:` or `ALARM:` report
pub fn is_error_response(text: &str) -> bool {
    text.lines().any(|line| {
        let line = line.trim().to_ascii_lowercase();
        line.starts_with("error:") || line.starts_with("alarm:")
    })
}

/// Describe every `error:N` / `ALARM:N` line in a reply.
///
/// Returns `None` when the reply has nothing to explain.
pub fn describe_response(text: &str) -> Option<String> {
    let notes: Vec<String> = text
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let lower = line.to_ascii_lowercase();
            if let Some(code) = lower.strip_prefix("error:") {
                let code = code.trim().parse::<u8>().ok()?;
                decode_error(code).map(|d| format!("{}: {}", line, d))
            } else if let Some(code) = lower.strip_prefix("alarm:") {
                let code = code.trim().parse::<u8>().ok()?;
                decode_alarm(code).map(|d| format!("{}: {}", line, d))
            } else {
                None
            }
        })
        .collect();

    if notes.is_empty() {
        None
    } else {
        Some(notes.join("\n"))
    }
}
