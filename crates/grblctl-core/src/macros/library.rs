//! Built-in macro definitions
//!
//! Shortcuts are a fixed set of parameterless macros resolved by exact
//! name. The probe macro takes three numeric parameters, and the stream
//! start macro establishes a known coordinate frame before a file runs.

use super::template::Template;
use crate::data::{CoordinateMode, LockMode, StateEffect};
use crate::error::MacroError;
use std::collections::HashMap;
use std::fmt;

/// Probe sequence: switch to relative, probe down until contact, set Z to the
/// touch plate thickness, back off and restore absolute mode.
const PROBE_TEMPLATE: &str = "
G91
G38.2 Z-{maxdepth} F{speed}
G92 Z{thickness}
G91
G0 Z8
G90
";

const STREAM_START_TEMPLATE: &str = "G90";

/// A declared macro parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    /// Placeholder name used in the template
    pub name: String,
    /// Value used when the caller supplies none
    pub default: Option<f64>,
}

impl ParamSpec {
    /// Declare a parameter with a default value
    pub fn with_default(name: impl Into<String>, default: f64) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
        }
    }

    /// Declare a parameter that must always be supplied
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }
}

/// An immutable named macro
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDefinition {
    /// Name the operator types
    pub name: String,
    /// Human readable description
    pub description: String,
    /// G-code skeleton
    pub template: Template,
    /// Declared parameters and their defaults
    pub params: Vec<ParamSpec>,
    /// State change applied once every line has been sent
    pub effect: Option<StateEffect>,
}

impl MacroDefinition {
    /// Build a macro from template source
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        source: &str,
    ) -> Result<Self, MacroError> {
        Ok(Self {
            name: name.into(),
            description: description.into(),
            template: Template::parse(source)?,
            params: Vec::new(),
            effect: None,
        })
    }

    /// Declare a parameter
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Set the state effect
    pub fn with_effect(mut self, effect: StateEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Default value of a declared parameter
    pub fn default_for(&self, name: &str) -> Option<f64> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.default)
    }

    /// Render the template into concrete command lines.
    ///
    /// Each placeholder takes the supplied value, falling back to the
    /// declared default. Lines are trimmed and blank lines dropped.
    pub fn expand(&self, params: &HashMap<String, f64>) -> Result<Vec<String>, MacroError> {
        let mut lines = Vec::new();
        for line in self.template.lines() {
            let rendered = line
                .render(|name| params.get(name).copied().or_else(|| self.default_for(name)))
                .map_err(|param| MacroError::MissingParameter {
                    macro_name: self.name.clone(),
                    param,
                })?;
            let rendered = rendered.trim();
            if !rendered.is_empty() {
                lines.push(rendered.to_string());
            }
        }
        Ok(lines)
    }
}

/// The fixed set of shortcut macros
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    /// Make the current position the work origin
    Zero,
    /// Ask for a status report
    Where,
    /// Keep the steppers energised
    Lock,
    /// Let the steppers release when idle
    Unlock,
    /// Absolute coordinates
    Abs,
    /// Relative coordinates
    Rel,
    /// Run the homing cycle
    Home,
    /// Clear an alarm lock
    Reset,
}

impl Shortcut {
    /// Every shortcut, in help order
    pub const ALL: [Shortcut; 8] = [
        Shortcut::Zero,
        Shortcut::Where,
        Shortcut::Lock,
        Shortcut::Unlock,
        Shortcut::Abs,
        Shortcut::Rel,
        Shortcut::Home,
        Shortcut::Reset,
    ];

    /// Exact-match lookup of an operator command
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Command name
    pub fn name(self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::Where => "where",
            Self::Lock => "lock",
            Self::Unlock => "unlock",
            Self::Abs => "abs",
            Self::Rel => "rel",
            Self::Home => "home",
            Self::Reset => "reset",
        }
    }

    /// Help text
    pub fn description(self) -> &'static str {
        match self {
            Self::Zero => "set the current position as X0 Y0 Z0",
            Self::Where => "report machine state and position",
            Self::Lock => "keep stepper motors energised while idle",
            Self::Unlock => "release stepper motors after the idle delay",
            Self::Abs => "absolute coordinate mode (G90)",
            Self::Rel => "relative coordinate mode (G91)",
            Self::Home => "run the homing cycle",
            Self::Reset => "clear an alarm lock",
        }
    }

    fn source(self) -> &'static str {
        match self {
            Self::Zero => "G92 X0 Y0 Z0",
            Self::Where => "?",
            Self::Lock => "$1=255",
            Self::Unlock => "$1=25",
            Self::Abs => "G90",
            Self::Rel => "G91",
            Self::Home => "$H",
            Self::Reset => "$X",
        }
    }

    fn effect(self) -> Option<StateEffect> {
        match self {
            Self::Lock => Some(StateEffect::Lock(LockMode::Locked)),
            Self::Unlock => Some(StateEffect::Lock(LockMode::Unlocked)),
            Self::Abs => Some(StateEffect::Coordinate(CoordinateMode::Absolute)),
            Self::Rel => Some(StateEffect::Coordinate(CoordinateMode::Relative)),
            Self::Zero | Self::Where | Self::Home | Self::Reset => None,
        }
    }

    fn definition(self) -> Result<MacroDefinition, MacroError> {
        let def = MacroDefinition::new(self.name(), self.description(), self.source())?;
        Ok(match self.effect() {
            Some(effect) => def.with_effect(effect),
            None => def,
        })
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Parse an optional numeric token, keeping `fallback` when the token is
/// absent or not a finite number.
///
/// Probe arguments are forgiving on purpose: `probe 12 fast` keeps the
/// default speed instead of rejecting the whole command.
pub fn parse_optional_float(token: Option<&str>, fallback: f64) -> f64 {
    token
        .and_then(|t| t.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(fallback)
}

/// Like [`parse_optional_float`], but values that are not strictly
/// positive also keep `fallback`.
pub fn parse_positive_float(token: Option<&str>, fallback: f64) -> f64 {
    match parse_optional_float(token, fallback) {
        v if v > 0.0 => v,
        _ => fallback,
    }
}

/// Resolved probe parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeParams {
    /// Touch plate thickness; becomes the new Z position on contact
    pub thickness: f64,
    /// Probe feed rate
    pub speed: f64,
    /// Maximum probing travel below the start position
    pub maxdepth: f64,
}

impl Default for ProbeParams {
    fn default() -> Self {
        Self {
            thickness: 19.25,
            speed: 25.0,
            maxdepth: 10.0,
        }
    }
}

impl ProbeParams {
    /// Override thickness, speed and maxdepth from positional arguments.
    ///
    /// Speed and maxdepth must be positive; a zero or negative token keeps
    /// the default, like a non-numeric one. Thickness may be any number.
    pub fn with_args(&self, args: &[&str]) -> Self {
        Self {
            thickness: parse_optional_float(args.first().copied(), self.thickness),
            speed: parse_positive_float(args.get(1).copied(), self.speed),
            maxdepth: parse_positive_float(args.get(2).copied(), self.maxdepth),
        }
    }

    /// Parameter map for macro expansion
    pub fn to_map(&self) -> HashMap<String, f64> {
        HashMap::from([
            ("thickness".to_string(), self.thickness),
            ("speed".to_string(), self.speed),
            ("maxdepth".to_string(), self.maxdepth),
        ])
    }
}

impl fmt::Display for ProbeParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "thickness={} speed={} maxdepth={}",
            super::format_number(self.thickness),
            super::format_number(self.speed),
            super::format_number(self.maxdepth)
        )
    }
}

/// Every macro known to the console
#[derive(Debug, Clone)]
pub struct MacroLibrary {
    shortcuts: Vec<(Shortcut, MacroDefinition)>,
    probe: MacroDefinition,
    stream_start: MacroDefinition,
}

impl MacroLibrary {
    /// Build the library with the given probe defaults
    pub fn new(probe_defaults: ProbeParams) -> Result<Self, MacroError> {
        let shortcuts = Shortcut::ALL
            .into_iter()
            .map(|s| s.definition().map(|def| (s, def)))
            .collect::<Result<Vec<_>, _>>()?;

        let probe = MacroDefinition::new(
            "probe",
            "probe the work surface and set Z to the touch plate thickness",
            PROBE_TEMPLATE,
        )?
        .with_param(ParamSpec::with_default("thickness", probe_defaults.thickness))
        .with_param(ParamSpec::with_default("speed", probe_defaults.speed))
        .with_param(ParamSpec::with_default("maxdepth", probe_defaults.maxdepth))
        .with_effect(StateEffect::Coordinate(CoordinateMode::Absolute));

        let stream_start = MacroDefinition::new(
            "stream-start",
            "establish absolute coordinates before streaming",
            STREAM_START_TEMPLATE,
        )?
        .with_effect(StateEffect::Coordinate(CoordinateMode::Absolute));

        Ok(Self {
            shortcuts,
            probe,
            stream_start,
        })
    }

    /// Definition of a shortcut
    pub fn shortcut(&self, shortcut: Shortcut) -> Result<&MacroDefinition, MacroError> {
        self.shortcuts
            .iter()
            .find(|(s, _)| *s == shortcut)
            .map(|(_, def)| def)
            .ok_or_else(|| MacroError::UnknownMacro {
                name: shortcut.name().to_string(),
            })
    }

    /// The probe macro
    pub fn probe(&self) -> &MacroDefinition {
        &self.probe
    }

    /// The macro sent before every streamed file
    pub fn stream_start(&self) -> &MacroDefinition {
        &self.stream_start
    }

    /// Probe defaults as declared on the probe macro
    pub fn probe_defaults(&self) -> ProbeParams {
        let fallback = ProbeParams::default();
        ProbeParams {
            thickness: self.probe.default_for("thickness").unwrap_or(fallback.thickness),
            speed: self.probe.default_for("speed").unwrap_or(fallback.speed),
            maxdepth: self.probe.default_for("maxdepth").unwrap_or(fallback.maxdepth),
        }
    }
}
