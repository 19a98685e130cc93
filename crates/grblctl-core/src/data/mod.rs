//! Session data models
//!
//! This module provides:
//! - Coordinate mode tracking (G90 absolute / G91 relative)
//! - Motor lock mode tracking
//! - The per-run session state rendered in the console prompt
//!
//! The state is derived purely from commands the host has sent; it is never
//! read back from the controller and exists only for display.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance mode the controller was last told to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CoordinateMode {
    /// G90, the GRBL power-on default
    #[default]
    Absolute,
    /// G91
    Relative,
}

impl CoordinateMode {
    /// Detect a mode-selecting word anywhere in a command line.
    ///
    /// Matching is a case-insensitive substring search for `g90` / `g91`.
    /// When both appear the later one wins, the same as on the controller.
    pub fn detect(line: &str) -> Option<Self> {
        let lower = line.to_ascii_lowercase();
        match (lower.rfind("g90"), lower.rfind("g91")) {
            (Some(abs), Some(rel)) if rel > abs => Some(Self::Relative),
            (Some(_), _) => Some(Self::Absolute),
            (None, Some(_)) => Some(Self::Relative),
            (None, None) => None,
        }
    }
}

impl fmt::Display for CoordinateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute => write!(f, "abs"),
            Self::Relative => write!(f, "rel"),
        }
    }
}

/// Whether the stepper motors are held energised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LockMode {
    /// Steppers stay enabled while idle
    Locked,
    /// Steppers release after the idle delay
    Unlocked,
    /// No lock command sent yet this session
    #[default]
    Unknown,
}

impl fmt::Display for LockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "lock"),
            Self::Unlocked => write!(f, "unlock"),
            Self::Unknown => write!(f, "?"),
        }
    }
}

/// A state change a macro applies after all of its lines were sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEffect {
    /// Record a new coordinate mode
    Coordinate(CoordinateMode),
    /// Record a new lock mode
    Lock(LockMode),
}

/// Process-wide operator session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Last coordinate mode sent to the controller
    pub coordinate_mode: CoordinateMode,
    /// Last motor lock mode sent to the controller
    pub lock_mode: LockMode,
}

impl SessionState {
    /// Create a fresh session state
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the coordinate mode from a command about to be transmitted.
    ///
    /// Returns the detected mode, or `None` when the command does not
    /// select one and the state is left untouched.
    pub fn observe_command(&mut self, line: &str) -> Option<CoordinateMode> {
        let mode = CoordinateMode::detect(line)?;
        if mode != self.coordinate_mode {
            tracing::debug!("Coordinate mode {} -> {}", self.coordinate_mode, mode);
        }
        self.coordinate_mode = mode;
        Some(mode)
    }

    /// Apply a macro's state effect
    pub fn apply(&mut self, effect: StateEffect) {
        match effect {
            StateEffect::Coordinate(mode) => self.coordinate_mode = mode,
            StateEffect::Lock(mode) => self.lock_mode = mode,
        }
    }

    /// Console prompt reflecting the current state, e.g. `(abs,lock) >>> `
    pub fn prompt(&self) -> String {
        format!("({},{}) >>> ", self.coordinate_mode, self.lock_mode)
    }
}
