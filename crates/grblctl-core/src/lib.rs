//! # grblctl Core
//!
//! Core types shared by every grblctl crate:
//! the error hierarchy, the operator session state (coordinate and
//! motor-lock modes) and the G-code macro templates.

pub mod data;
pub mod error;
pub mod macros;

pub use data::{CoordinateMode, LockMode, SessionState, StateEffect};

pub use error::{ConnectionError, Error, MacroError, Result, TransportError};

pub use macros::{
    format_number, parse_optional_float, parse_positive_float, MacroDefinition, MacroLibrary,
    ParamSpec, ProbeParams, Segment, Shortcut, Template, TemplateLine,
};
