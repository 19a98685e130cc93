//! G-code macros
//!
//! Templates are parsed into literal and placeholder segments and
//! expanded into concrete command lines. Expansion is pure and performs
//! no I/O; sending the lines is the console's job.

pub mod library;
pub mod template;

pub use library::{
    parse_optional_float, parse_positive_float, MacroDefinition, MacroLibrary, ParamSpec,
    ProbeParams, Shortcut,
};
pub use template::{format_number, Segment, Template, TemplateLine};
