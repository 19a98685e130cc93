//! Firmware-specific knowledge
//!
//! Only GRBL-class controllers are supported. The host deliberately knows
//! very little about the protocol: it recognises the boot banner and can
//! put a name to numbered error and alarm replies for display.

pub mod grbl;
