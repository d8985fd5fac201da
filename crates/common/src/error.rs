#![allow(clippy::uninlined_format_args)]

//! Error related data structures to be shared and used.
//!
//! This module contains the [`Error`] enum, which is used to represent
//! errors that can occur within GbCore domain.

use std::fmt::{self, Display, Formatter};

/// Top level enum for error handling within GbCore.
///
/// Most of the time, you will want to use the `CustomError` variant
/// to provide a more detailed error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InvalidData,
    RomSize,
    IncompatibleBootRom,
    InvalidParameter(String),
    CustomError(String),

    /// Cartridge header is malformed: smaller than 0x150 bytes, or an
    /// unsupported/unknown MBC type byte at 0x147.
    InvalidCartridge(String),

    /// Save-state container failed validation: magic/version/ROM-hash
    /// mismatch, a truncated payload, or a subsystem field out of range.
    InvalidSavestate(String),

    /// External (battery-backed) RAM blob size does not match the size
    /// implied by the cartridge's RAM-size header byte.
    InvalidSaveRam(String),

    /// TAS recording JSON failed validation: schema violation, unknown
    /// button name, or non-monotonic frame indices.
    InvalidTasRecording(String),

    /// The CPU executed one of the eleven illegal LR35902 opcodes. The
    /// CPU halts; this is latched on the emulator and surfaced through an
    /// `error()` accessor rather than unwound immediately.
    CpuTrap(u8),
}

impl Error {
    pub fn description(&self) -> String {
        match self {
            Error::InvalidData => String::from("Invalid data format"),
            Error::RomSize => String::from("Invalid ROM size"),
            Error::IncompatibleBootRom => String::from("Incompatible Boot ROM"),
            Error::InvalidParameter(message) => format!("Invalid parameter: {}", message),
            Error::CustomError(message) => String::from(message),
            Error::InvalidCartridge(message) => format!("Invalid cartridge: {}", message),
            Error::InvalidSavestate(message) => format!("Invalid save state: {}", message),
            Error::InvalidSaveRam(message) => format!("Invalid save RAM: {}", message),
            Error::InvalidTasRecording(message) => format!("Invalid TAS recording: {}", message),
            Error::CpuTrap(opcode) => format!("CPU trap: illegal opcode 0x{:02x}", opcode),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::CustomError(value.to_string())
    }
}
