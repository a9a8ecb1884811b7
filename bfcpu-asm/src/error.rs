//! Error types for the bfCPU assembler and object codec

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while decoding an Intel-hex object file
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HexError {
    #[error("hex file format error on line {line}: {reason}")]
    Format { line: usize, reason: &'static str },

    #[error("hex file overflows ROM size on line {line}: byte address {address:#06x} does not fit {capacity} cells")]
    Overflow { line: usize, address: usize, capacity: usize },

    #[error("hex file checksum unmatched on line {line}: computed {computed:02X}, recorded {recorded:02X}")]
    ChecksumMismatch { line: usize, computed: u8, recorded: u8 },

    #[error("byte address {address:#x} does not fit the 16-bit record address field")]
    AddressOutOfRange { address: usize },
}

/// Errors that can occur while building the instruction chain or emitting its artifacts
#[derive(Error, Debug)]
pub enum AsmError {
    #[error("cannot allocate memory for the instruction chain")]
    CannotAllocate,

    #[error("file name conflict: {first} and {second} resolve to {path:?}")]
    NameConflict { first: &'static str, second: &'static str, path: PathBuf },

    #[error("instruction at address {address:#06x} overflows ROM size of {capacity} cells")]
    RomOverflow { address: usize, capacity: usize },

    #[error("ROM size of {capacity} cells is outside 1..={max}")]
    CapacityOutOfRange { capacity: usize, max: usize },

    #[error(transparent)]
    Hex(#[from] HexError),

    #[error("cannot open {path:?}: {source}")]
    CannotOpen { path: PathBuf, source: std::io::Error },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for assembler operations
pub type Result<T> = std::result::Result<T, AsmError>;
