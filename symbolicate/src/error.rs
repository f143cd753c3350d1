//! Error taxonomy for the symbolication pipeline.
//!
//! [`ValueError`] covers malformed input data (addresses, UUIDs) and is always fatal: it is
//! never swallowed by a caller's silent-mode setting. [`DebugInfoError`] and
//! [`SymbolicationError`] surface failures from reading dSYM bundles and resolving addresses;
//! callers may choose to treat these as non-fatal per frame.

use std::fmt;

use thiserror::Error;

/// A value taken from untrusted input (an address string, a UUID) could not be parsed.
///
/// Unlike the other error types in this module, a `ValueError` is never suppressed by
/// "silent" symbolication options: malformed input is a caller bug, not a missing symbol.
#[derive(Debug, Error)]
pub enum ValueError {
    /// An address string contained characters that are neither decimal nor `0x`-prefixed hex.
    #[error("invalid address value: {0:?}")]
    InvalidAddress(String),

    /// A JSON value that was expected to hold an address was of the wrong type.
    #[error("address value must be a string or number, found {0}")]
    InvalidAddressType(&'static str),

    /// A UUID string could not be parsed.
    #[error("invalid uuid: {0:?}")]
    InvalidUuid(String),
}

/// The specific reason a lookup inside a dSYM's DWARF data failed to find a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DwarfLookupErrorKind {
    /// None of the Mach-O slices in the dSYM match the requested CPU name.
    NoSuchArch,
    /// The object exists for this CPU but carries no usable debug info section.
    NoSuchSection,
    /// A required DWARF attribute was missing from an otherwise well-formed unit.
    NoSuchAttribute,
}

impl fmt::Display for DwarfLookupErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchArch => write!(f, "no slice matching the requested architecture"),
            Self::NoSuchSection => write!(f, "no debug info section for this architecture"),
            Self::NoSuchAttribute => write!(f, "required DWARF attribute is missing"),
        }
    }
}

/// An error encountered while opening a dSYM bundle or querying its debug information.
#[derive(Debug, Error)]
pub enum DebugInfoError {
    /// A typed miss while searching DWARF data for a covering function.
    #[error("dwarf lookup failed: {0}")]
    Lookup(DwarfLookupErrorKind),

    /// The Mach-O container itself could not be parsed.
    #[error("malformed mach-o container")]
    MachO(#[source] symbolic_debuginfo::macho::MachError),

    /// The DWARF data inside an otherwise valid Mach-O object could not be parsed.
    #[error("malformed dwarf data")]
    Dwarf(#[source] symbolic_debuginfo::dwarf::DwarfError),

    /// Reading the dSYM file from disk failed.
    #[error("failed to read debug info file")]
    Io(#[source] std::io::Error),
}

/// A failure while resolving one or more stack frames.
#[derive(Debug, Error)]
pub enum SymbolicationError {
    /// No CPU name could be determined for a frame from its own data, the report metadata, or
    /// the image index.
    #[error("no cpu architecture could be determined for this frame")]
    MissingCpu,

    /// Opening or querying the debug info backing a matched image failed.
    #[error(transparent)]
    DebugInfo(#[from] DebugInfoError),
}

/// An error surfaced while resolving a single report frame, distinguishing the always-fatal
/// [`ValueError`] from the optionally-silenced [`SymbolicationError`].
#[derive(Debug, Error)]
pub enum FrameError {
    /// Malformed input data; never suppressed regardless of silent mode.
    #[error(transparent)]
    Value(#[from] ValueError),

    /// A resolution failure; suppressed when the caller opts into silent mode.
    #[error(transparent)]
    Symbolication(#[from] SymbolicationError),
}
