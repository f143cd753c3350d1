//! Reading of Mach-O debug-information containers (dSYM bundles and the thin/fat object files
//! inside them) and the DWARF debugging data they carry.
//!
//! This crate is deliberately narrower than the object-format zoo its ancestor supported: only
//! Mach-O (thin and fat) plus DWARF are implemented, matching the Apple-only scope of the
//! symbolication pipeline built on top of it. [`macho::MachObject`] and [`macho::MachArchive`] are
//! the entry points; [`macho::MachObject::debug_session`] returns a [`dwarf::DwarfDebugSession`]
//! whose [`Function`] tree (with inlinees already attached) is what the symbolizer walks.
//!
//! [`Function`]: base::Function

#![warn(missing_docs)]

mod base;

pub mod dwarf;
pub mod function_builder;
pub mod macho;

pub use crate::base::*;
