//! `symbolic-crash` turns a native stack trace from an Apple crash report — raw instruction
//! addresses plus a list of loaded binary images — into resolved function names, source files,
//! and line numbers, using on-disk dSYM bundles.
//!
//! It is the orchestration layer built on top of the lower-level crates also in this workspace:
//!
//! - [`symbolic_common`] for the CPU registry and shared path/byte utilities.
//! - [`symbolic_debuginfo`] for Mach-O parsing and DWARF function/inline/line lookups.
//! - [`symbolic_demangle`] for Itanium C++ and Swift symbol demangling.
//!
//! # Pipeline
//!
//! A [`report::ReportSymbolicator`] is built from a set of dSYM search paths and a report's
//! `binary_images` list ([`image_index::ImageIndex`]). Resolving a frame runs it through
//! [`heuristics::find_best_instruction`] to locate the calling instruction, looks up the owning
//! image, computes an image-local offset, and hands that off to a [`symbolizer::Symbolizer`],
//! which queries a [`debuginfo::DebugInfoHandle`] and demangles the result.
//!
//! # Example
//!
//! ```no_run
//! use symbolic_crash::image_index::BinaryImage;
//! use symbolic_crash::report::{Frame, ReportSymbolicator, SymbolicateOptions};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let search_paths = vec![PathBuf::from("/path/to/dsyms")];
//! let images: Vec<BinaryImage> = serde_json::from_str("[]")?;
//! let symbolicator = ReportSymbolicator::new(&search_paths, &images)?;
//!
//! let frames: Vec<Frame> = serde_json::from_str("[]")?;
//! let resolved = symbolicator.symbolize_backtrace(&frames, &SymbolicateOptions::default(), None)?;
//! # let _ = resolved;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod address;
pub mod bulk;
pub mod debuginfo;
pub mod error;
pub mod heuristics;
pub mod image_index;
pub mod report;
pub mod symbolizer;

pub use crate::error::{DebugInfoError, DwarfLookupErrorKind, FrameError, SymbolicationError, ValueError};
pub use crate::report::{Frame, ReportSymbolicator, ResolvedFrame, SymbolicateOptions, SymbolicatorConfig};
