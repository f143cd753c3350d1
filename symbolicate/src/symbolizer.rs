//! Turns an image-local offset into a resolved symbol, file, and line, caching opened debug
//! files across calls.
//!
//! The "external low-level resolver" the distilled design assumes a native library for is, here,
//! just [`DebugInfoHandle`] itself: `gimli` and `goblin` run in-process, so there is nothing to
//! initialize beyond the handle cache. A single [`parking_lot::Mutex`] serializes access to that
//! cache, matching the non-reentrant locking policy decided on for this crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use symbolic_common::{clean_path, join_path};

use crate::debuginfo::{DebugInfoHandle, RawFrame};
use crate::error::SymbolicationError;

const INVALID_SYMBOL: &str = "<invalid>";

/// The resolved identity of a single frame: symbol name, source location, and path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolizedFrame {
    /// The demangled (or raw, if demangling is disabled) symbol name. `None` means unresolved.
    pub symbol_name: Option<String>,
    /// The source file path relative to the compilation directory, if it could be determined.
    pub filename: Option<String>,
    /// The absolute source file path, if any line information was found.
    pub abs_path: Option<String>,
    /// The 1-based source line, or 0 if unresolved.
    pub line: u32,
    /// The source column. Always 0: the DWARF line program this crate reads does not carry
    /// column information.
    pub column: u32,
}

/// Resolves addresses inside dSYM files, caching one [`DebugInfoHandle`] per path for the
/// lifetime of the symbolizer.
pub struct Symbolizer {
    handles: Mutex<HashMap<PathBuf, Arc<DebugInfoHandle>>>,
}

impl Default for Symbolizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Symbolizer {
    /// Creates a symbolizer with an empty handle cache.
    pub fn new() -> Self {
        Self {
            handles: Mutex::new(HashMap::new()),
        }
    }

    fn handle_for(&self, dsym_path: &Path) -> Result<Arc<DebugInfoHandle>, SymbolicationError> {
        let mut handles = self.handles.lock();
        if let Some(handle) = handles.get(dsym_path) {
            tracing::trace!(path = %dsym_path.display(), "debug info handle cache hit");
            return Ok(handle.clone());
        }

        tracing::debug!(path = %dsym_path.display(), "opening debug info handle");
        let handle = Arc::new(DebugInfoHandle::open(dsym_path)?);
        handles.insert(dsym_path.to_path_buf(), handle.clone());
        Ok(handle)
    }

    /// Resolves the innermost frame at `offset`, never the inline chain above it.
    ///
    /// The handle cache key is logically `dsym_path + ':' + cpu_name`, matching the original
    /// resolver's cache-key convention; this implementation keys the cache on `dsym_path` alone
    /// and lets `cpu_name` select a [`crate::debuginfo::Variant`] within the handle, since a
    /// single handle already demultiplexes every architecture slice of a file.
    pub fn symbolize(
        &self,
        dsym_path: &Path,
        offset: u64,
        cpu_name: &str,
        demangle: bool,
    ) -> Result<SymbolizedFrame, SymbolicationError> {
        let handle = self.handle_for(dsym_path)?;
        let frames = handle.lookup(cpu_name, offset)?;
        match frames.into_iter().next() {
            Some(raw) => Ok(finish_frame(&raw, demangle)),
            None => Ok(SymbolizedFrame::default()),
        }
    }

    /// Resolves the full inline chain at `offset`, ordered innermost to outermost.
    pub fn symbolize_inlined(
        &self,
        dsym_path: &Path,
        offset: u64,
        cpu_name: &str,
        demangle: bool,
    ) -> Result<Vec<SymbolizedFrame>, SymbolicationError> {
        let handle = self.handle_for(dsym_path)?;
        let frames = handle.lookup(cpu_name, offset)?;
        Ok(frames.iter().map(|raw| finish_frame(raw, demangle)).collect())
    }
}

fn finish_frame(raw: &RawFrame, demangle: bool) -> SymbolizedFrame {
    let symbol_name = if raw.symbol == INVALID_SYMBOL {
        None
    } else if demangle {
        Some(symbolic_demangle::demangle(&raw.symbol).into_owned())
    } else {
        Some(raw.symbol.clone())
    };

    let abs_path = raw.file_name.as_ref().map(|name| {
        let relative = join_path(raw.file_dir.as_deref().unwrap_or(""), name);
        clean_path(&join_path(&raw.compilation_dir, &relative)).into_owned()
    });

    let filename = abs_path.as_ref().and_then(|abs_path| {
        if raw.compilation_dir.is_empty() {
            return None;
        }
        abs_path
            .strip_prefix(raw.compilation_dir.as_str())
            .map(|rest| rest.trim_start_matches('/').to_string())
    });

    SymbolizedFrame {
        symbol_name,
        filename,
        abs_path,
        line: raw.line,
        column: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sentinel_demangles_to_none() {
        let raw = RawFrame {
            symbol: INVALID_SYMBOL.to_string(),
            compilation_dir: String::new(),
            file_dir: None,
            file_name: None,
            line: 0,
        };
        assert_eq!(finish_frame(&raw, true).symbol_name, None);
    }

    #[test]
    fn filename_is_relative_to_compilation_dir() {
        let raw = RawFrame {
            symbol: "_main".to_string(),
            compilation_dir: "/Users/dev/Project".to_string(),
            file_dir: Some("Sources".to_string()),
            file_name: Some("main.swift".to_string()),
            line: 42,
        };
        let frame = finish_frame(&raw, false);
        assert_eq!(frame.filename.as_deref(), Some("Sources/main.swift"));
        assert_eq!(
            frame.abs_path.as_deref(),
            Some("/Users/dev/Project/Sources/main.swift")
        );
        assert_eq!(frame.line, 42);
    }
}
