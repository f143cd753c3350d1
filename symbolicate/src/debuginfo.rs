//! Opens a dSYM's Mach-O container and answers address-range queries against the DWARF data
//! inside it.
//!
//! A [`DebugInfoHandle`] is deliberately thin: it keeps only the file's bytes and re-parses the
//! Mach-O/DWARF structure on every query. Parsing a Mach-O header and iterating DWARF units is
//! cheap relative to the I/O that already happened to mmap the file, and avoiding a stored,
//! self-referential parse tree keeps the handle free of unsafe lifetime tricks.

use std::fs::File;
use std::path::{Path, PathBuf};

use symbolic_common::{ByteView, Uuid};
use symbolic_debuginfo::macho::MachArchive;

use crate::error::{DebugInfoError, DwarfLookupErrorKind};

/// One architecture slice of a debug file, as reported by [`DebugInfoHandle::variants`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    /// The build UUID of this slice.
    pub uuid: Uuid,
    /// The canonical CPU name of this slice (e.g. `"arm64"`).
    pub cpu_name: String,
    /// The `__TEXT` segment's virtual base address.
    pub vmaddr: u64,
    /// The `__TEXT` segment's virtual size.
    pub vmsize: u64,
    /// The object's file name, if the container records one.
    pub name: Option<String>,
}

/// Selects a single [`Variant`] out of a multi-architecture debug file.
#[derive(Debug, Clone)]
pub enum VariantSelector {
    /// Select the slice with this build UUID.
    Uuid(Uuid),
    /// Select the slice matching this canonical CPU name.
    CpuName(String),
}

/// One frame of a resolved inline chain, innermost function first.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// The (possibly mangled) symbol name, or the sentinel `"<invalid>"` for data without a name.
    pub symbol: String,
    /// The compilation unit's `DW_AT_comp_dir`.
    pub compilation_dir: String,
    /// The source file's directory, relative to `compilation_dir`.
    pub file_dir: Option<String>,
    /// The source file's base name.
    pub file_name: Option<String>,
    /// The line number at this frame's offset, or 0 if no line record covers it.
    pub line: u32,
}

/// A handle to a dSYM (or bare Mach-O) file on disk, answering queries against the DWARF data of
/// whichever architecture slice a caller asks for.
pub struct DebugInfoHandle {
    path: PathBuf,
    data: ByteView<'static>,
}

impl DebugInfoHandle {
    /// Opens a debug file at `path`, mapping its contents into memory.
    ///
    /// Fails if the file does not exist, cannot be read, or is not a recognized Mach-O container.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DebugInfoError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(DebugInfoError::Io)?;
        let data = ByteView::map_file(file).map_err(DebugInfoError::Io)?;

        if !MachArchive::test(&data) {
            tracing::warn!(path = %path.display(), "not a recognized mach-o container");
            return Err(DebugInfoError::Lookup(DwarfLookupErrorKind::NoSuchArch));
        }

        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// The path this handle was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn archive(&self) -> Result<MachArchive<'_>, DebugInfoError> {
        MachArchive::parse(&self.data).map_err(DebugInfoError::MachO)
    }

    /// Lists every architecture slice in this debug file.
    pub fn variants(&self) -> Result<Vec<Variant>, DebugInfoError> {
        let archive = self.archive()?;
        let mut variants = Vec::with_capacity(archive.object_count());

        for object in archive.objects() {
            let object = object.map_err(DebugInfoError::MachO)?;
            variants.push(Variant {
                uuid: object.debug_id().uuid(),
                cpu_name: object.arch().name().to_string(),
                vmaddr: object.load_address(),
                vmsize: object.text_vmsize(),
                name: object.name().map(str::to_string),
            });
        }

        Ok(variants)
    }

    /// Finds a single [`Variant`] matching `selector`.
    pub fn variant(&self, selector: &VariantSelector) -> Result<Option<Variant>, DebugInfoError> {
        let variants = self.variants()?;
        Ok(match selector {
            VariantSelector::Uuid(uuid) => variants.into_iter().find(|v| &v.uuid == uuid),
            VariantSelector::CpuName(cpu_name) => {
                variants.into_iter().find(|v| &v.cpu_name == cpu_name)
            }
        })
    }

    /// Returns the `DW_AT_comp_dir` of the compilation unit that contributes `source_path`, for
    /// the slice matching `cpu_name`.
    ///
    /// Returns `None` both when the architecture is missing and when no unit claims the path;
    /// narrower [`DwarfLookupErrorKind`] reasons are available through [`Self::lookup`] for
    /// callers that need to distinguish them.
    pub fn compilation_dir(&self, cpu_name: &str, source_path: &str) -> Option<String> {
        let archive = self.archive().ok()?;
        for object in archive.objects() {
            let object = object.ok()?;
            if object.arch().name() != cpu_name {
                continue;
            }
            let session = object.debug_session().ok()?;
            for file in session.files() {
                let file = file.ok()?;
                if file.abs_path_str() == source_path {
                    return Some(file.compilation_dir_str().into_owned());
                }
            }
            return None;
        }
        None
    }

    /// Finds the innermost function (with its inline chain) covering `offset` in the slice
    /// matching `cpu_name`, returning the chain ordered innermost-first.
    ///
    /// An empty result means the architecture was found but no function covers this offset; a
    /// [`DwarfLookupErrorKind::NoSuchArch`] error means no slice matches `cpu_name` at all.
    pub fn lookup(&self, cpu_name: &str, offset: u64) -> Result<Vec<RawFrame>, DebugInfoError> {
        let archive = self.archive()?;

        for object in archive.objects() {
            let object = object.map_err(DebugInfoError::MachO)?;
            if object.arch().name() != cpu_name {
                continue;
            }

            if !object.has_debug_info() {
                return Err(DebugInfoError::Lookup(DwarfLookupErrorKind::NoSuchSection));
            }

            let session = object.debug_session().map_err(|err| {
                tracing::warn!(path = %self.path.display(), cpu_name, %err, "dwarf unit parse failed");
                DebugInfoError::Dwarf(err)
            })?;
            for function in session.functions() {
                let function = function.map_err(DebugInfoError::Dwarf)?;
                if function.address <= offset && offset < function.end_address() {
                    return Ok(collect_chain(&function, offset));
                }
            }

            return Ok(Vec::new());
        }

        Err(DebugInfoError::Lookup(DwarfLookupErrorKind::NoSuchArch))
    }
}

/// Descends the inline tree of `entry` to the deepest function still covering `offset`, then
/// builds the innermost-to-outermost frame list. Each level's displayed file/line is the line
/// record with the greatest address not exceeding `offset` *within that level's own lines* —
/// the call-site location for the next-inner function is recorded on the parent, so the same
/// `offset` resolves correctly at every depth.
fn collect_chain(entry: &symbolic_debuginfo::Function<'_>, offset: u64) -> Vec<RawFrame> {
    let mut chain = vec![entry];
    loop {
        let current = *chain.last().expect("chain always has at least one entry");
        match current
            .inlinees
            .iter()
            .find(|inlinee| inlinee.address <= offset && offset < inlinee.end_address())
        {
            Some(inlinee) => chain.push(inlinee),
            None => break,
        }
    }

    chain
        .into_iter()
        .rev()
        .map(|function| {
            let line_info = function
                .lines
                .iter()
                .rev()
                .find(|line| line.address <= offset);

            RawFrame {
                symbol: function.name.as_str().to_string(),
                compilation_dir: String::from_utf8_lossy(function.compilation_dir).into_owned(),
                file_dir: line_info.map(|l| l.file.dir_str().into_owned()),
                file_name: line_info.map(|l| l.file.name_str().into_owned()),
                line: line_info.map_or(0, |l| l.line as u32),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_io_error() {
        let result = DebugInfoHandle::open("/nonexistent/path/does/not/exist.dylib");
        assert!(matches!(result, Err(DebugInfoError::Io(_))));
    }
}
