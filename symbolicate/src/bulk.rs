//! Reader and writer for the bulk symbol archive format produced by an external bulk-extraction
//! tool: a zip file carrying one JSON entry per build UUID, plus a `path_index` and `sdk_info`
//! entry, matching the teacher's own [`zip`][symbolic_debuginfo::sourcebundle]-based archive
//! conventions.
//!
//! Producing the *contents* of such an archive (running an external symbol dumper against a
//! device image) is out of scope here; this module only reads and writes the container format
//! for interoperability with tools that do.

use std::collections::BTreeMap;
use std::io::{Read, Seek, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const PATH_INDEX_ENTRY: &str = "path_index";
const SDK_INFO_ENTRY: &str = "sdk_info";

/// One `[address_hex, symbol_name]` pair from a [`UuidEntry::symbols`] list.
pub type SymbolEntry = (String, String);

/// The per-architecture symbol table for a single build UUID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UuidEntry {
    /// The canonical CPU name this entry was extracted for.
    pub arch: String,
    /// The original image path the symbols were extracted from.
    pub image: String,
    /// The build UUID, matching the zip entry's own name.
    pub uuid: String,
    /// The image's virtual base address.
    pub vmaddr: u64,
    /// The image's virtual size.
    pub vmsize: u64,
    /// Address/name pairs, sorted ascending by address.
    pub symbols: Vec<SymbolEntry>,
}

/// SDK version metadata carried alongside an archive's symbol entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SdkInfo {
    /// Major OS version, e.g. `16` for iOS 16.x.
    pub version_major: u32,
    /// Minor OS version.
    pub version_minor: u32,
    /// Patch level.
    pub version_patchlevel: u32,
    /// The build identifier, e.g. `"20C65"`.
    pub version_build: String,
}

/// Maps an original image path to the UUID extracted for each architecture it was built for.
pub type PathIndex = BTreeMap<String, BTreeMap<String, String>>;

/// An error reading or writing a [`BulkArchive`].
#[derive(Debug, Error)]
pub enum BulkArchiveError {
    /// The zip container itself is malformed.
    #[error("malformed bulk archive")]
    Zip(#[from] zip::result::ZipError),
    /// An entry's JSON body could not be parsed or serialized.
    #[error("malformed bulk archive entry")]
    Json(#[from] serde_json::Error),
    /// Reading or writing the underlying stream failed.
    #[error("bulk archive i/o failure")]
    Io(#[from] std::io::Error),
}

/// A parsed bulk symbol archive: one [`UuidEntry`] per build UUID, plus the path index and
/// optional SDK metadata.
#[derive(Debug, Clone, Default)]
pub struct BulkArchive {
    /// Entries keyed by build UUID.
    pub entries: BTreeMap<String, UuidEntry>,
    /// Maps original image paths to their per-architecture UUIDs.
    pub path_index: PathIndex,
    /// SDK version metadata, if the archive carries it.
    pub sdk_info: Option<SdkInfo>,
}

impl BulkArchive {
    /// Reads a bulk archive from a zip stream.
    pub fn open<R: Read + Seek>(reader: R) -> Result<Self, BulkArchiveError> {
        let mut zip = ZipArchive::new(reader)?;
        let mut archive = BulkArchive::default();

        for index in 0..zip.len() {
            let mut file = zip.by_index(index)?;
            let name = file.name().to_string();
            let mut contents = String::new();
            file.read_to_string(&mut contents)?;

            match name.as_str() {
                PATH_INDEX_ENTRY => archive.path_index = serde_json::from_str(&contents)?,
                SDK_INFO_ENTRY => archive.sdk_info = Some(serde_json::from_str(&contents)?),
                uuid => {
                    let entry: UuidEntry = serde_json::from_str(&contents)?;
                    archive.entries.insert(uuid.to_string(), entry);
                }
            }
        }

        Ok(archive)
    }

    /// Writes this archive out as a zip stream.
    pub fn write<W: Write + Seek>(&self, writer: W) -> Result<(), BulkArchiveError> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default();

        for (uuid, entry) in &self.entries {
            zip.start_file(uuid, options)?;
            zip.write_all(serde_json::to_string(entry)?.as_bytes())?;
        }

        zip.start_file(PATH_INDEX_ENTRY, options)?;
        zip.write_all(serde_json::to_string(&self.path_index)?.as_bytes())?;

        if let Some(sdk_info) = &self.sdk_info {
            zip.start_file(SDK_INFO_ENTRY, options)?;
            zip.write_all(serde_json::to_string(sdk_info)?.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Normalizes a raw image path by stripping a leading `<major>.<minor>[.<patch>] (<build>)`
    /// OS-version segment and a leading `Symbols/` segment, then re-rooting at `/`.
    pub fn normalize_path(path: &str) -> String {
        let trimmed = path.trim_start_matches('/');
        let mut segments: Vec<&str> = trimmed.split('/').collect();

        if segments.first().is_some_and(|first| is_os_version_segment(first)) {
            segments.remove(0);
        }
        if segments.first() == Some(&"Symbols") {
            segments.remove(0);
        }

        format!("/{}", segments.join("/"))
    }
}

fn is_os_version_segment(segment: &str) -> bool {
    let Some((version, build)) = segment.split_once(" (") else {
        return false;
    };
    if !build.ends_with(')') {
        return false;
    }

    let parts: Vec<&str> = version.split('.').collect();
    matches!(parts.len(), 2 | 3) && parts.iter().all(|p| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_archive() -> BulkArchive {
        let mut entries = BTreeMap::new();
        entries.insert(
            "8094558b-3641-36f7-ba80-a1aaabcf72da".to_string(),
            UuidEntry {
                arch: "armv7".to_string(),
                image: "/usr/lib/libfoo.dylib".to_string(),
                uuid: "8094558b-3641-36f7-ba80-a1aaabcf72da".to_string(),
                vmaddr: 0x1000,
                vmsize: 0x4000,
                symbols: vec![
                    ("0x1000".to_string(), "_foo".to_string()),
                    ("0x2000".to_string(), "_bar".to_string()),
                ],
            },
        );

        let mut path_index = PathIndex::new();
        path_index.insert(
            "/usr/lib/libfoo.dylib".to_string(),
            BTreeMap::from([(
                "armv7".to_string(),
                "8094558b-3641-36f7-ba80-a1aaabcf72da".to_string(),
            )]),
        );

        BulkArchive {
            entries,
            path_index,
            sdk_info: Some(SdkInfo {
                version_major: 16,
                version_minor: 2,
                version_patchlevel: 0,
                version_build: "20C65".to_string(),
            }),
        }
    }

    #[test]
    fn round_trips_through_a_zip_stream() {
        let archive = sample_archive();
        let mut buffer = Cursor::new(Vec::new());
        archive.write(&mut buffer).unwrap();

        buffer.set_position(0);
        let read_back = BulkArchive::open(buffer).unwrap();

        assert_eq!(read_back.entries.len(), 1);
        assert_eq!(
            read_back.entries["8094558b-3641-36f7-ba80-a1aaabcf72da"].arch,
            "armv7"
        );
        assert_eq!(read_back.sdk_info.unwrap().version_build, "20C65");
        assert_eq!(read_back.path_index.len(), 1);
    }

    #[test]
    fn normalizes_version_and_symbols_prefixes() {
        assert_eq!(
            BulkArchive::normalize_path("16.2 (20C65)/Symbols/usr/lib/libfoo.dylib"),
            "/usr/lib/libfoo.dylib"
        );
        assert_eq!(
            BulkArchive::normalize_path("/usr/lib/libfoo.dylib"),
            "/usr/lib/libfoo.dylib"
        );
    }
}
