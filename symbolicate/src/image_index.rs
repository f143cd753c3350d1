//! Resolves a crash report's `binary_images` list to debug files on disk, and indexes the
//! result so a runtime address can be mapped back to the image that owns it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use symbolic_common::{cpu, Uuid};

use crate::address::parse_address;
use crate::debuginfo::DebugInfoHandle;
use crate::error::ValueError;

/// One entry of a crash report's `binary_images` array, as received from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct BinaryImage {
    /// The build UUID, with or without hyphens.
    pub uuid: String,
    /// The runtime load address, as a JSON number or a decimal/hex string.
    #[serde(default)]
    pub image_addr: serde_json::Value,
    /// The image-relative base address recorded in the debug file, if different from 0.
    #[serde(default)]
    pub image_vmaddr: serde_json::Value,
    /// The Mach-O `cputype`, used to derive `cpu_name` when it is absent.
    #[serde(default)]
    pub cpu_type: Option<i32>,
    /// The Mach-O `cpusubtype`, used to derive `cpu_name` when it is absent.
    #[serde(default)]
    pub cpu_subtype: Option<i32>,
    /// The canonical CPU name, when the caller already knows it.
    #[serde(default)]
    pub cpu_name: Option<String>,
}

impl BinaryImage {
    fn resolved_cpu_name(&self) -> Option<String> {
        self.cpu_name
            .as_deref()
            .filter(|name| cpu::is_valid(name))
            .map(str::to_string)
            .or_else(|| {
                let cpu_type = self.cpu_type?;
                let cpu_subtype = self.cpu_subtype?;
                cpu::name_of(cpu_type, cpu_subtype).map(str::to_string)
            })
    }
}

/// A resolved binary image: its load address and the debug file backing it.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    /// The build UUID.
    pub uuid: Uuid,
    /// The runtime load address of this image.
    pub image_addr: u64,
    /// The image-relative base address recorded in the debug file.
    pub image_vmaddr: u64,
    /// Path to the debug file backing this image.
    pub dsym_path: PathBuf,
    /// The canonical CPU name of this image.
    pub cpu_name: String,
}

/// An address-sorted index over a report's resolved binary images.
pub struct ImageIndex {
    entries: Vec<ImageEntry>,
    report_cpu: Option<String>,
}

impl ImageIndex {
    /// Builds an index from the search paths and the report's `binary_images` list.
    ///
    /// For each image whose CPU resolves, first probes `dsym_search_paths` for a file literally
    /// named by the image's UUID (the fast path), then falls back to scanning any search path
    /// that looks like a `.dSYM` bundle under `Contents/Resources/DWARF/` (the slow path).
    pub fn new(
        dsym_search_paths: &[PathBuf],
        binary_images: &[BinaryImage],
    ) -> Result<Self, ValueError> {
        tracing::debug!(
            search_paths = dsym_search_paths.len(),
            images = binary_images.len(),
            "building image index"
        );

        let mut wanted: HashMap<Uuid, String> = HashMap::new();
        for image in binary_images {
            let Some(cpu_name) = image.resolved_cpu_name() else {
                continue;
            };
            let Ok(uuid) = parse_uuid(&image.uuid) else {
                continue;
            };
            wanted.insert(uuid, cpu_name);
        }

        let mut bound: HashMap<Uuid, PathBuf> = HashMap::new();

        for uuid in wanted.keys() {
            for search_path in dsym_search_paths {
                let candidate = search_path.join(uuid.to_string());
                if candidate.is_file() {
                    bound.insert(*uuid, candidate);
                    break;
                }
            }
        }

        if bound.len() < wanted.len() {
            for search_path in dsym_search_paths {
                if !looks_like_bundle(search_path) {
                    continue;
                }

                let dwarf_dir = search_path.join("Contents/Resources/DWARF");
                let Ok(read_dir) = std::fs::read_dir(&dwarf_dir) else {
                    continue;
                };

                for entry in read_dir.flatten() {
                    let path = entry.path();
                    if !path.is_file() {
                        continue;
                    }

                    let Ok(handle) = DebugInfoHandle::open(&path) else {
                        tracing::warn!(path = %path.display(), "skipping unreadable debug file");
                        continue;
                    };
                    let Ok(variants) = handle.variants() else {
                        tracing::warn!(path = %path.display(), "skipping malformed debug file");
                        continue;
                    };

                    for variant in variants {
                        if wanted.contains_key(&variant.uuid) && !bound.contains_key(&variant.uuid)
                        {
                            bound.insert(variant.uuid, path.clone());
                        }
                    }
                }
            }
        }

        let mut entries = Vec::new();
        for image in binary_images {
            let Ok(uuid) = parse_uuid(&image.uuid) else {
                continue;
            };
            let Some(cpu_name) = wanted.get(&uuid) else {
                continue;
            };
            let Some(dsym_path) = bound.get(&uuid) else {
                continue;
            };

            let image_addr = parse_address(&image.image_addr)?;
            let image_vmaddr = parse_address(&image.image_vmaddr)?;

            entries.push(ImageEntry {
                uuid,
                image_addr,
                image_vmaddr,
                dsym_path: dsym_path.clone(),
                cpu_name: cpu_name.clone(),
            });
        }

        entries.sort_by_key(|entry| entry.image_addr);

        let report_cpu = match entries.first() {
            Some(first) if entries.iter().all(|e| e.cpu_name == first.cpu_name) => {
                Some(first.cpu_name.clone())
            }
            _ => None,
        };

        tracing::debug!(
            bound = entries.len(),
            wanted = wanted.len(),
            report_cpu = report_cpu.as_deref().unwrap_or("mixed"),
            "image index built"
        );

        Ok(Self { entries, report_cpu })
    }

    /// Finds the image with the greatest `image_addr` not exceeding `addr`.
    ///
    /// Returns `None` for `addr == 0` and for any address lower than every image's base;
    /// addresses past the last image's extent still resolve to that image.
    pub fn find_image(&self, addr: u64) -> Option<&ImageEntry> {
        if addr == 0 {
            return None;
        }

        match self.entries.binary_search_by_key(&addr, |e| e.image_addr) {
            Ok(index) => Some(&self.entries[index]),
            Err(0) => None,
            Err(index) => Some(&self.entries[index - 1]),
        }
    }

    /// The CPU name shared by every indexed image, or `None` when the set is empty or mixed.
    pub fn report_cpu(&self) -> Option<&str> {
        self.report_cpu.as_deref()
    }
}

fn looks_like_bundle(path: &Path) -> bool {
    path.join("Contents").is_dir()
}

fn parse_uuid(raw: &str) -> Result<Uuid, ValueError> {
    Uuid::parse_str(raw).map_err(|_| ValueError::InvalidUuid(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_index_never_finds_an_image() {
        let index = ImageIndex::new(&[], &[]).unwrap();
        assert!(index.find_image(0x1000).is_none());
        assert!(index.report_cpu().is_none());
    }

    #[test]
    fn address_zero_never_resolves() {
        let index = ImageIndex::new(&[], &[]).unwrap();
        assert!(index.find_image(0).is_none());
    }

    #[test]
    fn an_unrecognized_cpu_name_is_not_accepted_verbatim() {
        let image = BinaryImage {
            uuid: "8094558b-3641-36f7-ba80-a1aaabcf72da".to_string(),
            image_addr: serde_json::json!("0x1000"),
            image_vmaddr: serde_json::Value::Null,
            cpu_type: None,
            cpu_subtype: None,
            cpu_name: Some("bogus".to_string()),
        };
        assert_eq!(image.resolved_cpu_name(), None);
    }

    #[test]
    fn a_valid_cpu_name_is_accepted_without_the_type_subtype_pair() {
        let image = BinaryImage {
            uuid: "8094558b-3641-36f7-ba80-a1aaabcf72da".to_string(),
            image_addr: serde_json::json!("0x1000"),
            image_vmaddr: serde_json::Value::Null,
            cpu_type: None,
            cpu_subtype: None,
            cpu_name: Some("arm64".to_string()),
        };
        assert_eq!(image.resolved_cpu_name().as_deref(), Some("arm64"));
    }
}
