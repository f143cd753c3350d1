//! Top-level orchestration: given an [`ImageIndex`] and a [`Symbolizer`], resolves whole crash
//! reports frame by frame without ever shortening the resulting stack.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::address::parse_address;
use crate::error::{FrameError, SymbolicationError, ValueError};
use crate::heuristics::{self, Registers};
use crate::image_index::{BinaryImage, ImageIndex};
use crate::symbolizer::{SymbolizedFrame, Symbolizer};

/// One input stack frame. Any JSON keys besides the ones named here are preserved verbatim in
/// the output via `extras`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Frame {
    /// The raw instruction address, as a JSON number or decimal/hex string.
    pub instruction_addr: Value,
    /// The frame's own object-relative address, if the caller supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_addr: Option<Value>,
    /// The frame's own image base address, if the caller supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_addr: Option<Value>,
    /// The CPU name for this specific frame, overriding the report-wide CPU.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_name: Option<String>,
    /// Unrecognized input keys, preserved unchanged in the output.
    #[serde(flatten)]
    pub extras: serde_json::Map<String, Value>,
}

impl Frame {
    fn merged(&self, resolved: &SymbolizedFrame) -> Frame {
        let mut extras = self.extras.clone();
        extras.insert(
            "symbol_name".to_string(),
            resolved.symbol_name.clone().map_or(Value::Null, Value::String),
        );
        extras.insert(
            "filename".to_string(),
            resolved.filename.clone().map_or(Value::Null, Value::String),
        );
        if let Some(abs_path) = &resolved.abs_path {
            extras.insert("abs_path".to_string(), Value::String(abs_path.clone()));
        }
        extras.insert("line".to_string(), Value::from(resolved.line));
        extras.insert("column".to_string(), Value::from(resolved.column));

        Frame {
            instruction_addr: self.instruction_addr.clone(),
            object_addr: self.object_addr.clone(),
            image_addr: self.image_addr.clone(),
            cpu_name: self.cpu_name.clone(),
            extras,
        }
    }

    fn unresolved(&self) -> ResolvedFrame {
        let mut extras = self.extras.clone();
        extras.entry("symbol_name").or_insert(Value::Null);
        extras.entry("filename").or_insert(Value::Null);
        extras.entry("line").or_insert_with(|| Value::from(0u32));
        extras.entry("column").or_insert_with(|| Value::from(0u32));

        ResolvedFrame(Frame {
            instruction_addr: self.instruction_addr.clone(),
            object_addr: self.object_addr.clone(),
            image_addr: self.image_addr.clone(),
            cpu_name: self.cpu_name.clone(),
            extras,
        })
    }
}

/// An input [`Frame`] merged with its resolved symbol, file, line, and column.
///
/// `symbol_name == None` means the frame is unresolved; `line`/`column` are 0 in that case.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ResolvedFrame(Frame);

/// Per-frame context supplied by the caller alongside the frame itself.
#[derive(Debug, Clone, Default)]
pub struct Meta {
    /// The frame's position in the backtrace; `Some(0)` is the innermost (crashing) frame.
    pub frame_number: Option<u32>,
    /// The signal that stopped the process, if any.
    pub signal: Option<u32>,
    /// Register values captured at the time of the crash.
    pub registers: Registers,
    /// A CPU name to use when the frame and the report's images disagree or are silent on it.
    pub cpu_name: Option<String>,
}

/// Behavior flags for [`ReportSymbolicator::symbolize_frame`] and `symbolize_backtrace`.
#[derive(Debug, Clone)]
pub struct SymbolicateOptions {
    /// When true (the default), a [`SymbolicationError`] is swallowed and the frame is returned
    /// unsymbolicated rather than propagated to the caller.
    pub silent: bool,
    /// Whether to demangle resolved symbol names.
    pub demangle: bool,
    /// Whether to resolve the full inline chain rather than just the innermost frame.
    pub symbolize_inlined: bool,
}

impl Default for SymbolicateOptions {
    fn default() -> Self {
        Self {
            silent: true,
            demangle: true,
            symbolize_inlined: false,
        }
    }
}

impl SymbolicateOptions {
    /// Builds the default per-call options from a [`SymbolicatorConfig`]'s construction-time
    /// defaults, keeping `silent: true`.
    pub fn from_config(config: &SymbolicatorConfig) -> Self {
        Self {
            silent: true,
            demangle: config.demangle,
            symbolize_inlined: config.symbolize_inlined,
        }
    }
}

/// Configuration for constructing a [`ReportSymbolicator`].
#[derive(Debug, Clone)]
pub struct SymbolicatorConfig {
    /// Directories and `.app.dSYM` bundles to search for debug files.
    pub dsym_search_paths: Vec<PathBuf>,
    /// Whether to demangle resolved symbol names by default.
    pub demangle: bool,
    /// Whether to resolve inline chains by default.
    pub symbolize_inlined: bool,
    /// Reserved for path-rewriting strictness; currently has no effect on resolution.
    pub strict_path_rewrite: bool,
}

impl Default for SymbolicatorConfig {
    fn default() -> Self {
        Self {
            dsym_search_paths: Vec::new(),
            demangle: true,
            symbolize_inlined: false,
            strict_path_rewrite: false,
        }
    }
}

/// Orchestrates address-to-symbol resolution for a whole crash report: finds the owning image,
/// adjusts for return-address heuristics, computes the image-local offset, and combines the
/// result back onto the original frame.
pub struct ReportSymbolicator {
    index: ImageIndex,
    symbolizer: Symbolizer,
}

impl ReportSymbolicator {
    /// Builds a symbolicator over the given search paths and the report's binary image list.
    pub fn new(
        dsym_search_paths: &[PathBuf],
        binary_images: &[BinaryImage],
    ) -> Result<Self, ValueError> {
        Ok(Self {
            index: ImageIndex::new(dsym_search_paths, binary_images)?,
            symbolizer: Symbolizer::new(),
        })
    }

    /// Builds a symbolicator from a [`SymbolicatorConfig`], using its `dsym_search_paths`.
    pub fn from_config(
        config: &SymbolicatorConfig,
        binary_images: &[BinaryImage],
    ) -> Result<Self, ValueError> {
        Self::new(&config.dsym_search_paths, binary_images)
    }

    /// The CPU name shared by every indexed image, or `None` if the images are mixed-arch.
    pub fn report_cpu(&self) -> Option<&str> {
        self.index.report_cpu()
    }

    /// Resolves a single frame, returning zero, one, or (in inlined mode) several resolved
    /// frames. An empty result on a non-fatal miss is distinct from an error: the caller decides
    /// via `options.silent` whether a resolution failure surfaces at all.
    pub fn symbolize_frame(
        &self,
        frame: &Frame,
        options: &SymbolicateOptions,
        meta: Option<&Meta>,
    ) -> Result<Vec<ResolvedFrame>, FrameError> {
        let cpu_name = frame
            .cpu_name
            .clone()
            .or_else(|| meta.and_then(|m| m.cpu_name.clone()))
            .or_else(|| self.report_cpu().map(str::to_string));

        let Some(cpu_name) = cpu_name else {
            return Self::handle_error(SymbolicationError::MissingCpu, options);
        };

        let instruction_addr = parse_address(&frame.instruction_addr)?;

        let heuristics_meta = meta.map(|m| heuristics::Meta {
            frame_number: m.frame_number,
            signal: m.signal,
            registers: Some(&m.registers),
        });
        let adjusted_addr =
            heuristics::find_best_instruction(instruction_addr, &cpu_name, heuristics_meta.as_ref());

        let Some(image) = self.index.find_image(adjusted_addr) else {
            return Ok(Vec::new());
        };

        let offset = image
            .image_vmaddr
            .wrapping_add(adjusted_addr)
            .wrapping_sub(image.image_addr);

        let result = if options.symbolize_inlined {
            self.symbolizer
                .symbolize_inlined(&image.dsym_path, offset, &cpu_name, options.demangle)
        } else {
            self.symbolizer
                .symbolize(&image.dsym_path, offset, &cpu_name, options.demangle)
                .map(|resolved| vec![resolved])
        };

        match result {
            Ok(resolved) => {
                let resolved = if options.symbolize_inlined {
                    resolved
                        .into_iter()
                        .filter(|r| r.symbol_name.is_some())
                        .collect()
                } else {
                    resolved
                };
                Ok(resolved.into_iter().map(|r| ResolvedFrame(frame.merged(&r))).collect())
            }
            Err(err) => Self::handle_error(err, options),
        }
    }

    /// Resolves every frame of a backtrace in order, numbering them by position so the heuristic
    /// can identify the innermost frame. Unresolved frames are preserved, never dropped.
    pub fn symbolize_backtrace(
        &self,
        frames: &[Frame],
        options: &SymbolicateOptions,
        base_meta: Option<&Meta>,
    ) -> Result<Vec<ResolvedFrame>, FrameError> {
        let mut out = Vec::with_capacity(frames.len());

        for (index, frame) in frames.iter().enumerate() {
            let meta = Meta {
                frame_number: Some(index as u32),
                ..base_meta.cloned().unwrap_or_default()
            };

            let resolved = self.symbolize_frame(frame, options, Some(&meta))?;
            if resolved.is_empty() {
                out.push(frame.unresolved());
            } else {
                out.extend(resolved);
            }
        }

        Ok(out)
    }

    fn handle_error(
        err: SymbolicationError,
        options: &SymbolicateOptions,
    ) -> Result<Vec<ResolvedFrame>, FrameError> {
        if options.silent {
            Ok(Vec::new())
        } else {
            Err(FrameError::Symbolication(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_binary_images_leaves_frames_unresolved() {
        let symbolicator = ReportSymbolicator::new(&[], &[]).unwrap();
        let frame = Frame {
            instruction_addr: Value::String("0x1000".to_string()),
            object_addr: None,
            image_addr: None,
            cpu_name: Some("arm64".to_string()),
            extras: serde_json::Map::new(),
        };

        let resolved = symbolicator
            .symbolize_backtrace(&[frame], &SymbolicateOptions::default(), None)
            .unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].0.extras.get("symbol_name"), Some(&Value::Null));
    }

    #[test]
    fn missing_cpu_is_an_error_when_not_silent() {
        let symbolicator = ReportSymbolicator::new(&[], &[]).unwrap();
        let frame = Frame {
            instruction_addr: Value::String("0x1000".to_string()),
            object_addr: None,
            image_addr: None,
            cpu_name: None,
            extras: serde_json::Map::new(),
        };
        let options = SymbolicateOptions {
            silent: false,
            ..SymbolicateOptions::default()
        };

        let err = symbolicator.symbolize_frame(&frame, &options, None).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Symbolication(SymbolicationError::MissingCpu)
        ));
    }

    #[test]
    fn malformed_address_is_always_fatal() {
        let symbolicator = ReportSymbolicator::new(&[], &[]).unwrap();
        let frame = Frame {
            instruction_addr: Value::String("not an address".to_string()),
            object_addr: None,
            image_addr: None,
            cpu_name: Some("arm64".to_string()),
            extras: serde_json::Map::new(),
        };
        let options = SymbolicateOptions {
            silent: true,
            ..SymbolicateOptions::default()
        };

        let err = symbolicator.symbolize_frame(&frame, &options, None).unwrap_err();
        assert!(matches!(err, FrameError::Value(_)));
    }
}
