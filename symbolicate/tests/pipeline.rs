//! Integration tests driving [`ReportSymbolicator`] through the real filesystem-backed image
//! index (fast-path UUID lookup) without requiring a genuine Mach-O/DWARF fixture on disk.

use serde_json::json;
use symbolic_crash::image_index::BinaryImage;
use symbolic_crash::report::{Frame, ReportSymbolicator, SymbolicateOptions};

const UUID: &str = "8094558b-3641-36f7-ba80-a1aaabcf72da";

fn binary_images() -> Vec<BinaryImage> {
    serde_json::from_value(json!([{
        "uuid": UUID,
        "image_addr": "0x1000",
        "cpu_name": "arm64",
    }]))
    .unwrap()
}

fn frame_at(addr: &str) -> Frame {
    serde_json::from_value(json!({ "instruction_addr": addr })).unwrap()
}

#[test]
fn fast_path_binds_a_literally_named_file_and_then_fails_to_parse_it_silently() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(UUID), b"not a mach-o file").unwrap();

    let symbolicator = ReportSymbolicator::new(&[dir.path().to_path_buf()], &binary_images())
        .expect("building the index over a bound-but-unparseable file must not itself fail");

    assert_eq!(symbolicator.report_cpu(), Some("arm64"));

    let resolved = symbolicator
        .symbolize_backtrace(
            &[frame_at("0x1004")],
            &SymbolicateOptions::default(),
            None,
        )
        .expect("silent mode swallows the malformed-debug-file error");

    assert_eq!(resolved.len(), 1);
    let serialized = serde_json::to_value(&resolved[0]).unwrap();
    assert_eq!(serialized["symbol_name"], serde_json::Value::Null);
    assert_eq!(serialized["line"], 0);
}

#[test]
fn non_silent_mode_surfaces_the_malformed_debug_file_as_an_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(UUID), b"not a mach-o file").unwrap();

    let symbolicator =
        ReportSymbolicator::new(&[dir.path().to_path_buf()], &binary_images()).unwrap();

    let options = SymbolicateOptions {
        silent: false,
        ..SymbolicateOptions::default()
    };

    let err = symbolicator
        .symbolize_frame(&frame_at("0x1004"), &options, None)
        .expect_err("a non-mach-o debug file must surface as an error when silent = false");

    assert!(matches!(
        err,
        symbolic_crash::FrameError::Symbolication(symbolic_crash::SymbolicationError::DebugInfo(_))
    ));
}

#[test]
fn an_address_below_every_image_is_never_resolved() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(UUID), b"not a mach-o file").unwrap();

    let symbolicator =
        ReportSymbolicator::new(&[dir.path().to_path_buf()], &binary_images()).unwrap();

    let resolved = symbolicator
        .symbolize_backtrace(&[frame_at("0x10")], &SymbolicateOptions::default(), None)
        .unwrap();

    assert_eq!(resolved.len(), 1);
    let serialized = serde_json::to_value(&resolved[0]).unwrap();
    assert_eq!(serialized["instruction_addr"], "0x10");
    assert_eq!(serialized["symbol_name"], serde_json::Value::Null);
}

#[test]
fn an_unresolvable_dsym_path_never_shortens_the_backtrace() {
    // No search paths at all: every frame is unresolved, but the backtrace comes back intact.
    let symbolicator = ReportSymbolicator::new(&[], &binary_images()).unwrap();

    let frames = vec![frame_at("0x1000"), frame_at("0x1004"), frame_at("0x1008")];
    let resolved = symbolicator
        .symbolize_backtrace(&frames, &SymbolicateOptions::default(), None)
        .unwrap();

    assert_eq!(resolved.len(), frames.len());
}
