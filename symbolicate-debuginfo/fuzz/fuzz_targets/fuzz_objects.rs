#![no_main]
use libfuzzer_sys::fuzz_target;

const MH_MAGIC: &[u8] = &0xfeed_face_u32.to_be_bytes();
const MH_MAGIC_64: &[u8] = &0xfeed_facf_u32.to_be_bytes();
const MH_MAGIC_LE: &[u8] = &0xfeed_face_u32.to_le_bytes();
const MH_MAGIC_64_LE: &[u8] = &0xfeed_facf_u32.to_le_bytes();
const FAT_MAGIC: &[u8] = &0xcafe_babe_u32.to_be_bytes();
const FAT_MAGIC_LE: &[u8] = &0xcafe_babe_u32.to_le_bytes();

fuzz_target!(|data: Vec<u8>| {
    // the reader rejects everything smaller than a Mach-O header anyway
    if data.len() < 16 {
        return;
    }
    let mut data = data;

    let magic = match data[0] % 6 {
        0 => MH_MAGIC,
        1 => MH_MAGIC_64,
        2 => MH_MAGIC_LE,
        3 => MH_MAGIC_64_LE,
        4 => FAT_MAGIC,
        _ => FAT_MAGIC_LE,
    };
    let len = magic.len().min(data.len());
    data[..len].copy_from_slice(&magic[..len]);

    if let Ok(archive) = symbolic_debuginfo::macho::MachArchive::parse(&data) {
        let num_objects = archive.object_count();

        for idx in 0..num_objects {
            if let Ok(Some(object)) = archive.object_by_index(idx) {
                test_object(&object);
            }
        }

        for object in archive.objects().flatten() {
            test_object(&object);
        }
    }
});

fn test_object(object: &symbolic_debuginfo::macho::MachObject<'_>) {
    let _ = object.file_format();
    let _ = object.code_id();
    let _ = object.debug_id();
    let _ = object.arch();
    let _ = object.kind();
    let _ = object.load_address();
    let _ = object.has_symbols();
    let _ = object.has_debug_info();
    let _ = object.has_unwind_info();
    let _ = object.has_sources();
    let _ = object.is_malformed();

    let _ = object.symbol_map();

    if let Ok(session) = object.debug_session() {
        for _ in session.functions() {}
        for _ in session.files() {}
    }
}
