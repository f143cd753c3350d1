//! The CPU registry: a bidirectional mapping between Mach-O `(cpu_type, cpu_subtype)` pairs and
//! canonical CPU names, plus the small set of per-CPU constants the rest of the pipeline consults
//! on every frame (instruction alignment, instruction pointer register name).
//!
//! All lookups here are plain `match` statements over [`Arch`](crate::Arch) — constant-time,
//! allocation-free, and safe to call from hot per-frame code.

use goblin::mach::constants::cputype;

use crate::types::Arch;

/// Canonical name for a `(cpu_type, cpu_subtype)` pair, or `None` if the pair is not recognized.
///
/// ```
/// use symbolic_common::cpu::name_of;
///
/// assert_eq!(name_of(12, 9), Some("armv7"));
/// ```
pub fn name_of(cpu_type: i32, cpu_subtype: i32) -> Option<&'static str> {
    let arch = arch_of(cpu_type, cpu_subtype)?;
    if arch.well_known() {
        Some(arch.name())
    } else {
        None
    }
}

/// Like [`name_of`], but returns the internal [`Arch`] representation instead of its string name.
/// Unknown pairs still resolve to the appropriate `*Unknown` variant rather than `None`, which is
/// what the Mach-O reader needs to keep iterating architecture slices it cannot fully identify.
pub fn arch_of(cpu_type: i32, cpu_subtype: i32) -> Option<Arch> {
    // goblin's cputype constants are untyped i64/u32 depending on platform; cast down for the match.
    let cpu_subtype = cpu_subtype & !(cputype::CPU_SUBTYPE_MASK as i32);

    Some(match (cpu_type, cpu_subtype) {
        (cputype::CPU_TYPE_I386, cputype::CPU_SUBTYPE_I386_ALL) => Arch::X86,
        (cputype::CPU_TYPE_I386, _) => Arch::X86Unknown,
        (cputype::CPU_TYPE_X86_64, cputype::CPU_SUBTYPE_X86_64_ALL) => Arch::Amd64,
        (cputype::CPU_TYPE_X86_64, cputype::CPU_SUBTYPE_X86_64_H) => Arch::Amd64h,
        (cputype::CPU_TYPE_X86_64, _) => Arch::Amd64Unknown,
        (cputype::CPU_TYPE_ARM64, cputype::CPU_SUBTYPE_ARM64_ALL) => Arch::Arm64,
        (cputype::CPU_TYPE_ARM64, cputype::CPU_SUBTYPE_ARM64_V8) => Arch::Arm64V8,
        (cputype::CPU_TYPE_ARM64, cputype::CPU_SUBTYPE_ARM64_E) => Arch::Arm64e,
        (cputype::CPU_TYPE_ARM64, _) => Arch::Arm64Unknown,
        (cputype::CPU_TYPE_ARM64_32, cputype::CPU_SUBTYPE_ARM64_32_ALL) => Arch::Arm64_32,
        (cputype::CPU_TYPE_ARM64_32, cputype::CPU_SUBTYPE_ARM64_32_V8) => Arch::Arm64_32V8,
        (cputype::CPU_TYPE_ARM64_32, _) => Arch::Arm64_32Unknown,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_ALL) => Arch::Arm,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_V5TEJ) => Arch::ArmV5,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_V6) => Arch::ArmV6,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_V6M) => Arch::ArmV6m,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_V7) => Arch::ArmV7,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_V7F) => Arch::ArmV7f,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_V7S) => Arch::ArmV7s,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_V7K) => Arch::ArmV7k,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_V7M) => Arch::ArmV7m,
        (cputype::CPU_TYPE_ARM, cputype::CPU_SUBTYPE_ARM_V7EM) => Arch::ArmV7em,
        (cputype::CPU_TYPE_ARM, _) => Arch::ArmUnknown,
        (cputype::CPU_TYPE_POWERPC, cputype::CPU_SUBTYPE_POWERPC_ALL) => Arch::Ppc,
        (cputype::CPU_TYPE_POWERPC64, cputype::CPU_SUBTYPE_POWERPC_ALL) => Arch::Ppc64,
        _ => return None,
    })
}

/// `(cpu_type, cpu_subtype)` for a canonical CPU name, or `None` if the name is not recognized.
///
/// ```
/// use symbolic_common::cpu::{name_of, tuple_of};
///
/// let (cpu_type, cpu_subtype) = tuple_of("arm64").unwrap();
/// assert_eq!(name_of(cpu_type, cpu_subtype), Some("arm64"));
/// ```
pub fn tuple_of(name: &str) -> Option<(i32, i32)> {
    use cputype::*;

    Some(match name {
        "x86" => (CPU_TYPE_I386, CPU_SUBTYPE_I386_ALL),
        "x86_64" => (CPU_TYPE_X86_64, CPU_SUBTYPE_X86_64_ALL),
        "x86_64h" => (CPU_TYPE_X86_64, CPU_SUBTYPE_X86_64_H),
        "arm64" => (CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_ALL),
        "arm64v8" => (CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_V8),
        "arm64e" => (CPU_TYPE_ARM64, CPU_SUBTYPE_ARM64_E),
        "arm64_32" => (CPU_TYPE_ARM64_32, CPU_SUBTYPE_ARM64_32_ALL),
        "arm64_32_v8" => (CPU_TYPE_ARM64_32, CPU_SUBTYPE_ARM64_32_V8),
        "arm" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_ALL),
        "armv5" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V5TEJ),
        "armv6" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V6),
        "armv6m" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V6M),
        "armv7" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7),
        "armv7f" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7F),
        "armv7s" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7S),
        "armv7k" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7K),
        "armv7m" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7M),
        "armv7em" => (CPU_TYPE_ARM, CPU_SUBTYPE_ARM_V7EM),
        "ppc" => (CPU_TYPE_POWERPC, CPU_SUBTYPE_POWERPC_ALL),
        "ppc64" => (CPU_TYPE_POWERPC64, CPU_SUBTYPE_POWERPC_ALL),
        _ => return None,
    })
}

/// Whether `name` is a canonical CPU name known to this registry.
pub fn is_valid(name: &str) -> bool {
    tuple_of(name).is_some()
}

/// Instruction-width constant for `name`: 4 for the arm64 family, 2 for 32-bit arm, 1 otherwise.
///
/// Returns `1` rather than `None` for variable-length instruction sets (x86/x86_64) and for
/// unrecognized names, matching the "otherwise `addr - 1`" fallback used throughout the address
/// heuristics (see [`crate::heuristics`]).
pub fn alignment(name: &str) -> u64 {
    match name.parse::<Arch>() {
        Ok(arch) => match arch.cpu_family().instruction_alignment() {
            Some(width) => width,
            None => 1,
        },
        Err(_) => 1,
    }
}

/// Name of the conventional instruction-pointer register for `name`, if any.
///
/// `pc` on all ARM variants, `rip` on x86_64, `None` for anything else (including plain `x86`,
/// which breakpad-style reports address via `eip` but which this pipeline never needs to look up).
pub fn ip_register_name(name: &str) -> Option<&'static str> {
    match name.parse::<Arch>() {
        Ok(arch) => match arch.cpu_family() {
            crate::CpuFamily::Amd64 => Some("rip"),
            crate::CpuFamily::Arm32 | crate::CpuFamily::Arm64 | crate::CpuFamily::Arm64_32 => {
                Some("pc")
            }
            _ => None,
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_of_armv7() {
        assert_eq!(name_of(12, 9), Some("armv7"));
    }

    #[test]
    fn test_tuple_of_roundtrip() {
        for name in [
            "x86", "x86_64", "x86_64h", "arm64", "arm64e", "arm64_32", "arm", "armv6", "armv7",
            "armv7s", "armv7k",
        ] {
            let (cpu_type, cpu_subtype) = tuple_of(name).unwrap_or_else(|| panic!("{name}"));
            assert_eq!(name_of(cpu_type, cpu_subtype), Some(name), "{name}");
        }
    }

    #[test]
    fn test_alignment() {
        assert_eq!(alignment("arm64"), 4);
        assert_eq!(alignment("arm64e"), 4);
        assert_eq!(alignment("armv7"), 2);
        assert_eq!(alignment("x86_64"), 1);
        assert_eq!(alignment("bogus"), 1);
    }

    #[test]
    fn test_ip_register_name() {
        assert_eq!(ip_register_name("x86_64"), Some("rip"));
        assert_eq!(ip_register_name("arm64"), Some("pc"));
        assert_eq!(ip_register_name("armv7"), Some("pc"));
        assert_eq!(ip_register_name("x86"), None);
        assert_eq!(ip_register_name("bogus"), None);
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("arm64"));
        assert!(!is_valid("not-a-cpu"));
    }
}
