//! Address heuristics used to turn a return address found on the stack into the address of the
//! call instruction that produced it, before that address is handed to a [`DebugInfoHandle`].
//!
//! Every non-leaf frame on a call stack holds a *return* address: the instruction right after
//! the `call`/`bl` that pushed it there. Looking that address up directly would attribute the
//! frame to whatever follows the call, which is frequently a different (and misleading) line or
//! even a different inlined function. The fix is to back up one instruction before resolving,
//! except for the frame that actually crashed, whose register state already points at the
//! faulting instruction itself.
//!
//! The per-CPU arithmetic this relies on already lives in [`symbolic_common::InstructionInfo`];
//! this module only adapts the per-frame JSON/register shapes this crate's report pipeline uses
//! into the calls that type expects.
//!
//! [`DebugInfoHandle`]: crate::debuginfo::DebugInfoHandle

use std::collections::BTreeMap;
use std::str::FromStr;

use symbolic_common::{cpu, Arch, InstructionInfo};

/// A named set of CPU register values captured at the time of the crash, keyed by platform
/// register name (e.g. `"pc"`, `"rip"`, `"lr"`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers(BTreeMap<String, u64>);

impl Registers {
    /// Creates an empty register set.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Records the value of a named register.
    pub fn insert(&mut self, name: impl Into<String>, value: u64) {
        self.0.insert(name.into(), value);
    }

    /// Looks up a named register's value.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.0.get(name).copied()
    }

    /// Builds a register set from a JSON object mapping register name to address value.
    pub fn from_json(
        object: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, crate::error::ValueError> {
        let mut registers = Self::new();
        for (name, value) in object {
            registers.insert(name.clone(), crate::address::parse_address(value)?);
        }
        Ok(registers)
    }
}

/// Reads the instruction-pointer register out of `registers` for the given CPU, using the
/// platform-appropriate register name (`rip` on x86_64, `pc` on the ARM family).
fn ip_register(registers: &Registers, cpu_name: &str) -> Option<u64> {
    let name = cpu::ip_register_name(cpu_name)?;
    registers.get(name)
}

/// The frame metadata that [`find_best_instruction`] consults to decide whether `address` is
/// already a call-site address (crashing frame) or a return address that needs to be backed up.
#[derive(Debug, Clone, Default)]
pub struct Meta<'a> {
    /// Position of this frame in the backtrace; `Some(0)` is the innermost (crashing) frame.
    pub frame_number: Option<u32>,
    /// The signal number that stopped the process, if the crash was signal-based.
    pub signal: Option<u32>,
    /// Register values captured for this frame, if available.
    pub registers: Option<&'a Registers>,
}

/// Decides which instruction address should actually be looked up for a stack frame.
///
/// Every frame but the innermost holds a return address: one instruction past the call site
/// that put it on the stack, so it is backed up a step. The innermost frame
/// (`frame_number == Some(0)`) is usually already sitting on the faulting instruction and is
/// used as-is — *unless* the process stopped on a trapping signal (`SIGILL`, `SIGBUS`,
/// `SIGSEGV`) and the live instruction-pointer register disagrees with the recorded address.
/// That combination means the unwinder's first frame is itself a return address (e.g. a tail
/// call into a trap), so it gets backed up too.
///
/// This is a thin adapter over [`InstructionInfo`], which already implements the per-CPU
/// arithmetic and the frame-0/trap-signal policy above; this function only resolves `cpu_name`
/// to an [`Arch`] and the live instruction pointer out of `meta`'s registers.
pub fn find_best_instruction(address: u64, cpu_name: &str, meta: Option<&Meta<'_>>) -> u64 {
    let arch = Arch::from_str(cpu_name).unwrap_or(Arch::Unknown);
    let frame_number = meta.and_then(|m| m.frame_number);
    let signal = meta.and_then(|m| m.signal);
    let ip = meta
        .and_then(|m| m.registers)
        .and_then(|registers| ip_register(registers, cpu_name));

    InstructionInfo::new(arch, address)
        .is_crashing_frame(frame_number == Some(0))
        .signal(signal)
        .ip_register_value(ip)
        .caller_address()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_meta_backs_up_like_a_non_crashing_frame() {
        assert_eq!(find_best_instruction(0x1000, "arm64", None), 0x0FFC);
    }

    #[test]
    fn unrecognized_cpu_name_falls_back_to_byte_granularity() {
        let meta = Meta {
            frame_number: Some(1),
            signal: None,
            registers: None,
        };
        assert_eq!(find_best_instruction(0x1000, "bogus", Some(&meta)), 0x0FFF);
    }

    #[test]
    fn diverging_ip_on_a_trap_signal_backs_up() {
        let mut registers = Registers::new();
        registers.insert("pc", 0x2000);
        let meta = Meta {
            frame_number: Some(0),
            signal: Some(11),
            registers: Some(&registers),
        };
        assert_eq!(find_best_instruction(0x1000, "arm64", Some(&meta)), 0x0FFC);
    }

    #[test]
    fn non_trap_signal_uses_the_address_unchanged() {
        let mut registers = Registers::new();
        registers.insert("pc", 0x2000);
        let meta = Meta {
            frame_number: Some(0),
            signal: Some(0),
            registers: Some(&registers),
        };
        assert_eq!(find_best_instruction(0x1000, "arm64", Some(&meta)), 0x1000);
    }

    #[test]
    fn non_crashing_frame_backs_up_one_instruction() {
        let meta = Meta {
            frame_number: Some(1),
            signal: Some(11),
            registers: None,
        };
        assert_eq!(find_best_instruction(0x1000, "arm64", Some(&meta)), 0x0FFC);
    }
}
