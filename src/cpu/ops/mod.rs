/*!
Operation routines, grouped by family.

Every routine has the shape `fn(&mut Cpu, AddressMode)`; the opcode table
pairs each with its addressing mode and base cycle cost. Extra cycles
(page crossings, taken branches) are charged inside the routines and the
addressing resolver, on top of the base cost the dispatcher already added.
*/

pub mod arithmetic;
pub mod control;
pub mod illegal;
pub mod logical;
pub mod transfer;

use crate::cpu::Cpu;
use crate::cpu::addressing::AddressMode;

/// Read-modify-write plumbing shared by the shift/inc/dec families and
/// their undocumented combinations. Resolves write-destined (the penalty
/// is in the base cost), applies `f`, stores, and returns the result for
/// follow-up flag math.
pub(crate) fn rmw(cpu: &mut Cpu, mode: AddressMode, f: fn(&mut Cpu, u8) -> u8) -> u8 {
    if mode == AddressMode::Accumulator {
        let r = f(cpu, cpu.a);
        cpu.a = r;
        r
    } else {
        let addr = mode.addr_fast(cpu);
        let v = cpu.read(addr);
        let r = f(cpu, v);
        cpu.write(addr, r);
        r
    }
}
