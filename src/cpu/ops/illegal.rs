//! Undocumented opcodes.
//!
//! These are the stable combinations games actually rely on: most fuse a
//! read-modify-write with an ALU step in one instruction. The
//! AND-with-magic-constant family (ANE, LXA) depends on analog chip
//! behavior that varies with temperature and revision; the widely used
//! constant 0xEE stands in for it, which is as exact as these get.

use crate::cpu::addressing::AddressMode;
use crate::cpu::ops::arithmetic::{add_with_carry, compare};
use crate::cpu::ops::logical::{rotate_left, rotate_right, shift_left, shift_right};
use crate::cpu::ops::rmw;
use crate::cpu::{Cpu, FLAG_CARRY, FLAG_OVERFLOW};

/// Magic constant for the unstable AND-with-constant family.
const UNSTABLE_MAGIC: u8 = 0xEE;

/// SLO: ASL memory, then ORA the result into A.
pub fn slo(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, shift_left);
    cpu.a |= r;
    cpu.set_zn(cpu.a);
}

/// RLA: ROL memory, then AND the result into A.
pub fn rla(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, rotate_left);
    cpu.a &= r;
    cpu.set_zn(cpu.a);
}

/// SRE: LSR memory, then EOR the result into A.
pub fn sre(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, shift_right);
    cpu.a ^= r;
    cpu.set_zn(cpu.a);
}

/// RRA: ROR memory, then ADC the result.
pub fn rra(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, rotate_right);
    add_with_carry(cpu, r);
}

/// SAX: store A AND X. No flags.
pub fn sax(cpu: &mut Cpu, mode: AddressMode) {
    let v = cpu.a & cpu.x;
    mode.write(cpu, v);
}

/// LAX: load A and X together.
pub fn lax(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    cpu.a = v;
    cpu.x = v;
    cpu.set_zn(v);
}

/// DCP: DEC memory, then CMP against A.
pub fn dcp(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, |_, v| v.wrapping_sub(1));
    compare(cpu, cpu.a, r);
}

/// ISC: INC memory, then SBC it.
pub fn isc(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, |_, v| v.wrapping_add(1));
    add_with_carry(cpu, !r);
}

/// ANC: AND immediate, carry mirrors the sign bit.
pub fn anc(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    cpu.a &= v;
    cpu.set_zn(cpu.a);
    cpu.set_flag(FLAG_CARRY, cpu.a & 0x80 != 0);
}

/// ALR: AND immediate, then LSR A.
pub fn alr(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    let r = shift_right(cpu, cpu.a & v);
    cpu.a = r;
    cpu.set_zn(r);
}

/// ARR: AND immediate, ROR A; C comes from bit 6 of the result and V
/// from bit 6 XOR bit 5 (the adder leaks into the flags here).
pub fn arr(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    let carry_in = (cpu.status & FLAG_CARRY) << 7;
    let r = ((cpu.a & v) >> 1) | carry_in;
    cpu.a = r;
    cpu.set_zn(r);
    cpu.set_flag(FLAG_CARRY, r & 0x40 != 0);
    cpu.set_flag(FLAG_OVERFLOW, ((r >> 6) ^ (r >> 5)) & 1 != 0);
}

/// ANE: A = (A | magic) & X & immediate. Unstable on hardware.
pub fn ane(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    cpu.a = (cpu.a | UNSTABLE_MAGIC) & cpu.x & v;
    cpu.set_zn(cpu.a);
}

/// LXA: A = X = (A | magic) & immediate. Unstable on hardware.
pub fn lxa(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    let r = (cpu.a | UNSTABLE_MAGIC) & v;
    cpu.a = r;
    cpu.x = r;
    cpu.set_zn(r);
}

/// SBX: X = (A AND X) - immediate, with CMP-style carry.
pub fn sbx(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    let base = cpu.a & cpu.x;
    cpu.set_flag(FLAG_CARRY, base >= v);
    cpu.x = base.wrapping_sub(v);
    cpu.set_zn(cpu.x);
}

/// LAS: A, X and SP all take memory AND SP.
pub fn las(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu) & cpu.sp;
    cpu.a = v;
    cpu.x = v;
    cpu.sp = v;
    cpu.set_zn(v);
}

/// SHA: store A AND X AND (high byte of the address + 1).
pub fn sha(cpu: &mut Cpu, mode: AddressMode) {
    let addr = mode.addr_fast(cpu);
    let v = cpu.a & cpu.x & ((addr >> 8) as u8).wrapping_add(1);
    cpu.write(addr, v);
}

/// SHY: store Y AND (high byte of the address + 1).
pub fn shy(cpu: &mut Cpu, mode: AddressMode) {
    let addr = mode.addr_fast(cpu);
    let v = cpu.y & ((addr >> 8) as u8).wrapping_add(1);
    cpu.write(addr, v);
}
