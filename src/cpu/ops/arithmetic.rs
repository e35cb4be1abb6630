//! Add/subtract, compares, and increment/decrement.

use crate::cpu::addressing::AddressMode;
use crate::cpu::ops::rmw;
use crate::cpu::{Cpu, FLAG_CARRY, FLAG_OVERFLOW};

/// Binary add with carry. Carry is the 9th bit of the unsigned sum;
/// overflow is set when both operands share a sign the result lacks.
/// Decimal mode is inert on the 2A03, so no BCD adjustment exists.
pub(crate) fn add_with_carry(cpu: &mut Cpu, v: u8) {
    let carry_in = (cpu.status & FLAG_CARRY) as u16;
    let sum = cpu.a as u16 + v as u16 + carry_in;
    let r = sum as u8;
    cpu.set_flag(FLAG_CARRY, sum > 0xFF);
    cpu.set_flag(
        FLAG_OVERFLOW,
        (cpu.a ^ v) & 0x80 == 0 && (cpu.a ^ r) & 0x80 != 0,
    );
    cpu.a = r;
    cpu.set_zn(r);
}

pub(crate) fn compare(cpu: &mut Cpu, reg: u8, v: u8) {
    cpu.set_flag(FLAG_CARRY, reg >= v);
    cpu.set_zn(reg.wrapping_sub(v));
}

pub fn adc(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    add_with_carry(cpu, v);
}

/// Subtract borrows through the inverted carry, so SBC is ADC of the
/// one's complement.
pub fn sbc(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    add_with_carry(cpu, !v);
}

pub fn cmp(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    compare(cpu, cpu.a, v);
}

pub fn cpx(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    compare(cpu, cpu.x, v);
}

pub fn cpy(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    compare(cpu, cpu.y, v);
}

pub fn inc(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, |_, v| v.wrapping_add(1));
    cpu.set_zn(r);
}

pub fn dec(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, |_, v| v.wrapping_sub(1));
    cpu.set_zn(r);
}

pub fn inx(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.x = cpu.x.wrapping_add(1);
    cpu.set_zn(cpu.x);
}

pub fn iny(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.y = cpu.y.wrapping_add(1);
    cpu.set_zn(cpu.y);
}

pub fn dex(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.x = cpu.x.wrapping_sub(1);
    cpu.set_zn(cpu.x);
}

pub fn dey(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.y = cpu.y.wrapping_sub(1);
    cpu.set_zn(cpu.y);
}
