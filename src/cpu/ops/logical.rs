//! Bitwise operations and shifts/rotates.

use crate::cpu::addressing::AddressMode;
use crate::cpu::ops::rmw;
use crate::cpu::{Cpu, FLAG_CARRY, FLAG_NEGATIVE, FLAG_OVERFLOW, FLAG_ZERO};

pub fn and(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    cpu.a &= v;
    cpu.set_zn(cpu.a);
}

pub fn ora(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    cpu.a |= v;
    cpu.set_zn(cpu.a);
}

pub fn eor(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    cpu.a ^= v;
    cpu.set_zn(cpu.a);
}

/// BIT: Z from the AND, N and V copied straight from operand bits 7/6.
pub fn bit(cpu: &mut Cpu, mode: AddressMode) {
    let v = mode.read(cpu);
    cpu.set_flag(FLAG_ZERO, cpu.a & v == 0);
    cpu.set_flag(FLAG_NEGATIVE, v & 0x80 != 0);
    cpu.set_flag(FLAG_OVERFLOW, v & 0x40 != 0);
}

pub(crate) fn shift_left(cpu: &mut Cpu, v: u8) -> u8 {
    cpu.set_flag(FLAG_CARRY, v & 0x80 != 0);
    v << 1
}

pub(crate) fn shift_right(cpu: &mut Cpu, v: u8) -> u8 {
    cpu.set_flag(FLAG_CARRY, v & 0x01 != 0);
    v >> 1
}

pub(crate) fn rotate_left(cpu: &mut Cpu, v: u8) -> u8 {
    let carry_in = cpu.status & FLAG_CARRY;
    cpu.set_flag(FLAG_CARRY, v & 0x80 != 0);
    (v << 1) | carry_in
}

pub(crate) fn rotate_right(cpu: &mut Cpu, v: u8) -> u8 {
    let carry_in = (cpu.status & FLAG_CARRY) << 7;
    cpu.set_flag(FLAG_CARRY, v & 0x01 != 0);
    (v >> 1) | carry_in
}

pub fn asl(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, shift_left);
    cpu.set_zn(r);
}

pub fn lsr(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, shift_right);
    cpu.set_zn(r);
}

pub fn rol(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, rotate_left);
    cpu.set_zn(r);
}

pub fn ror(cpu: &mut Cpu, mode: AddressMode) {
    let r = rmw(cpu, mode, rotate_right);
    cpu.set_zn(r);
}
