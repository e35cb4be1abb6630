//! Loads, stores, register transfers, and stack traffic.

use crate::cpu::addressing::AddressMode;
use crate::cpu::{Cpu, FLAG_BREAK, FLAG_UNUSED};

pub fn lda(cpu: &mut Cpu, mode: AddressMode) {
    cpu.a = mode.read(cpu);
    cpu.set_zn(cpu.a);
}

pub fn ldx(cpu: &mut Cpu, mode: AddressMode) {
    cpu.x = mode.read(cpu);
    cpu.set_zn(cpu.x);
}

pub fn ldy(cpu: &mut Cpu, mode: AddressMode) {
    cpu.y = mode.read(cpu);
    cpu.set_zn(cpu.y);
}

pub fn sta(cpu: &mut Cpu, mode: AddressMode) {
    mode.write(cpu, cpu.a);
}

pub fn stx(cpu: &mut Cpu, mode: AddressMode) {
    mode.write(cpu, cpu.x);
}

pub fn sty(cpu: &mut Cpu, mode: AddressMode) {
    mode.write(cpu, cpu.y);
}

pub fn tax(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.x = cpu.a;
    cpu.set_zn(cpu.x);
}

pub fn tay(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.y = cpu.a;
    cpu.set_zn(cpu.y);
}

pub fn txa(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.a = cpu.x;
    cpu.set_zn(cpu.a);
}

pub fn tya(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.a = cpu.y;
    cpu.set_zn(cpu.a);
}

pub fn tsx(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.x = cpu.sp;
    cpu.set_zn(cpu.x);
}

/// TXS is the one transfer that touches no flags.
pub fn txs(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.sp = cpu.x;
}

pub fn pha(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.push(cpu.a);
}

pub fn pla(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.a = cpu.pull();
    cpu.set_zn(cpu.a);
}

/// Software pushes materialize the virtual break bit.
pub fn php(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.push(cpu.status | FLAG_BREAK | FLAG_UNUSED);
}

/// The break bit never survives a pull; bit 5 always reads set.
pub fn plp(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.status = (cpu.pull() & !FLAG_BREAK) | FLAG_UNUSED;
}
