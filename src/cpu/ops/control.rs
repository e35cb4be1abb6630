//! Control flow: jumps, branches, interrupts, flag sets, NOP and JAM.

use crate::cpu::addressing::AddressMode;
use crate::cpu::{
    Cpu, FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE,
    FLAG_OVERFLOW, FLAG_UNUSED, FLAG_ZERO, IRQ_VECTOR,
};

/// Shared branch body: the target is always resolved (consuming the
/// operand), then a taken branch costs one extra cycle plus another when
/// the target sits on a different page than the updated PC.
fn branch(cpu: &mut Cpu, mode: AddressMode, taken: bool) {
    let target = mode.addr(cpu);
    if taken {
        cpu.cyc += 1;
        if target & 0xFF00 != cpu.pc & 0xFF00 {
            cpu.cyc += 1;
        }
        cpu.pc = target;
    }
}

pub fn bcc(cpu: &mut Cpu, mode: AddressMode) {
    let taken = !cpu.flag(FLAG_CARRY);
    branch(cpu, mode, taken);
}

pub fn bcs(cpu: &mut Cpu, mode: AddressMode) {
    let taken = cpu.flag(FLAG_CARRY);
    branch(cpu, mode, taken);
}

pub fn bne(cpu: &mut Cpu, mode: AddressMode) {
    let taken = !cpu.flag(FLAG_ZERO);
    branch(cpu, mode, taken);
}

pub fn beq(cpu: &mut Cpu, mode: AddressMode) {
    let taken = cpu.flag(FLAG_ZERO);
    branch(cpu, mode, taken);
}

pub fn bpl(cpu: &mut Cpu, mode: AddressMode) {
    let taken = !cpu.flag(FLAG_NEGATIVE);
    branch(cpu, mode, taken);
}

pub fn bmi(cpu: &mut Cpu, mode: AddressMode) {
    let taken = cpu.flag(FLAG_NEGATIVE);
    branch(cpu, mode, taken);
}

pub fn bvc(cpu: &mut Cpu, mode: AddressMode) {
    let taken = !cpu.flag(FLAG_OVERFLOW);
    branch(cpu, mode, taken);
}

pub fn bvs(cpu: &mut Cpu, mode: AddressMode) {
    let taken = cpu.flag(FLAG_OVERFLOW);
    branch(cpu, mode, taken);
}

pub fn jmp(cpu: &mut Cpu, mode: AddressMode) {
    cpu.pc = mode.addr(cpu);
}

/// JSR pushes the address of its last operand byte; RTS compensates.
pub fn jsr(cpu: &mut Cpu, _mode: AddressMode) {
    let target = cpu.read_pc16();
    let ret = cpu.pc.wrapping_sub(1);
    cpu.push16(ret);
    cpu.pc = target;
}

pub fn rts(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.pc = cpu.pull16().wrapping_add(1);
}

pub fn rti(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.status = (cpu.pull() & !FLAG_BREAK) | FLAG_UNUSED;
    cpu.pc = cpu.pull16();
}

/// BRK pushes PC past its padding byte and a status with the virtual
/// break bit set, then vectors through IRQ/BRK.
pub fn brk(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.pc = cpu.pc.wrapping_add(1);
    cpu.push16(cpu.pc);
    cpu.push(cpu.status | FLAG_BREAK | FLAG_UNUSED);
    cpu.pc = cpu.bus.read_word(IRQ_VECTOR);
    cpu.set_flag(FLAG_INTERRUPT_DISABLE, true);
}

pub fn clc(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.set_flag(FLAG_CARRY, false);
}

pub fn sec(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.set_flag(FLAG_CARRY, true);
}

pub fn cli(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.set_flag(FLAG_INTERRUPT_DISABLE, false);
}

pub fn sei(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.set_flag(FLAG_INTERRUPT_DISABLE, true);
}

pub fn clv(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.set_flag(FLAG_OVERFLOW, false);
}

pub fn cld(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.set_flag(FLAG_DECIMAL, false);
}

pub fn sed(cpu: &mut Cpu, _mode: AddressMode) {
    cpu.set_flag(FLAG_DECIMAL, true);
}

/// Official and multi-byte undocumented NOPs: consume the operand (with
/// its real bus read and page-cross penalty) and change nothing.
pub fn nop(cpu: &mut Cpu, mode: AddressMode) {
    if mode != AddressMode::Implied {
        mode.read(cpu);
    }
}

/// Documented halt opcodes: the hardware wedges its instruction decoder.
pub fn jam(cpu: &mut Cpu, _mode: AddressMode) {
    let at = cpu.pc.wrapping_sub(1);
    let opcode = cpu.read(at);
    cpu.halt(opcode);
}
