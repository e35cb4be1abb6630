use crate::bus::{Bus, Ram, share};
use crate::cpu::{
    Cpu, CpuSignals, FAULT_CYCLES, FLAG_CARRY, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE,
    FLAG_OVERFLOW, FLAG_ZERO, IRQ_VECTOR, NMI_VECTOR,
};

/// CPU over 64 KiB of flat RAM, PC parked at $0200.
fn fresh_cpu() -> Cpu {
    let bus = Bus::new();
    bus.map(0x0000, 0x10000, share(Ram::new(0x10000)));
    let mut cpu = Cpu::new(bus, CpuSignals::new());
    cpu.pc = 0x0200;
    cpu
}

fn load(cpu: &mut Cpu, addr: u16, bytes: &[u8]) {
    for (i, b) in bytes.iter().enumerate() {
        cpu.write(addr.wrapping_add(i as u16), *b);
    }
}

#[test]
fn adc_signed_overflow_cases() {
    // 0x50 + 0x10 = 0x60: no carry, no overflow.
    let mut cpu = fresh_cpu();
    cpu.a = 0x50;
    load(&mut cpu, 0x0200, &[0x69, 0x10]); // ADC #$10
    cpu.step();
    assert_eq!(cpu.a, 0x60);
    assert!(!cpu.flag(FLAG_CARRY));
    assert!(!cpu.flag(FLAG_OVERFLOW));
    assert!(!cpu.flag(FLAG_NEGATIVE));

    // 0x50 + 0x50 = 0xA0: two positives made a negative, overflow set.
    let mut cpu = fresh_cpu();
    cpu.a = 0x50;
    load(&mut cpu, 0x0200, &[0x69, 0x50]);
    cpu.step();
    assert_eq!(cpu.a, 0xA0);
    assert!(!cpu.flag(FLAG_CARRY));
    assert!(cpu.flag(FLAG_OVERFLOW));
    assert!(cpu.flag(FLAG_NEGATIVE));

    // 0xD0 + 0x90 = 0x160: carry out, overflow (two negatives, positive sum).
    let mut cpu = fresh_cpu();
    cpu.a = 0xD0;
    load(&mut cpu, 0x0200, &[0x69, 0x90]);
    cpu.step();
    assert_eq!(cpu.a, 0x60);
    assert!(cpu.flag(FLAG_CARRY));
    assert!(cpu.flag(FLAG_OVERFLOW));
}

#[test]
fn sbc_borrows_through_carry() {
    let mut cpu = fresh_cpu();
    cpu.a = 0x10;
    cpu.set_flag(FLAG_CARRY, true); // no borrow pending
    load(&mut cpu, 0x0200, &[0xE9, 0x01]); // SBC #$01
    cpu.step();
    assert_eq!(cpu.a, 0x0F);
    assert!(cpu.flag(FLAG_CARRY), "no borrow occurred");

    let mut cpu = fresh_cpu();
    cpu.a = 0x00;
    cpu.set_flag(FLAG_CARRY, true);
    load(&mut cpu, 0x0200, &[0xE9, 0x01]);
    cpu.step();
    assert_eq!(cpu.a, 0xFF);
    assert!(!cpu.flag(FLAG_CARRY), "borrow clears carry");
}

#[test]
fn branch_cycle_costs() {
    // Not taken: base 2.
    let mut cpu = fresh_cpu();
    cpu.set_flag(FLAG_ZERO, true);
    load(&mut cpu, 0x0200, &[0xD0, 0x05]); // BNE +5
    assert_eq!(cpu.step(), 2);
    assert_eq!(cpu.pc, 0x0202);

    // Taken, same page: base + 1.
    let mut cpu = fresh_cpu();
    cpu.set_flag(FLAG_ZERO, false);
    load(&mut cpu, 0x0200, &[0xD0, 0x05]);
    assert_eq!(cpu.step(), 3);
    assert_eq!(cpu.pc, 0x0207);

    // Taken across a page boundary: base + 2. The operand ends at $02FF,
    // so +1 lands the target on page $03.
    let mut cpu = fresh_cpu();
    cpu.pc = 0x02FD;
    cpu.set_flag(FLAG_ZERO, false);
    load(&mut cpu, 0x02FD, &[0xD0, 0x01]);
    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.pc, 0x0300);
}

#[test]
fn lda_zero_page_x_wraps() {
    let mut cpu = fresh_cpu();
    cpu.x = 0x02;
    cpu.write(0x0001, 0x42); // 0xFF + 2 wraps here
    cpu.write(0x0101, 0x99); // never read
    load(&mut cpu, 0x0200, &[0xB5, 0xFF]); // LDA $FF,X
    assert_eq!(cpu.step(), 4);
    assert_eq!(cpu.a, 0x42);
}

#[test]
fn lda_absolute_x_page_cross_penalty() {
    let mut cpu = fresh_cpu();
    cpu.x = 0x10;
    cpu.write(0x2100, 0x55);
    load(&mut cpu, 0x0200, &[0xBD, 0xF0, 0x20]); // LDA $20F0,X
    assert_eq!(cpu.step(), 5, "4 base + 1 page cross");
    assert_eq!(cpu.a, 0x55);

    let mut cpu = fresh_cpu();
    cpu.x = 0x05;
    cpu.write(0x20F5, 0x66);
    load(&mut cpu, 0x0200, &[0xBD, 0xF0, 0x20]);
    assert_eq!(cpu.step(), 4, "no cross, base only");
    assert_eq!(cpu.a, 0x66);
}

#[test]
fn sta_absolute_x_always_pays_five() {
    let mut cpu = fresh_cpu();
    cpu.a = 0xAA;
    cpu.x = 0x05; // same page
    load(&mut cpu, 0x0200, &[0x9D, 0xF0, 0x20]); // STA $20F0,X
    assert_eq!(cpu.step(), 5);
    assert_eq!(cpu.read(0x20F5), 0xAA);
}

#[test]
fn jmp_indirect_page_wrap_bug() {
    let mut cpu = fresh_cpu();
    cpu.write(0x10FF, 0x34);
    cpu.write(0x1000, 0x12); // high byte wraps to $1000, not $1100
    cpu.write(0x1100, 0xEE);
    load(&mut cpu, 0x0200, &[0x6C, 0xFF, 0x10]); // JMP ($10FF)
    assert_eq!(cpu.step(), 5);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn jsr_rts_round_trip() {
    let mut cpu = fresh_cpu();
    load(&mut cpu, 0x0200, &[0x20, 0x00, 0x30]); // JSR $3000
    load(&mut cpu, 0x3000, &[0x60]); // RTS
    assert_eq!(cpu.step(), 6);
    assert_eq!(cpu.pc, 0x3000);
    assert_eq!(cpu.step(), 6);
    assert_eq!(cpu.pc, 0x0203, "returns past the JSR operand");
    assert_eq!(cpu.sp, 0xFD);
}

#[test]
fn rmw_inc_sets_flags() {
    let mut cpu = fresh_cpu();
    cpu.write(0x0040, 0x7F);
    load(&mut cpu, 0x0200, &[0xE6, 0x40]); // INC $40
    assert_eq!(cpu.step(), 5);
    assert_eq!(cpu.read(0x0040), 0x80);
    assert!(cpu.flag(FLAG_NEGATIVE));

    load(&mut cpu, 0x0202, &[0xC6, 0x40, 0xC6, 0x40]); // DEC $40 x2
    cpu.step();
    assert_eq!(cpu.read(0x0040), 0x7F);
    assert!(!cpu.flag(FLAG_NEGATIVE));
}

#[test]
fn asl_accumulator_and_memory() {
    let mut cpu = fresh_cpu();
    cpu.a = 0x81;
    load(&mut cpu, 0x0200, &[0x0A]); // ASL A
    assert_eq!(cpu.step(), 2);
    assert_eq!(cpu.a, 0x02);
    assert!(cpu.flag(FLAG_CARRY));

    cpu.write(0x0040, 0x40);
    load(&mut cpu, 0x0201, &[0x06, 0x40]); // ASL $40
    assert_eq!(cpu.step(), 5);
    assert_eq!(cpu.read(0x0040), 0x80);
    assert!(!cpu.flag(FLAG_CARRY));
}

#[test]
fn nmi_countdown_delivers_after_delay() {
    let mut cpu = fresh_cpu();
    cpu.write(NMI_VECTOR, 0x00);
    cpu.write(NMI_VECTOR + 1, 0x80);
    load(&mut cpu, 0x0200, &[0xEA, 0xEA]); // NOP NOP
    let signals = cpu.signals();

    // Delay 2: the next step still runs an instruction, the one after
    // services the interrupt.
    signals.raise_nmi(2);
    assert_eq!(cpu.step(), 2);
    assert_eq!(cpu.pc, 0x0201);
    assert_eq!(cpu.step(), 7);
    assert_eq!(cpu.pc, 0x8000);
    assert!(cpu.flag(FLAG_INTERRUPT_DISABLE));

    // Return address and status sit on the stack, break bit clear.
    let status = cpu.read(0x0100 | (cpu.sp as u16 + 1));
    assert_eq!(status & 0x10, 0);
    let lo = cpu.read(0x0100 | (cpu.sp as u16 + 2)) as u16;
    let hi = cpu.read(0x0100 | (cpu.sp as u16 + 3)) as u16;
    assert_eq!((hi << 8) | lo, 0x0201);
}

#[test]
fn staged_nmi_can_be_withdrawn() {
    let mut cpu = fresh_cpu();
    cpu.write(NMI_VECTOR + 1, 0x80);
    load(&mut cpu, 0x0200, &[0xEA, 0xEA, 0xEA]);
    let signals = cpu.signals();

    signals.raise_nmi(3);
    cpu.step();
    assert!(signals.nmi_staged());
    signals.cancel_nmi();
    cpu.step();
    cpu.step();
    assert_eq!(cpu.pc, 0x0203, "no vector taken");
}

#[test]
fn masked_irq_is_held_until_disable_clears() {
    let mut cpu = fresh_cpu();
    cpu.write(IRQ_VECTOR, 0x00);
    cpu.write(IRQ_VECTOR + 1, 0x90);
    load(&mut cpu, 0x0200, &[0x78, 0xEA, 0xEA, 0x58, 0xEA]); // SEI NOP NOP CLI NOP
    let signals = cpu.signals();

    cpu.step(); // SEI
    signals.raise_irq();
    cpu.step(); // NOP, IRQ sampled but masked
    cpu.step(); // NOP, still masked
    assert_eq!(cpu.pc, 0x0203, "no vector taken while the flag is set");

    cpu.step(); // CLI
    // The IRQ raised under SEI was held pending and fires now, with no
    // second pull of the line.
    assert_eq!(cpu.step(), 7);
    assert_eq!(cpu.pc, 0x9000);
}

#[test]
fn stall_consumed_before_next_fetch() {
    let mut cpu = fresh_cpu();
    load(&mut cpu, 0x0200, &[0xEA]);
    let signals = cpu.signals();

    signals.add_stall(513);
    assert_eq!(cpu.step(), 513);
    assert_eq!(cpu.pc, 0x0200, "no instruction ran during the stall");
    assert_eq!(cpu.step(), 2);
    assert_eq!(cpu.cycles, 515);
}

#[test]
fn jam_latches_a_fault() {
    let mut cpu = fresh_cpu();
    load(&mut cpu, 0x0200, &[0x02]); // JAM
    assert_eq!(cpu.step(), FAULT_CYCLES);
    assert!(cpu.faulted());
    // Every later step reports the sentinel without touching state.
    let pc = cpu.pc;
    assert_eq!(cpu.step(), FAULT_CYCLES);
    assert_eq!(cpu.pc, pc);
}

#[test]
fn missing_opcode_faults() {
    let mut cpu = fresh_cpu();
    load(&mut cpu, 0x0200, &[0x9B]); // no table entry
    assert_eq!(cpu.step(), FAULT_CYCLES);
    assert!(cpu.faulted());
}

#[test]
fn reset_loads_vector_and_masks_interrupts() {
    let mut cpu = fresh_cpu();
    cpu.write(0xFFFC, 0x34);
    cpu.write(0xFFFD, 0x12);
    cpu.sp = 0x00;
    assert_eq!(cpu.reset(), 7);
    assert_eq!(cpu.pc, 0x1234);
    assert_eq!(cpu.sp, 0xFD);
    assert!(cpu.flag(FLAG_INTERRUPT_DISABLE));
}

#[test]
fn php_plp_break_bit_is_virtual() {
    let mut cpu = fresh_cpu();
    load(&mut cpu, 0x0200, &[0x08, 0x28]); // PHP PLP
    cpu.status = 0x20;
    cpu.step();
    let pushed = cpu.read(0x0100 | (cpu.sp as u16 + 1));
    assert_eq!(pushed & 0x30, 0x30, "PHP materializes B and bit 5");
    cpu.step();
    assert_eq!(cpu.status & 0x10, 0, "PLP never restores B");
}

#[test]
fn brk_vectors_through_irq() {
    let mut cpu = fresh_cpu();
    cpu.write(IRQ_VECTOR, 0x00);
    cpu.write(IRQ_VECTOR + 1, 0xC0);
    load(&mut cpu, 0x0200, &[0x00]); // BRK
    assert_eq!(cpu.step(), 7);
    assert_eq!(cpu.pc, 0xC000);
    // BRK skips its padding byte: the pushed return address is $0202.
    let lo = cpu.read(0x0100 | (cpu.sp as u16 + 2)) as u16;
    let hi = cpu.read(0x0100 | (cpu.sp as u16 + 3)) as u16;
    assert_eq!((hi << 8) | lo, 0x0202);
}

#[test]
fn lax_loads_both_registers() {
    let mut cpu = fresh_cpu();
    cpu.write(0x0040, 0xC3);
    load(&mut cpu, 0x0200, &[0xA7, 0x40]); // LAX $40
    assert_eq!(cpu.step(), 3);
    assert_eq!(cpu.a, 0xC3);
    assert_eq!(cpu.x, 0xC3);
    assert!(cpu.flag(FLAG_NEGATIVE));
}

#[test]
fn dcp_decrements_then_compares() {
    let mut cpu = fresh_cpu();
    cpu.a = 0x10;
    cpu.write(0x0040, 0x11);
    load(&mut cpu, 0x0200, &[0xC7, 0x40]); // DCP $40
    assert_eq!(cpu.step(), 5);
    assert_eq!(cpu.read(0x0040), 0x10);
    assert!(cpu.flag(FLAG_ZERO), "A equals the decremented value");
    assert!(cpu.flag(FLAG_CARRY));
}

#[test]
fn usbc_behaves_as_sbc() {
    let mut cpu = fresh_cpu();
    cpu.a = 0x40;
    cpu.set_flag(FLAG_CARRY, true);
    load(&mut cpu, 0x0200, &[0xEB, 0x10]); // 0xEB = SBC #imm
    assert_eq!(cpu.step(), 2);
    assert_eq!(cpu.a, 0x30);
}
