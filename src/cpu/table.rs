/*!
Opcode dispatch table.

One fixed entry per opcode byte: mnemonic (debug only), addressing mode,
execution routine, and base cycle cost. Page-cross and branch extras are
charged by the routines on top of the base. Undocumented-but-stable
opcodes are present with their real modes and costs; the JAM opcodes are
present and wedge the CPU; two unstable store combinations (0x9B, 0x9E)
have no entry and fall through to the missing-opcode fault, the same
lockup either way.
*/

use crate::cpu::Cpu;
use crate::cpu::addressing::AddressMode;
use crate::cpu::ops::{arithmetic as ar, control as ct, illegal as il, logical as lg,
    transfer as tr};

/// One decoded opcode.
pub struct Opcode {
    /// Mnemonic for traces and fault logs.
    pub mnemonic: &'static str,
    pub mode: AddressMode,
    pub exec: fn(&mut Cpu, AddressMode),
    pub cycles: u64,
}

macro_rules! op {
    ($mn:literal, $f:path, $mode:ident, $cyc:literal) => {
        Some(Opcode {
            mnemonic: $mn,
            mode: AddressMode::$mode,
            exec: $f,
            cycles: $cyc,
        })
    };
}

/// The 256-entry table, indexed by opcode byte.
#[rustfmt::skip]
pub static OPCODES: [Option<Opcode>; 256] = [
    // 0x00
    op!("BRK", ct::brk, Implied, 7),
    op!("ORA", lg::ora, IndirectX, 6),
    op!("JAM", ct::jam, Implied, 2),
    op!("SLO", il::slo, IndirectX, 8),
    op!("NOP", ct::nop, ZeroPage, 3),
    op!("ORA", lg::ora, ZeroPage, 3),
    op!("ASL", lg::asl, ZeroPage, 5),
    op!("SLO", il::slo, ZeroPage, 5),
    op!("PHP", tr::php, Implied, 3),
    op!("ORA", lg::ora, Immediate, 2),
    op!("ASL", lg::asl, Accumulator, 2),
    op!("ANC", il::anc, Immediate, 2),
    op!("NOP", ct::nop, Absolute, 4),
    op!("ORA", lg::ora, Absolute, 4),
    op!("ASL", lg::asl, Absolute, 6),
    op!("SLO", il::slo, Absolute, 6),
    // 0x10
    op!("BPL", ct::bpl, Relative, 2),
    op!("ORA", lg::ora, IndirectY, 5),
    op!("JAM", ct::jam, Implied, 2),
    op!("SLO", il::slo, IndirectY, 8),
    op!("NOP", ct::nop, ZeroPageX, 4),
    op!("ORA", lg::ora, ZeroPageX, 4),
    op!("ASL", lg::asl, ZeroPageX, 6),
    op!("SLO", il::slo, ZeroPageX, 6),
    op!("CLC", ct::clc, Implied, 2),
    op!("ORA", lg::ora, AbsoluteY, 4),
    op!("NOP", ct::nop, Implied, 2),
    op!("SLO", il::slo, AbsoluteY, 7),
    op!("NOP", ct::nop, AbsoluteX, 4),
    op!("ORA", lg::ora, AbsoluteX, 4),
    op!("ASL", lg::asl, AbsoluteX, 7),
    op!("SLO", il::slo, AbsoluteX, 7),
    // 0x20
    op!("JSR", ct::jsr, Absolute, 6),
    op!("AND", lg::and, IndirectX, 6),
    op!("JAM", ct::jam, Implied, 2),
    op!("RLA", il::rla, IndirectX, 8),
    op!("BIT", lg::bit, ZeroPage, 3),
    op!("AND", lg::and, ZeroPage, 3),
    op!("ROL", lg::rol, ZeroPage, 5),
    op!("RLA", il::rla, ZeroPage, 5),
    op!("PLP", tr::plp, Implied, 4),
    op!("AND", lg::and, Immediate, 2),
    op!("ROL", lg::rol, Accumulator, 2),
    op!("ANC", il::anc, Immediate, 2),
    op!("BIT", lg::bit, Absolute, 4),
    op!("AND", lg::and, Absolute, 4),
    op!("ROL", lg::rol, Absolute, 6),
    op!("RLA", il::rla, Absolute, 6),
    // 0x30
    op!("BMI", ct::bmi, Relative, 2),
    op!("AND", lg::and, IndirectY, 5),
    op!("JAM", ct::jam, Implied, 2),
    op!("RLA", il::rla, IndirectY, 8),
    op!("NOP", ct::nop, ZeroPageX, 4),
    op!("AND", lg::and, ZeroPageX, 4),
    op!("ROL", lg::rol, ZeroPageX, 6),
    op!("RLA", il::rla, ZeroPageX, 6),
    op!("SEC", ct::sec, Implied, 2),
    op!("AND", lg::and, AbsoluteY, 4),
    op!("NOP", ct::nop, Implied, 2),
    op!("RLA", il::rla, AbsoluteY, 7),
    op!("NOP", ct::nop, AbsoluteX, 4),
    op!("AND", lg::and, AbsoluteX, 4),
    op!("ROL", lg::rol, AbsoluteX, 7),
    op!("RLA", il::rla, AbsoluteX, 7),
    // 0x40
    op!("RTI", ct::rti, Implied, 6),
    op!("EOR", lg::eor, IndirectX, 6),
    op!("JAM", ct::jam, Implied, 2),
    op!("SRE", il::sre, IndirectX, 8),
    op!("NOP", ct::nop, ZeroPage, 3),
    op!("EOR", lg::eor, ZeroPage, 3),
    op!("LSR", lg::lsr, ZeroPage, 5),
    op!("SRE", il::sre, ZeroPage, 5),
    op!("PHA", tr::pha, Implied, 3),
    op!("EOR", lg::eor, Immediate, 2),
    op!("LSR", lg::lsr, Accumulator, 2),
    op!("ALR", il::alr, Immediate, 2),
    op!("JMP", ct::jmp, Absolute, 3),
    op!("EOR", lg::eor, Absolute, 4),
    op!("LSR", lg::lsr, Absolute, 6),
    op!("SRE", il::sre, Absolute, 6),
    // 0x50
    op!("BVC", ct::bvc, Relative, 2),
    op!("EOR", lg::eor, IndirectY, 5),
    op!("JAM", ct::jam, Implied, 2),
    op!("SRE", il::sre, IndirectY, 8),
    op!("NOP", ct::nop, ZeroPageX, 4),
    op!("EOR", lg::eor, ZeroPageX, 4),
    op!("LSR", lg::lsr, ZeroPageX, 6),
    op!("SRE", il::sre, ZeroPageX, 6),
    op!("CLI", ct::cli, Implied, 2),
    op!("EOR", lg::eor, AbsoluteY, 4),
    op!("NOP", ct::nop, Implied, 2),
    op!("SRE", il::sre, AbsoluteY, 7),
    op!("NOP", ct::nop, AbsoluteX, 4),
    op!("EOR", lg::eor, AbsoluteX, 4),
    op!("LSR", lg::lsr, AbsoluteX, 7),
    op!("SRE", il::sre, AbsoluteX, 7),
    // 0x60
    op!("RTS", ct::rts, Implied, 6),
    op!("ADC", ar::adc, IndirectX, 6),
    op!("JAM", ct::jam, Implied, 2),
    op!("RRA", il::rra, IndirectX, 8),
    op!("NOP", ct::nop, ZeroPage, 3),
    op!("ADC", ar::adc, ZeroPage, 3),
    op!("ROR", lg::ror, ZeroPage, 5),
    op!("RRA", il::rra, ZeroPage, 5),
    op!("PLA", tr::pla, Implied, 4),
    op!("ADC", ar::adc, Immediate, 2),
    op!("ROR", lg::ror, Accumulator, 2),
    op!("ARR", il::arr, Immediate, 2),
    op!("JMP", ct::jmp, Indirect, 5),
    op!("ADC", ar::adc, Absolute, 4),
    op!("ROR", lg::ror, Absolute, 6),
    op!("RRA", il::rra, Absolute, 6),
    // 0x70
    op!("BVS", ct::bvs, Relative, 2),
    op!("ADC", ar::adc, IndirectY, 5),
    op!("JAM", ct::jam, Implied, 2),
    op!("RRA", il::rra, IndirectY, 8),
    op!("NOP", ct::nop, ZeroPageX, 4),
    op!("ADC", ar::adc, ZeroPageX, 4),
    op!("ROR", lg::ror, ZeroPageX, 6),
    op!("RRA", il::rra, ZeroPageX, 6),
    op!("SEI", ct::sei, Implied, 2),
    op!("ADC", ar::adc, AbsoluteY, 4),
    op!("NOP", ct::nop, Implied, 2),
    op!("RRA", il::rra, AbsoluteY, 7),
    op!("NOP", ct::nop, AbsoluteX, 4),
    op!("ADC", ar::adc, AbsoluteX, 4),
    op!("ROR", lg::ror, AbsoluteX, 7),
    op!("RRA", il::rra, AbsoluteX, 7),
    // 0x80
    op!("NOP", ct::nop, Immediate, 2),
    op!("STA", tr::sta, IndirectX, 6),
    op!("NOP", ct::nop, Immediate, 2),
    op!("SAX", il::sax, IndirectX, 6),
    op!("STY", tr::sty, ZeroPage, 3),
    op!("STA", tr::sta, ZeroPage, 3),
    op!("STX", tr::stx, ZeroPage, 3),
    op!("SAX", il::sax, ZeroPage, 3),
    op!("DEY", ar::dey, Implied, 2),
    op!("NOP", ct::nop, Immediate, 2),
    op!("TXA", tr::txa, Implied, 2),
    op!("ANE", il::ane, Immediate, 2),
    op!("STY", tr::sty, Absolute, 4),
    op!("STA", tr::sta, Absolute, 4),
    op!("STX", tr::stx, Absolute, 4),
    op!("SAX", il::sax, Absolute, 4),
    // 0x90
    op!("BCC", ct::bcc, Relative, 2),
    op!("STA", tr::sta, IndirectY, 6),
    op!("JAM", ct::jam, Implied, 2),
    op!("SHA", il::sha, IndirectY, 6),
    op!("STY", tr::sty, ZeroPageX, 4),
    op!("STA", tr::sta, ZeroPageX, 4),
    op!("STX", tr::stx, ZeroPageY, 4),
    op!("SAX", il::sax, ZeroPageY, 4),
    op!("TYA", tr::tya, Implied, 2),
    op!("STA", tr::sta, AbsoluteY, 5),
    op!("TXS", tr::txs, Implied, 2),
    None, // 0x9B TAS: unstable SP corruption, deliberately unimplemented
    op!("SHY", il::shy, AbsoluteX, 5),
    op!("STA", tr::sta, AbsoluteX, 5),
    None, // 0x9E SHX: unstable, deliberately unimplemented
    op!("SHA", il::sha, AbsoluteY, 5),
    // 0xA0
    op!("LDY", tr::ldy, Immediate, 2),
    op!("LDA", tr::lda, IndirectX, 6),
    op!("LDX", tr::ldx, Immediate, 2),
    op!("LAX", il::lax, IndirectX, 6),
    op!("LDY", tr::ldy, ZeroPage, 3),
    op!("LDA", tr::lda, ZeroPage, 3),
    op!("LDX", tr::ldx, ZeroPage, 3),
    op!("LAX", il::lax, ZeroPage, 3),
    op!("TAY", tr::tay, Implied, 2),
    op!("LDA", tr::lda, Immediate, 2),
    op!("TAX", tr::tax, Implied, 2),
    op!("LXA", il::lxa, Immediate, 2),
    op!("LDY", tr::ldy, Absolute, 4),
    op!("LDA", tr::lda, Absolute, 4),
    op!("LDX", tr::ldx, Absolute, 4),
    op!("LAX", il::lax, Absolute, 4),
    // 0xB0
    op!("BCS", ct::bcs, Relative, 2),
    op!("LDA", tr::lda, IndirectY, 5),
    op!("JAM", ct::jam, Implied, 2),
    op!("LAX", il::lax, IndirectY, 5),
    op!("LDY", tr::ldy, ZeroPageX, 4),
    op!("LDA", tr::lda, ZeroPageX, 4),
    op!("LDX", tr::ldx, ZeroPageY, 4),
    op!("LAX", il::lax, ZeroPageY, 4),
    op!("CLV", ct::clv, Implied, 2),
    op!("LDA", tr::lda, AbsoluteY, 4),
    op!("TSX", tr::tsx, Implied, 2),
    op!("LAS", il::las, AbsoluteY, 4),
    op!("LDY", tr::ldy, AbsoluteX, 4),
    op!("LDA", tr::lda, AbsoluteX, 4),
    op!("LDX", tr::ldx, AbsoluteY, 4),
    op!("LAX", il::lax, AbsoluteY, 4),
    // 0xC0
    op!("CPY", ar::cpy, Immediate, 2),
    op!("CMP", ar::cmp, IndirectX, 6),
    op!("NOP", ct::nop, Immediate, 2),
    op!("DCP", il::dcp, IndirectX, 8),
    op!("CPY", ar::cpy, ZeroPage, 3),
    op!("CMP", ar::cmp, ZeroPage, 3),
    op!("DEC", ar::dec, ZeroPage, 5),
    op!("DCP", il::dcp, ZeroPage, 5),
    op!("INY", ar::iny, Implied, 2),
    op!("CMP", ar::cmp, Immediate, 2),
    op!("DEX", ar::dex, Implied, 2),
    op!("SBX", il::sbx, Immediate, 2),
    op!("CPY", ar::cpy, Absolute, 4),
    op!("CMP", ar::cmp, Absolute, 4),
    op!("DEC", ar::dec, Absolute, 6),
    op!("DCP", il::dcp, Absolute, 6),
    // 0xD0
    op!("BNE", ct::bne, Relative, 2),
    op!("CMP", ar::cmp, IndirectY, 5),
    op!("JAM", ct::jam, Implied, 2),
    op!("DCP", il::dcp, IndirectY, 8),
    op!("NOP", ct::nop, ZeroPageX, 4),
    op!("CMP", ar::cmp, ZeroPageX, 4),
    op!("DEC", ar::dec, ZeroPageX, 6),
    op!("DCP", il::dcp, ZeroPageX, 6),
    op!("CLD", ct::cld, Implied, 2),
    op!("CMP", ar::cmp, AbsoluteY, 4),
    op!("NOP", ct::nop, Implied, 2),
    op!("DCP", il::dcp, AbsoluteY, 7),
    op!("NOP", ct::nop, AbsoluteX, 4),
    op!("CMP", ar::cmp, AbsoluteX, 4),
    op!("DEC", ar::dec, AbsoluteX, 7),
    op!("DCP", il::dcp, AbsoluteX, 7),
    // 0xE0
    op!("CPX", ar::cpx, Immediate, 2),
    op!("SBC", ar::sbc, IndirectX, 6),
    op!("NOP", ct::nop, Immediate, 2),
    op!("ISC", il::isc, IndirectX, 8),
    op!("CPX", ar::cpx, ZeroPage, 3),
    op!("SBC", ar::sbc, ZeroPage, 3),
    op!("INC", ar::inc, ZeroPage, 5),
    op!("ISC", il::isc, ZeroPage, 5),
    op!("INX", ar::inx, Implied, 2),
    op!("SBC", ar::sbc, Immediate, 2),
    op!("NOP", ct::nop, Implied, 2),
    op!("SBC", ar::sbc, Immediate, 2), // 0xEB USBC, behaves as SBC
    op!("CPX", ar::cpx, Absolute, 4),
    op!("SBC", ar::sbc, Absolute, 4),
    op!("INC", ar::inc, Absolute, 6),
    op!("ISC", il::isc, Absolute, 6),
    // 0xF0
    op!("BEQ", ct::beq, Relative, 2),
    op!("SBC", ar::sbc, IndirectY, 5),
    op!("JAM", ct::jam, Implied, 2),
    op!("ISC", il::isc, IndirectY, 8),
    op!("NOP", ct::nop, ZeroPageX, 4),
    op!("SBC", ar::sbc, ZeroPageX, 4),
    op!("INC", ar::inc, ZeroPageX, 6),
    op!("ISC", il::isc, ZeroPageX, 6),
    op!("SED", ct::sed, Implied, 2),
    op!("SBC", ar::sbc, AbsoluteY, 4),
    op!("NOP", ct::nop, Implied, 2),
    op!("ISC", il::isc, AbsoluteY, 7),
    op!("NOP", ct::nop, AbsoluteX, 4),
    op!("SBC", ar::sbc, AbsoluteX, 4),
    op!("INC", ar::inc, AbsoluteX, 7),
    op!("ISC", il::isc, AbsoluteX, 7),
];

#[cfg(test)]
mod tests {
    use super::OPCODES;
    use crate::cpu::addressing::AddressMode;

    #[test]
    fn table_has_exactly_two_holes() {
        let holes: Vec<usize> = OPCODES
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_none())
            .map(|(i, _)| i)
            .collect();
        assert_eq!(holes, vec![0x9B, 0x9E]);
    }

    #[test]
    fn relative_mode_is_branches_only() {
        for (i, entry) in OPCODES.iter().enumerate() {
            if let Some(op) = entry
                && op.mode == AddressMode::Relative
            {
                assert!(
                    op.mnemonic.starts_with('B') && op.mnemonic != "BIT" && op.mnemonic != "BRK",
                    "opcode {i:#04x} uses relative mode but is {}",
                    op.mnemonic
                );
            }
        }
    }

    #[test]
    fn every_jam_is_implied_mode() {
        for entry in OPCODES.iter().flatten() {
            if entry.mnemonic == "JAM" {
                assert_eq!(entry.mode, AddressMode::Implied);
            }
        }
    }
}
