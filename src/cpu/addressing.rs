/*!
Addressing modes: operand resolution and cycle penalties.

Two resolution paths exist for the indexed modes, and the distinction is
load-bearing for cycle exactness:

- `addr` (read-destined): absolute-X, absolute-Y and indirect-Y charge one
  extra cycle only when indexing crosses a page, because the CPU gets the
  read for free when the high byte needs no fixup.
- `addr_fast` (write-destined): the CPU always performs a dummy read at the
  partially-indexed address before a write, so the penalty cycle is baked
  into the instruction's base cost and no extra is charged here. The dummy
  read still happens on the bus; devices with read side effects see it,
  just like on hardware.

Zero-page indexed modes wrap within page 0 without carry. Indirect modes
read their 16-bit pointers with page wraparound, reproducing the JMP
($xxFF) bug.
*/

use crate::cpu::Cpu;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressMode {
    Accumulator,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Immediate,
    Implied,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
}

impl AddressMode {
    /// Resolve to an effective address, consuming operand bytes at PC and
    /// charging page-cross penalties for the read-destined indexed modes.
    ///
    /// Accumulator, immediate and implied have no address; operations on
    /// those modes go through [`AddressMode::read`]/[`AddressMode::write`].
    pub fn addr(self, cpu: &mut Cpu) -> u16 {
        match self {
            AddressMode::Absolute => cpu.read_pc16(),
            AddressMode::AbsoluteX => Self::indexed(cpu, cpu.x),
            AddressMode::AbsoluteY => Self::indexed(cpu, cpu.y),
            AddressMode::Indirect => {
                let ptr = cpu.read_pc16();
                cpu.read16_wrapped(ptr)
            }
            AddressMode::IndirectX => {
                let ptr = cpu.read_pc().wrapping_add(cpu.x) as u16;
                cpu.read16_wrapped(ptr)
            }
            AddressMode::IndirectY => {
                let ptr = cpu.read_pc() as u16;
                let base = cpu.read16_wrapped(ptr);
                let addr = base.wrapping_add(cpu.y as u16);
                if base & 0xFF00 != addr & 0xFF00 {
                    Self::dummy_read(cpu, base, addr);
                    cpu.cyc += 1;
                }
                addr
            }
            AddressMode::Relative => {
                let mut offset = cpu.read_pc() as u16;
                if offset & 0x80 != 0 {
                    offset |= 0xFF00; // sign-extend
                }
                cpu.pc.wrapping_add(offset)
            }
            AddressMode::ZeroPage => cpu.read_pc() as u16,
            AddressMode::ZeroPageX => cpu.read_pc().wrapping_add(cpu.x) as u16,
            AddressMode::ZeroPageY => cpu.read_pc().wrapping_add(cpu.y) as u16,
            AddressMode::Accumulator | AddressMode::Immediate | AddressMode::Implied => {
                unreachable!("{self:?} has no effective address")
            }
        }
    }

    /// Resolve to an effective address for a write or read-modify-write.
    ///
    /// The indexed modes always pay the dummy read here; everything else
    /// defers to [`AddressMode::addr`].
    pub fn addr_fast(self, cpu: &mut Cpu) -> u16 {
        match self {
            AddressMode::AbsoluteX => {
                let base = cpu.read_pc16();
                let addr = base.wrapping_add(cpu.x as u16);
                Self::dummy_read(cpu, base, addr);
                addr
            }
            AddressMode::AbsoluteY => {
                let base = cpu.read_pc16();
                let addr = base.wrapping_add(cpu.y as u16);
                Self::dummy_read(cpu, base, addr);
                addr
            }
            AddressMode::IndirectY => {
                let ptr = cpu.read_pc() as u16;
                let base = cpu.read16_wrapped(ptr);
                let addr = base.wrapping_add(cpu.y as u16);
                Self::dummy_read(cpu, base, addr);
                addr
            }
            _ => self.addr(cpu),
        }
    }

    /// Fetch the operand value.
    pub fn read(self, cpu: &mut Cpu) -> u8 {
        match self {
            AddressMode::Accumulator => cpu.a,
            AddressMode::Immediate => cpu.read_pc(),
            AddressMode::Implied | AddressMode::Relative => {
                unreachable!("{self:?} has no value to read")
            }
            _ => {
                let addr = self.addr(cpu);
                cpu.read(addr)
            }
        }
    }

    /// Store a result, paying the always-on indexed-write penalty.
    pub fn write(self, cpu: &mut Cpu, value: u8) {
        match self {
            AddressMode::Accumulator => cpu.a = value,
            AddressMode::Immediate | AddressMode::Implied | AddressMode::Relative => {
                unreachable!("{self:?} cannot be written")
            }
            _ => {
                let addr = self.addr_fast(cpu);
                cpu.write(addr, value);
            }
        }
    }

    /// Absolute indexed resolution with the page-cross penalty.
    fn indexed(cpu: &mut Cpu, index: u8) -> u16 {
        let base = cpu.read_pc16();
        let addr = base.wrapping_add(index as u16);
        if base & 0xFF00 != addr & 0xFF00 {
            Self::dummy_read(cpu, base, addr);
            cpu.cyc += 1;
        }
        addr
    }

    /// The hardware reads the unfixed address (old page, new low byte)
    /// while it fixes up the high byte.
    #[inline]
    fn dummy_read(cpu: &mut Cpu, base: u16, addr: u16) {
        cpu.read((base & 0xFF00) | (addr & 0x00FF));
    }
}
