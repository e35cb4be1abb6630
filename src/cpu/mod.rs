/*!
CPU execution engine: 6502 family, NES 2A03 wiring.

Purpose
- Fetch/decode/execute loop over a 256-entry opcode table, with cycle
  accounting exact enough to drive the PPU in lockstep (1 CPU cycle = 3 PPU
  dots). Addressing-mode cycle penalties, dummy reads before indexed writes,
  and branch timing all follow the documented hardware behavior.

Interrupt and stall lines
- NMI, IRQ and the DMA stall counter arrive through `CpuSignals`, a shared
  cell bundle cloneable by the PPU and APU. NMI is modeled as a countdown so
  the PPU can defer delivery by a step and still cancel it during the
  VBlank race window. NMI dominates IRQ; an IRQ sampled while the
  interrupt-disable flag is set stays pending and is serviced once the
  flag clears.

Failure model
- An opcode byte with no table entry, or one of the documented JAM opcodes,
  is a fatal fault: the fault flag latches, the failing opcode and address
  are logged once, and every subsequent step reports a large sentinel cycle
  count. Real hardware locks up here; there is nothing to recover.
*/

pub mod addressing;
pub mod ops;
pub mod table;

use std::cell::Cell;
use std::rc::Rc;

use crate::bus::Bus;
use crate::cpu::table::OPCODES;

pub const FLAG_CARRY: u8 = 0x01;
pub const FLAG_ZERO: u8 = 0x02;
pub const FLAG_INTERRUPT_DISABLE: u8 = 0x04;
/// Decimal mode: present in the status byte but inert on the 2A03.
pub const FLAG_DECIMAL: u8 = 0x08;
/// Virtual: only materializes in bytes pushed by PHP/BRK, never read back.
pub const FLAG_BREAK: u8 = 0x10;
/// Bit 5, always set.
pub const FLAG_UNUSED: u8 = 0x20;
pub const FLAG_OVERFLOW: u8 = 0x40;
pub const FLAG_NEGATIVE: u8 = 0x80;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Cycle report of a faulted CPU: large enough that a paced scheduler
/// effectively stops asking.
pub const FAULT_CYCLES: u64 = 9999;

/// Pending interrupt kind. NMI dominates IRQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Interrupt {
    None,
    Irq,
    Nmi,
}

#[derive(Default)]
struct SignalCells {
    /// NMI delivery countdown in CPU steps; 0 = no NMI staged.
    nmi: Cell<u8>,
    irq: Cell<bool>,
    /// Cycles the CPU must burn before its next fetch (DMA stalls).
    stall: Cell<u64>,
    /// Mirror of the CPU's total cycle count, for alignment decisions.
    cpu_cycles: Cell<u64>,
}

/// Shared interrupt/stall lines into the CPU.
///
/// The PPU and APU hold clones and pull the lines without borrowing the CPU
/// itself, which keeps register-write side effects (NMI re-arm, OAM DMA)
/// legal while the CPU is mid-instruction.
#[derive(Clone, Default)]
pub struct CpuSignals {
    cells: Rc<SignalCells>,
}

impl CpuSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage an NMI for delivery `delay` CPU steps from now. `delay` of 1
    /// means the next step services it.
    pub fn raise_nmi(&self, delay: u8) {
        self.cells.nmi.set(delay.max(1));
    }

    /// Withdraw a staged NMI that has not been delivered yet.
    pub fn cancel_nmi(&self) {
        self.cells.nmi.set(0);
    }

    /// True if an NMI is staged and undelivered.
    pub fn nmi_staged(&self) -> bool {
        self.cells.nmi.get() > 0
    }

    /// Pull the IRQ line. Cleared when the CPU samples it.
    pub fn raise_irq(&self) {
        self.cells.irq.set(true);
    }

    /// Add `cycles` of stall before the CPU's next fetch.
    pub fn add_stall(&self, cycles: u64) {
        self.cells.stall.set(self.cells.stall.get() + cycles);
    }

    /// Total CPU cycles so far, including pending stall. OAM DMA uses the
    /// parity of this to pick its 513/514 cycle cost.
    pub fn cpu_cycles(&self) -> u64 {
        self.cells.cpu_cycles.get() + self.cells.stall.get()
    }
}

/// The 2A03 CPU core.
pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub pc: u16,
    pub sp: u8,
    pub status: u8,
    /// Cycle accumulator for the instruction in flight.
    pub(crate) cyc: u64,
    /// Total cycles since power-on.
    pub cycles: u64,
    /// Log a trace line per instruction when set.
    pub trace: bool,
    pending: Interrupt,
    fault: bool,
    signals: CpuSignals,
    pub(crate) bus: Bus,
}

impl Cpu {
    pub fn new(bus: Bus, signals: CpuSignals) -> Self {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            status: FLAG_UNUSED | FLAG_INTERRUPT_DISABLE,
            cyc: 0,
            cycles: 0,
            trace: false,
            pending: Interrupt::None,
            fault: false,
            signals,
            bus,
        }
    }

    /// Power-on/reset state: SP 0xFD, interrupts disabled, PC from the
    /// reset vector. Costs 7 cycles, reported as the return value.
    pub fn reset(&mut self) -> u64 {
        self.sp = 0xFD;
        self.status = FLAG_UNUSED | FLAG_INTERRUPT_DISABLE;
        self.pending = Interrupt::None;
        self.fault = false;
        self.pc = self.bus.read_word(RESET_VECTOR);
        self.cycles += 7;
        7
    }

    /// Edge-trigger an NMI directly (asynchronous sources go through
    /// [`CpuSignals`] instead).
    pub fn nmi(&mut self) {
        self.pending = Interrupt::Nmi;
    }

    /// Edge-trigger an IRQ. Ignored in favor of a pending NMI.
    pub fn irq(&mut self) {
        if self.pending < Interrupt::Irq {
            self.pending = Interrupt::Irq;
        }
    }

    /// True once a fatal fault has latched.
    pub fn faulted(&self) -> bool {
        self.fault
    }

    pub fn signals(&self) -> CpuSignals {
        self.signals.clone()
    }

    /// Execute one stall period, interrupt service, or instruction.
    /// Returns the cycles consumed, which is what the clock listener
    /// reports back to the scheduler.
    pub fn step(&mut self) -> u64 {
        let n = self.step_inner();
        self.signals.cells.cpu_cycles.set(self.cycles);
        n
    }

    fn step_inner(&mut self) -> u64 {
        if self.fault {
            return FAULT_CYCLES;
        }

        // External stall (OAM DMA and friends) delays the next fetch.
        let stall = self.signals.cells.stall.take();
        if stall > 0 {
            self.cycles += stall;
            return stall;
        }

        self.poll_signals();

        self.cyc = 0;
        match self.pending {
            Interrupt::Nmi => {
                self.service_interrupt(NMI_VECTOR);
                self.pending = Interrupt::None;
            }
            // A masked IRQ is held, not discarded: the line is level
            // sensitive, so it fires as soon as the disable flag clears.
            Interrupt::Irq if !self.flag(FLAG_INTERRUPT_DISABLE) => {
                self.service_interrupt(IRQ_VECTOR);
                self.pending = Interrupt::None;
            }
            _ => {}
        }
        if self.cyc > 0 {
            self.cycles += self.cyc;
            return self.cyc;
        }

        let at = self.pc;
        let opcode = self.read_pc();
        let Some(entry) = &OPCODES[opcode as usize] else {
            log::error!("cpu: no operation for ${opcode:02X} at ${at:04X}, halting");
            self.fault = true;
            return FAULT_CYCLES;
        };

        if self.trace {
            log::trace!(
                "{:04X}  {} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X}",
                at,
                entry.mnemonic,
                self.a,
                self.x,
                self.y,
                self.status,
                self.sp
            );
        }

        self.cyc += entry.cycles;
        (entry.exec)(self, entry.mode);

        if self.fault {
            return FAULT_CYCLES;
        }
        self.cycles += self.cyc;
        self.cyc
    }

    /// Count down a staged NMI and sample the IRQ line.
    fn poll_signals(&mut self) {
        let nmi = self.signals.cells.nmi.get();
        if nmi > 0 {
            self.signals.cells.nmi.set(nmi - 1);
            if nmi == 1 {
                self.nmi();
            }
        }
        if self.signals.cells.irq.take() {
            self.irq();
        }
    }

    fn service_interrupt(&mut self, vector: u16) {
        self.push16(self.pc);
        // The break bit is virtual; hardware-initiated pushes leave it clear.
        self.push((self.status | FLAG_UNUSED) & !FLAG_BREAK);
        self.pc = self.bus.read_word(vector);
        self.set_flag(FLAG_INTERRUPT_DISABLE, true);
        self.cyc += 7;
    }

    /// Latch the fatal fault: JAM opcodes land here.
    pub(crate) fn halt(&mut self, opcode: u8) {
        log::error!(
            "cpu: JAM ${:02X} at ${:04X}, halting",
            opcode,
            self.pc.wrapping_sub(1)
        );
        self.fault = true;
    }

    // Memory access

    #[inline]
    pub(crate) fn read(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    #[inline]
    pub(crate) fn write(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value)
    }

    #[inline]
    pub(crate) fn read_pc(&mut self) -> u8 {
        let v = self.bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        v
    }

    #[inline]
    pub(crate) fn read_pc16(&mut self) -> u16 {
        let lo = self.read_pc() as u16;
        let hi = self.read_pc() as u16;
        (hi << 8) | lo
    }

    /// 16-bit read that wraps within the page, reproducing the JMP
    /// ($xxFF) indirection bug and zero-page pointer wraparound.
    pub(crate) fn read16_wrapped(&mut self, addr: u16) -> u16 {
        let lo = self.bus.read(addr) as u16;
        let hi_addr = (addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF);
        let hi = self.bus.read(hi_addr) as u16;
        (hi << 8) | lo
    }

    // Stack ($0100-$01FF), SP post-decrement on push.

    pub(crate) fn push(&mut self, value: u8) {
        self.bus.write(0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub(crate) fn pull(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.bus.read(0x0100 | self.sp as u16)
    }

    /// Push high byte first so the word reads back little-endian.
    pub(crate) fn push16(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push((value & 0xFF) as u8);
    }

    pub(crate) fn pull16(&mut self) -> u16 {
        let lo = self.pull() as u16;
        let hi = self.pull() as u16;
        (hi << 8) | lo
    }

    // Flags

    #[inline]
    pub(crate) fn flag(&self, mask: u8) -> bool {
        self.status & mask == mask
    }

    #[inline]
    pub(crate) fn set_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.status |= mask;
        } else {
            self.status &= !mask;
        }
    }

    #[inline]
    pub(crate) fn set_zn(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }
}

#[cfg(test)]
mod tests;
