/*!
APU and I/O register window, $4000-$4017.

Purpose
- Channel synthesis is out of scope; this models the bus-visible contract:
  the $4015 status byte, the frame counter and its IRQ, OAM DMA at $4014,
  the controller ports at $4016/$4017, and a bounded sample queue for a
  host audio sink.

Frame counter
- A 240 Hz clock listener drives `clock_frame_counter`. In 4-step mode the
  final step latches the frame IRQ flag and pulls the CPU IRQ line unless
  inhibited by $4017 bit 6. 5-step mode never raises the IRQ.

OAM DMA
- A $4014 write copies one CPU page into PPU OAM through 256 reads and
  $2004 writes, then freezes the CPU for 513 cycles plus one more when the
  write lands on an odd cycle.
*/

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::bus::{Bus, BusDevice};
use crate::controller::Controller;
use crate::cpu::CpuSignals;

const STATUS_FRAME_IRQ: u8 = 0x40;
const STATUS_DMC_IRQ: u8 = 0x80;

/// Open-bus byte driven back from the write-only channel registers.
const OPEN_BUS: u8 = 0x40;

pub struct Apu {
    bus: Bus,
    signals: CpuSignals,
    controllers: [Controller; 2],

    /// Channel enable mask from the last $4015 write; without length
    /// counters it doubles as the status read-back bits.
    enabled: u8,
    five_step: bool,
    irq_inhibit: bool,
    frame_irq: bool,
    dmc_irq: bool,
    sequence_step: u8,

    samples: SampleQueue,
}

impl Apu {
    pub fn new(bus: Bus, signals: CpuSignals) -> Self {
        Apu {
            bus,
            signals,
            controllers: [Controller::new(), Controller::new()],
            enabled: 0,
            five_step: false,
            irq_inhibit: false,
            frame_irq: false,
            dmc_irq: false,
            sequence_step: 0,
            samples: SampleQueue::new(4096),
        }
    }

    pub fn controller_mut(&mut self, port: usize) -> &mut Controller {
        &mut self.controllers[port & 1]
    }

    /// Cloneable handle for the host audio sink.
    pub fn sample_queue(&self) -> SampleQueue {
        self.samples.clone()
    }

    /// One 240 Hz frame-counter step.
    pub fn clock_frame_counter(&mut self) {
        let steps = if self.five_step { 5 } else { 4 };
        self.sequence_step = (self.sequence_step + 1) % steps;
        if !self.five_step && self.sequence_step == 0 && !self.irq_inhibit {
            self.frame_irq = true;
            self.signals.raise_irq();
        }
    }

    /// One 44.1 kHz output sample. Silence until channel synthesis exists.
    pub fn clock_sample(&mut self) {
        self.samples.push(0.0);
    }

    fn read_status(&mut self) -> u8 {
        let mut status = self.enabled & 0x1F;
        if self.frame_irq {
            status |= STATUS_FRAME_IRQ;
        }
        if self.dmc_irq {
            status |= STATUS_DMC_IRQ;
        }
        self.frame_irq = false;
        status
    }

    fn write_frame_counter(&mut self, value: u8) {
        self.five_step = value & 0x80 != 0;
        self.irq_inhibit = value & 0x40 != 0;
        self.sequence_step = 0;
        if self.irq_inhibit {
            self.frame_irq = false;
        }
    }

    fn oam_dma(&mut self, page: u8) {
        // A $40 source page would route the copy loop back through this
        // device while it is already borrowed for the $4014 write.
        if page == 0x40 {
            log::warn!("apu: oam dma sourced from the register page, ignored");
            return;
        }
        let base = (page as u16) << 8;
        for i in 0..256 {
            let byte = self.bus.read(base + i);
            self.bus.write(0x2004, byte);
        }
        let stall = 513 + (self.signals.cpu_cycles() & 1);
        self.signals.add_stall(stall);
        log::trace!("apu: oam dma from ${base:04X}, {stall} cycle stall");
    }
}

impl BusDevice for Apu {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x4015 => self.read_status(),
            0x4016 => self.controllers[0].read() | OPEN_BUS,
            0x4017 => self.controllers[1].read() | OPEN_BUS,
            0x4000..=0x4014 => OPEN_BUS,
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) -> u8 {
        match addr {
            0x4014 => self.oam_dma(value),
            0x4015 => {
                self.enabled = value & 0x1F;
                self.dmc_irq = false;
            }
            0x4016 => {
                self.controllers[0].write_strobe(value);
                self.controllers[1].write_strobe(value);
            }
            0x4017 => self.write_frame_counter(value),
            0x4000..=0x4013 => {
                // Channel registers accepted and dropped; no synthesis.
            }
            _ => log::warn!("apu: write to unhandled ${addr:04X} = {value:#04x}"),
        }
        0
    }

    fn len(&self) -> u32 {
        0x20
    }

    fn label(&self) -> &'static str {
        "apu"
    }
}

/// Bounded audio sample ring. On overrun the oldest half is dropped so a
/// stalled consumer costs latency, never a blocked emulation thread.
#[derive(Clone)]
pub struct SampleQueue {
    inner: Rc<RefCell<VecDeque<f32>>>,
    capacity: usize,
}

impl SampleQueue {
    pub fn new(capacity: usize) -> Self {
        SampleQueue {
            inner: Rc::new(RefCell::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn push(&self, sample: f32) {
        let mut queue = self.inner.borrow_mut();
        if queue.len() >= self.capacity {
            let keep = self.capacity / 2;
            let dropped = queue.len() - keep;
            queue.drain(..dropped);
            log::debug!("apu: sample queue overrun, dropped {dropped} samples");
        }
        queue.push_back(sample);
    }

    pub fn pop(&self) -> Option<f32> {
        self.inner.borrow_mut().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{Ram, share};
    use crate::controller::Button;
    use crate::ppu::{Ppu, PpuRegisters};

    fn wire() -> (Bus, Rc<RefCell<Ppu>>, Rc<RefCell<Apu>>, CpuSignals) {
        let bus = Bus::new();
        let signals = CpuSignals::new();
        bus.map(0x0000, 0x2000, share(Ram::new(0x800)));
        let ppu = Rc::new(RefCell::new(Ppu::new(signals.clone())));
        bus.map(0x2000, 0x2000, share(PpuRegisters::new(ppu.clone())));
        let apu = Rc::new(RefCell::new(Apu::new(bus.clone(), signals.clone())));
        bus.map(0x4000, 0x20, apu.clone());
        (bus, ppu, apu, signals)
    }

    #[test]
    fn four_step_sequence_raises_the_frame_irq() {
        let (bus, _, apu, _) = wire();
        for _ in 0..4 {
            apu.borrow_mut().clock_frame_counter();
        }
        let status = bus.read(0x4015);
        assert_ne!(status & STATUS_FRAME_IRQ, 0);
        assert_eq!(bus.read(0x4015) & STATUS_FRAME_IRQ, 0, "read clears it");
    }

    #[test]
    fn irq_inhibit_suppresses_the_frame_flag() {
        let (bus, _, apu, _) = wire();
        bus.write(0x4017, 0x40);
        for _ in 0..12 {
            apu.borrow_mut().clock_frame_counter();
        }
        assert_eq!(bus.read(0x4015) & STATUS_FRAME_IRQ, 0);
    }

    #[test]
    fn five_step_mode_never_raises_the_frame_flag() {
        let (bus, _, apu, _) = wire();
        bus.write(0x4017, 0x80);
        for _ in 0..15 {
            apu.borrow_mut().clock_frame_counter();
        }
        assert_eq!(bus.read(0x4015) & STATUS_FRAME_IRQ, 0);
    }

    #[test]
    fn status_reports_the_enable_mask() {
        let (bus, _, _, _) = wire();
        bus.write(0x4015, 0x15);
        assert_eq!(bus.read(0x4015) & 0x1F, 0x15);
    }

    #[test]
    fn channel_registers_read_back_open_bus() {
        let (bus, _, _, _) = wire();
        bus.write(0x4003, 0xFF);
        assert_eq!(bus.read(0x4003), OPEN_BUS);
    }

    #[test]
    fn oam_dma_copies_a_page_and_stalls_the_cpu() {
        let (bus, ppu, _, signals) = wire();
        for i in 0..256u16 {
            bus.write(0x0300 + i, i as u8);
        }
        bus.write(0x4014, 0x03);

        let oam = ppu.borrow().oam;
        for i in 0..256 {
            assert_eq!(oam[i], i as u8);
        }
        assert_eq!(signals.cpu_cycles(), 513, "even-cycle start costs 513");
    }

    #[test]
    fn oam_dma_from_the_register_page_is_ignored() {
        let (bus, _, _, signals) = wire();
        bus.write(0x4014, 0x40);
        assert_eq!(signals.cpu_cycles(), 0, "no stall charged");
    }

    #[test]
    fn controller_port_shifts_through_the_bus() {
        let (bus, _, apu, _) = wire();
        apu.borrow_mut().controller_mut(0).set_button(Button::A, true);
        apu.borrow_mut()
            .controller_mut(0)
            .set_button(Button::Start, true);
        bus.write(0x4016, 1);
        bus.write(0x4016, 0);

        let bits: Vec<u8> = (0..8).map(|_| bus.read(0x4016) & 1).collect();
        assert_eq!(bits, [1, 0, 0, 1, 0, 0, 0, 0]);
        assert_eq!(bus.read(0x4016) & 1, 1, "exhausted register reads 1");
    }

    #[test]
    fn sample_queue_drops_the_oldest_half_on_overrun() {
        let queue = SampleQueue::new(4);
        for i in 0..5 {
            queue.push(i as f32);
        }
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.pop(), Some(2.0));
    }
}
