/*!
Console wiring.

Purpose
- Assemble the chips into a running NTSC console: internal RAM mirrored
  over $0000-$1FFF, the PPU register file over $2000-$3FFF, the APU and
  I/O window at $4000, the cartridge through a mapper registry, and one
  master clock driving everything.

Tick order inside any shared 12-tick master window is CPU first (divider
12, phase 0), then PPU (divider 4, phase 1); the APU frame counter and
sample listeners run at 240 Hz and 44.1 kHz off the same clock.
*/

use std::cell::RefCell;
use std::rc::Rc;

use crate::apu::{Apu, SampleQueue};
use crate::bus::{Bus, Ram, share};
use crate::cartridge::{Cartridge, CartridgeError};
use crate::clock::{
    CPU_DIVIDER, ClockControl, MasterClock, NTSC_MASTER_HZ, PPU_DIVIDER, TimeSource,
};
use crate::controller::Controller;
use crate::cpu::{Cpu, CpuSignals};
use crate::mapper::MapperRegistry;
use crate::ppu::{FrameHandle, Ppu, PpuRegisters, SharedPpu};

const FRAME_COUNTER_HZ: u64 = 240;
const SAMPLE_HZ: u64 = 44_100;

pub struct Nes {
    cpu: Rc<RefCell<Cpu>>,
    ppu: SharedPpu,
    apu: Rc<RefCell<Apu>>,
    bus: Bus,
    clock: MasterClock,
}

impl Nes {
    /// Console paced against real time.
    pub fn new(cartridge: &Cartridge, registry: &MapperRegistry) -> Result<Self, CartridgeError> {
        Self::assemble(cartridge, registry, MasterClock::new(NTSC_MASTER_HZ))
    }

    /// Console on an injected time source, for deterministic runs.
    pub fn with_time_source(
        cartridge: &Cartridge,
        registry: &MapperRegistry,
        time: Box<dyn TimeSource>,
    ) -> Result<Self, CartridgeError> {
        let clock = MasterClock::with_time_source(NTSC_MASTER_HZ, time);
        Self::assemble(cartridge, registry, clock)
    }

    fn assemble(
        cartridge: &Cartridge,
        registry: &MapperRegistry,
        mut clock: MasterClock,
    ) -> Result<Self, CartridgeError> {
        let bus = Bus::new();
        let signals = CpuSignals::new();

        // 2 KiB internal RAM, mirrored four times.
        bus.map(0x0000, 0x2000, share(Ram::new(0x800)));

        let ppu = Rc::new(RefCell::new(Ppu::new(signals.clone())));
        bus.map(0x2000, 0x2000, share(PpuRegisters::new(ppu.clone())));

        let apu = Rc::new(RefCell::new(Apu::new(bus.clone(), signals.clone())));
        bus.map(0x4000, 0x20, apu.clone());

        registry.attach(cartridge, &bus, &ppu)?;

        let cpu = Rc::new(RefCell::new(Cpu::new(bus.clone(), signals)));

        let c = cpu.clone();
        clock.listen(CPU_DIVIDER, 0, Box::new(move |_| c.borrow_mut().step()));
        let p = ppu.clone();
        clock.listen(
            PPU_DIVIDER,
            1,
            Box::new(move |_| {
                p.borrow_mut().tick();
                1
            }),
        );
        let a = apu.clone();
        clock.listen(
            NTSC_MASTER_HZ / FRAME_COUNTER_HZ,
            2,
            Box::new(move |_| {
                a.borrow_mut().clock_frame_counter();
                1
            }),
        );
        let a = apu.clone();
        clock.listen(
            NTSC_MASTER_HZ / SAMPLE_HZ,
            3,
            Box::new(move |_| {
                a.borrow_mut().clock_sample();
                1
            }),
        );

        let mut nes = Nes {
            cpu,
            ppu,
            apu,
            bus,
            clock,
        };
        nes.reset();
        Ok(nes)
    }

    /// Reset the CPU through its vector, then align the PPU to the cycles
    /// the reset sequence consumed.
    pub fn reset(&mut self) {
        let cycles = self.cpu.borrow_mut().reset();
        self.ppu.borrow_mut().reset(cycles);
    }

    /// Run paced until the control handle stops the clock.
    pub fn run(&mut self) {
        self.clock.run();
    }

    /// Dispatch one clock listener without pacing.
    pub fn step(&mut self) {
        self.clock.step_one();
    }

    pub fn control(&self) -> ClockControl {
        self.clock.control()
    }

    pub fn frame_handle(&self) -> FrameHandle {
        self.ppu.borrow().frame_handle()
    }

    pub fn frame_count(&self) -> u64 {
        self.ppu.borrow().frame_count()
    }

    pub fn sample_queue(&self) -> SampleQueue {
        self.apu.borrow().sample_queue()
    }

    /// Mutate a joypad; `port` 0 is $4016, 1 is $4017.
    pub fn controller<R>(&self, port: usize, f: impl FnOnce(&mut Controller) -> R) -> R {
        f(self.apu.borrow_mut().controller_mut(port))
    }

    pub fn cpu(&self) -> Rc<RefCell<Cpu>> {
        self.cpu.clone()
    }

    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }
}
