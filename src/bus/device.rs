/*!
Device handler contract consumed by the bus.

A device sees the full bus address and applies its own masking; this keeps
the page table free of per-device offset bookkeeping and matches how real
address decoding is wired per chip.
*/

use std::cell::RefCell;
use std::rc::Rc;

/// A device mapped onto one or more bus pages.
pub trait BusDevice {
    /// Drive a byte for a read of `addr`.
    fn read(&mut self, addr: u16) -> u8;

    /// Accept a write and answer with the byte the device actually drives.
    ///
    /// Read-only devices answer with their stored byte; the bus compares
    /// the answer against the written value to detect conflicts. Returning
    /// 0 means "not driving", which never counts as a conflict.
    fn write(&mut self, addr: u16, value: u8) -> u8;

    /// Addressable span of the device in bytes.
    fn len(&self) -> u32;

    /// Identity used in bus-conflict log lines.
    fn label(&self) -> &'static str {
        "device"
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared, interiorly-mutable handle to a mapped device.
pub type SharedDevice = Rc<RefCell<dyn BusDevice>>;

/// Wrap a device for mapping onto a bus.
pub fn share<D: BusDevice + 'static>(device: D) -> SharedDevice {
    Rc::new(RefCell::new(device))
}

/// The absent device: reads 0, swallows writes.
///
/// Produced when a bank view is constructed out of range, so a bad bank
/// select degrades to open bus instead of a panic.
#[derive(Debug, Default, Clone, Copy)]
pub struct Null;

impl BusDevice for Null {
    fn read(&mut self, _addr: u16) -> u8 {
        0
    }

    fn write(&mut self, _addr: u16, _value: u8) -> u8 {
        0
    }

    fn len(&self) -> u32 {
        0
    }

    fn label(&self) -> &'static str {
        "null"
    }
}
