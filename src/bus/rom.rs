/*!
ROM device: read-only storage plus bounded bank views.

Writes are ignored and answer with the stored byte, modeling lines the ROM
keeps driving regardless of what the initiator puts on the bus; a diverging
simultaneous write therefore surfaces as a logged bus conflict upstream.

Mappers carve banks out of a (possibly much larger than 64 KiB) ROM image
with [`Rom::bank`]; the view shares the image storage, so switching a bank
is a cheap handle swap, never a copy.
*/

use std::rc::Rc;

use crate::bus::device::{BusDevice, Null, SharedDevice, share};

/// Read-only memory backed by a shared image, restricted to a window.
pub struct Rom {
    data: Rc<[u8]>,
    start: usize,
    len: usize,
}

impl Rom {
    /// Wrap a full ROM image.
    pub fn new(data: Vec<u8>) -> Self {
        let len = data.len();
        Rom {
            data: data.into(),
            start: 0,
            len,
        }
    }

    /// A bank view of `[start, end)` over the same image, as a mappable
    /// device. An out-of-range request yields the null device so that a
    /// wild bank select reads as open bus.
    pub fn bank(&self, start: usize, end: usize) -> SharedDevice {
        if start > end || end > self.data.len() {
            log::warn!(
                "rom bank [{:#x}, {:#x}) outside image of {:#x} bytes",
                start,
                end,
                self.data.len()
            );
            return share(Null);
        }
        share(Rom {
            data: self.data.clone(),
            start,
            len: end - start,
        })
    }

    #[inline]
    fn fetch(&self, addr: u16) -> u8 {
        self.data[self.start + addr as usize % self.len]
    }
}

impl BusDevice for Rom {
    #[inline]
    fn read(&mut self, addr: u16) -> u8 {
        self.fetch(addr)
    }

    #[inline]
    fn write(&mut self, addr: u16, _value: u8) -> u8 {
        // Read-only lines keep driving the stored byte.
        self.fetch(addr)
    }

    fn len(&self) -> u32 {
        self.len as u32
    }

    fn label(&self) -> &'static str {
        "rom"
    }
}
