/*!
Slice device: a bounded window over another shared handler.

Where [`crate::bus::Rom::bank`] carves read-only banks out of raw image
bytes, `Slice` banks a live device, keeping writes visible through every
view. CHR RAM bank switching needs exactly this: all 4 KiB views alias the
same 8 KiB RAM.
*/

use crate::bus::device::{BusDevice, Null, SharedDevice, share};

/// A `[start, start + len)` window over a shared device.
pub struct Slice {
    base: SharedDevice,
    start: u16,
    len: u16,
}

impl Slice {
    /// Build a window over `base`. Out-of-range bounds yield the null
    /// device, reading 0 and discarding writes.
    pub fn over(base: SharedDevice, start: u32, end: u32) -> SharedDevice {
        let base_len = base.borrow().len();
        if start >= end || end > base_len {
            log::warn!(
                "slice [{:#x}, {:#x}) outside device of {:#x} bytes",
                start,
                end,
                base_len
            );
            return share(Null);
        }
        share(Slice {
            base,
            start: start as u16,
            len: (end - start) as u16,
        })
    }

    #[inline]
    fn translate(&self, addr: u16) -> u16 {
        self.start + addr % self.len
    }
}

impl BusDevice for Slice {
    #[inline]
    fn read(&mut self, addr: u16) -> u8 {
        let a = self.translate(addr);
        self.base.borrow_mut().read(a)
    }

    #[inline]
    fn write(&mut self, addr: u16, value: u8) -> u8 {
        let a = self.translate(addr);
        self.base.borrow_mut().write(a, value)
    }

    fn len(&self) -> u32 {
        self.len as u32
    }

    fn label(&self) -> &'static str {
        "slice"
    }
}

#[cfg(test)]
mod tests {
    use super::Slice;
    use crate::bus::device::{BusDevice, share};
    use crate::bus::ram::Ram;

    #[test]
    fn windows_alias_the_same_storage() {
        let ram = share(Ram::new(0x2000));
        let low = Slice::over(ram.clone(), 0x0000, 0x1000);
        let high = Slice::over(ram.clone(), 0x1000, 0x2000);

        low.borrow_mut().write(0x0005, 0xAB);
        assert_eq!(ram.borrow_mut().read(0x0005), 0xAB);

        high.borrow_mut().write(0x0005, 0xCD);
        assert_eq!(ram.borrow_mut().read(0x1005), 0xCD);
        // The low window is untouched by the high write.
        assert_eq!(low.borrow_mut().read(0x0005), 0xAB);
    }

    #[test]
    fn out_of_range_window_is_null() {
        let ram = share(Ram::new(0x100));
        let bad = Slice::over(ram, 0x80, 0x200);
        assert_eq!(bad.borrow_mut().read(0), 0);
        assert_eq!(bad.borrow_mut().write(0, 0x77), 0);
    }
}
