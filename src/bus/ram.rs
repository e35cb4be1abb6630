/*!
RAM device: byte storage with modulo mirroring.

The address given by the bus is reduced modulo the RAM size, so a 2 KiB RAM
mapped over an 8 KiB window is mirrored four times for free, matching the
address decoding of the console's internal RAM ($0000-$07FF visible through
$0800-$1FFF). Any power-of-two size mirrors the same way.
*/

use crate::bus::device::BusDevice;

/// General-purpose RAM of a fixed size.
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    /// Allocate `size` bytes of zeroed RAM.
    pub fn new(size: usize) -> Self {
        Ram {
            data: vec![0; size],
        }
    }

    #[inline]
    fn index(&self, addr: u16) -> usize {
        addr as usize % self.data.len()
    }
}

impl BusDevice for Ram {
    #[inline]
    fn read(&mut self, addr: u16) -> u8 {
        self.data[self.index(addr)]
    }

    #[inline]
    fn write(&mut self, addr: u16, value: u8) -> u8 {
        let idx = self.index(addr);
        self.data[idx] = value;
        value
    }

    fn len(&self) -> u32 {
        self.data.len() as u32
    }

    fn label(&self) -> &'static str {
        "ram"
    }
}

#[cfg(test)]
mod tests {
    use super::Ram;
    use crate::bus::device::BusDevice;

    #[test]
    fn mirrored_reads_and_writes() {
        let mut r = Ram::new(0x0800);

        r.write(0x0001, 0xAA);

        // Mirrors every 2 KiB: $0001, $0801, $1801 are the same cell.
        assert_eq!(r.read(0x0001), 0xAA);
        assert_eq!(r.read(0x0801), 0xAA);
        assert_eq!(r.read(0x1801), 0xAA);

        r.write(0x1801, 0x55);
        assert_eq!(r.read(0x0001), 0x55);
    }

    #[test]
    fn write_drives_written_value() {
        let mut r = Ram::new(0x100);
        assert_eq!(r.write(0x0042, 0x99), 0x99);
    }
}
