/*!
Bus module: page-granular address space with stacked device handlers.

Overview
- The address space is split into 256 pages of 256 bytes. Each page holds an
  ordered list of device handlers; a page may hold zero, one, or several.
- Reads combine the bytes returned by every handler on the page through the
  bus aggregation function (bitwise OR by default), modeling several devices
  driving the same data lines at once.
- Writes are dispatched to every handler on the page. A handler answers a
  write with the byte it actually drives; when that byte diverges from the
  written value the bus logs a non-fatal conflict and keeps going. The
  written value stays authoritative.

Modules and responsibilities
- device: the `BusDevice` contract plus the `Null` no-device handler.
- ram: byte RAM with modulo mirroring (automatic for power-of-two sizes).
- rom: read-only storage; writes answer with the stored byte. Also provides
  bounded bank views used by mappers for PRG/CHR bank switching.
- slice: a bounded window over another shared handler, for bank-switching
  writable devices such as CHR RAM.

The `Bus` itself is a cheap-to-clone handle; the CPU, the PPU, and every
mapper hold their own handle to the same page table, which is what lets a
mapper re-map pages from inside one of its own write handlers.
*/

pub mod device;
pub mod ram;
pub mod rom;
pub mod slice;


pub use device::{BusDevice, Null, SharedDevice, share};
pub use ram::Ram;
pub use rom::Rom;
pub use slice::Slice;

use std::cell::RefCell;
use std::rc::Rc;

/// Number of pages in the 16-bit address space.
pub const PAGE_COUNT: usize = 256;

/// Read-aggregation function combining bytes from co-mapped handlers.
pub type Aggregate = fn(u8, u8) -> u8;

fn or_aggregate(acc: u8, v: u8) -> u8 {
    acc | v
}

struct PageTable {
    pages: [Vec<SharedDevice>; PAGE_COUNT],
    aggregate: Aggregate,
}

/// Shared handle to a page-granular bus.
///
/// Cloning yields another handle to the same page table. All methods take
/// `&self`; the page list for the touched page is snapshotted before any
/// handler runs, so a handler may call back into `map`/`unmap` (bank
/// switching does exactly that) without invalidating the dispatch in flight.
#[derive(Clone)]
pub struct Bus {
    inner: Rc<RefCell<PageTable>>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    /// Create an empty bus with the default OR aggregation.
    pub fn new() -> Self {
        Self::with_aggregate(or_aggregate)
    }

    /// Create an empty bus with a custom read-aggregation function.
    pub fn with_aggregate(aggregate: Aggregate) -> Self {
        Bus {
            inner: Rc::new(RefCell::new(PageTable {
                pages: std::array::from_fn(|_| Vec::new()),
                aggregate,
            })),
        }
    }

    /// Append `device` to every page covered by `[offset, offset + length)`.
    ///
    /// `length` is in bytes and may be up to 0x10000 to cover the whole
    /// space. Handlers keep receiving the full bus address; each device
    /// applies its own masking.
    pub fn map(&self, offset: u16, length: u32, device: SharedDevice) {
        let first = (offset >> 8) as usize;
        let last = page_after(offset, length);
        let mut table = self.inner.borrow_mut();
        for page in first..last {
            table.pages[page].push(device.clone());
        }
    }

    /// Remove every handler from the pages covered by `[offset, offset + length)`.
    ///
    /// Used when a mapping is reconfigured at runtime, e.g. a mirroring
    /// change replacing the nametable router.
    pub fn unmap(&self, offset: u16, length: u32) {
        let first = (offset >> 8) as usize;
        let last = page_after(offset, length);
        let mut table = self.inner.borrow_mut();
        for page in first..last {
            table.pages[page].clear();
        }
    }

    /// Read one byte, OR-combining (or custom-combining) every handler on
    /// the page. An unmapped page reads as 0.
    pub fn read(&self, addr: u16) -> u8 {
        let (handlers, aggregate) = self.snapshot_page(addr);
        let mut acc = 0u8;
        for h in &handlers {
            acc = aggregate(acc, h.borrow_mut().read(addr));
        }
        acc
    }

    /// Write one byte to every handler on the page.
    ///
    /// A handler whose driven byte differs from `value` is reported as a bus
    /// conflict. Conflicts are logged, never resolved; the written value is
    /// what the initiating device put on the lines.
    pub fn write(&self, addr: u16, value: u8) {
        let (handlers, _) = self.snapshot_page(addr);
        for h in &handlers {
            let driven = h.borrow_mut().write(addr, value);
            if driven != value && driven != 0 {
                log::warn!(
                    "bus conflict at ${:04X}: wrote ${:02X}, {} drove ${:02X}",
                    addr,
                    value,
                    h.borrow().label(),
                    driven
                );
            }
        }
    }

    /// Read a little-endian 16-bit word at `addr`.
    pub fn read_word(&self, addr: u16) -> u16 {
        let lo = self.read(addr) as u16;
        let hi = self.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Number of handlers currently mapped on the page containing `addr`.
    pub fn handlers_at(&self, addr: u16) -> usize {
        self.inner.borrow().pages[(addr >> 8) as usize].len()
    }

    fn snapshot_page(&self, addr: u16) -> (Vec<SharedDevice>, Aggregate) {
        let table = self.inner.borrow();
        (table.pages[(addr >> 8) as usize].clone(), table.aggregate)
    }
}

/// First page index past the range `[offset, offset + length)`.
#[inline]
fn page_after(offset: u16, length: u32) -> usize {
    let end = (offset as u32).saturating_add(length).min(0x1_0000);
    (end.div_ceil(0x100)) as usize
}
