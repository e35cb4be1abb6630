/*!
Frame output: double-buffered RGBA frames with an explicit handoff.

The PPU paints into a back buffer it owns exclusively; at VBlank start the
back and front buffers swap under the front-buffer lock. A renderer on
another thread holds a [`FrameHandle`] and only ever sees completed frames,
never a partially painted one.
*/

use std::sync::{Arc, Mutex};

/// Screen width in pixels.
pub const WIDTH: usize = 256;
/// Screen height in pixels.
pub const HEIGHT: usize = 240;
/// RGBA bytes per pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// One RGBA frame.
pub struct Frame {
    pixels: Box<[u8]>,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    pub fn new() -> Self {
        Frame {
            pixels: vec![0; WIDTH * HEIGHT * BYTES_PER_PIXEL].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        let at = (y * WIDTH + x) * BYTES_PER_PIXEL;
        self.pixels[at] = rgb[0];
        self.pixels[at + 1] = rgb[1];
        self.pixels[at + 2] = rgb[2];
        self.pixels[at + 3] = 0xFF;
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let at = (y * WIDTH + x) * BYTES_PER_PIXEL;
        [
            self.pixels[at],
            self.pixels[at + 1],
            self.pixels[at + 2],
            self.pixels[at + 3],
        ]
    }

    /// Raw RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Dump the frame as a PNG file.
    #[cfg(feature = "screenshot")]
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> image::ImageResult<()> {
        image::save_buffer(
            path,
            &self.pixels,
            WIDTH as u32,
            HEIGHT as u32,
            image::ExtendedColorType::Rgba8,
        )
    }
}

/// The PPU-side pair: exclusive back buffer plus the shared front buffer.
pub struct FrameBuffers {
    back: Frame,
    front: Arc<Mutex<Frame>>,
}

impl Default for FrameBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffers {
    pub fn new() -> Self {
        FrameBuffers {
            back: Frame::new(),
            front: Arc::new(Mutex::new(Frame::new())),
        }
    }

    #[inline]
    pub fn back_mut(&mut self) -> &mut Frame {
        &mut self.back
    }

    /// Publish the back buffer. The old front buffer becomes the new canvas;
    /// its stale contents are fully repainted over the next frame.
    pub fn swap(&mut self) {
        if let Ok(mut front) = self.front.lock() {
            std::mem::swap(&mut self.back, &mut *front);
        }
    }

    pub fn handle(&self) -> FrameHandle {
        FrameHandle {
            front: self.front.clone(),
        }
    }
}

/// Cloneable reader-side handle to the most recently completed frame.
#[derive(Clone)]
pub struct FrameHandle {
    front: Arc<Mutex<Frame>>,
}

impl FrameHandle {
    /// Run `f` against the current front buffer under the lock. Returns
    /// `None` only if a panicking reader poisoned the lock.
    pub fn with_frame<R>(&self, f: impl FnOnce(&Frame) -> R) -> Option<R> {
        self.front.lock().ok().map(|frame| f(&frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_publishes_the_painted_buffer() {
        let mut buffers = FrameBuffers::new();
        let handle = buffers.handle();

        buffers.back_mut().put_pixel(3, 7, [1, 2, 3]);
        let before = handle.with_frame(|f| f.pixel(3, 7)).unwrap();
        assert_eq!(before, [0, 0, 0, 0], "unpublished paint is invisible");

        buffers.swap();
        let after = handle.with_frame(|f| f.pixel(3, 7)).unwrap();
        assert_eq!(after, [1, 2, 3, 0xFF]);
    }
}
