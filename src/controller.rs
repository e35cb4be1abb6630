/*!
Standard joypad: strobe latch plus 8-bit serial shift, read through
$4016/$4017.

While the strobe is high every read re-latches the live buttons and
returns the A state. Dropping the strobe freezes the latch; successive
reads then shift out A, B, Select, Start, Up, Down, Left, Right, and a
ninth read onward returns 1, which is what official pads drive.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    A,
    B,
    Select,
    Start,
    Up,
    Down,
    Left,
    Right,
}

impl Button {
    #[inline]
    fn mask(self) -> u8 {
        1 << (self as u8)
    }
}

#[derive(Debug, Default, Clone)]
pub struct Controller {
    buttons: u8,
    latched: u8,
    strobe: bool,
    index: u8,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.buttons |= button.mask();
        } else {
            self.buttons &= !button.mask();
        }
    }

    /// Bit 0 of a $4016 write. Raising the strobe latches immediately.
    pub fn write_strobe(&mut self, value: u8) {
        self.strobe = value & 1 != 0;
        if self.strobe {
            self.latch();
        }
    }

    /// One serial read. Only bit 0 is driven.
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            self.latch();
            return self.latched & 1;
        }
        if self.index >= 8 {
            return 1;
        }
        let bit = (self.latched >> self.index) & 1;
        self.index += 1;
        bit
    }

    #[inline]
    fn latch(&mut self) {
        self.latched = self.buttons;
        self.index = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_the_latched_buttons_in_read_order() {
        let mut pad = Controller::new();
        pad.set_button(Button::A, true);
        pad.set_button(Button::Start, true);
        pad.set_button(Button::Left, true);
        pad.write_strobe(1);
        pad.write_strobe(0);

        let bits: Vec<u8> = (0..8).map(|_| pad.read()).collect();
        assert_eq!(bits, [1, 0, 0, 1, 0, 0, 1, 0]);
    }

    #[test]
    fn exhausted_shift_register_reads_one() {
        let mut pad = Controller::new();
        pad.write_strobe(1);
        pad.write_strobe(0);
        for _ in 0..8 {
            pad.read();
        }
        assert_eq!(pad.read(), 1);
        assert_eq!(pad.read(), 1);
    }

    #[test]
    fn high_strobe_tracks_the_live_a_button() {
        let mut pad = Controller::new();
        pad.write_strobe(1);
        assert_eq!(pad.read(), 0);
        pad.set_button(Button::A, true);
        assert_eq!(pad.read(), 1);
        pad.set_button(Button::A, false);
        assert_eq!(pad.read(), 0);
    }

    #[test]
    fn dropping_the_strobe_freezes_the_latch() {
        let mut pad = Controller::new();
        pad.set_button(Button::B, true);
        pad.write_strobe(1);
        pad.write_strobe(0);
        pad.set_button(Button::B, false); // too late, already latched
        assert_eq!(pad.read(), 0); // A
        assert_eq!(pad.read(), 1); // B from the latch
    }
}
