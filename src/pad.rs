use std::io::Cursor;

use gbcore_common::{data::{read_u8, write_u8}, error::Error};

use crate::{
    mmu::BusComponent,
    state::{StateComponent, StateFormat},
};

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

pub struct Pad {
    down: bool,
    up: bool,
    left: bool,
    right: bool,
    start: bool,
    select: bool,
    b: bool,
    a: bool,
    selection: PadSelection,

    /// Latched joypad interrupt flag (IF bit 4), raised on the falling
    /// edge of any of the four currently selected input lines.
    int_pad: bool,
}

#[derive(Clone, Copy, PartialEq)]
pub enum PadSelection {
    Action,
    Direction,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "wasm", wasm_bindgen)]
pub enum PadKey {
    Up,
    Down,
    Left,
    Right,
    Start,
    Select,
    A,
    B,
}

impl Pad {
    pub fn new() -> Self {
        Self {
            down: false,
            up: false,
            left: false,
            right: false,
            start: false,
            select: false,
            b: false,
            a: false,
            selection: PadSelection::Action,
            int_pad: false,
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr & 0x00ff {
            0x0000 => {
                let mut value;
                match self.selection {
                    PadSelection::Action => {
                        value = if self.a { 0x00 } else { 0x01 }
                            | if self.b { 0x00 } else { 0x02 }
                            | if self.select { 0x00 } else { 0x04 }
                            | if self.start { 0x00 } else { 0x08 }
                    }
                    PadSelection::Direction => {
                        value = if self.right { 0x00 } else { 0x01 }
                            | if self.left { 0x00 } else { 0x02 }
                            | if self.up { 0x00 } else { 0x04 }
                            | if self.down { 0x00 } else { 0x08 }
                    }
                }
                value |= if self.selection == PadSelection::Direction {
                    0x10
                } else {
                    0x00
                } | if self.selection == PadSelection::Action {
                    0x20
                } else {
                    0x00
                };
                value
            }
            addr => panic!("Reading from unknown Pad location 0x{:04x}", addr),
        }
    }

    pub fn write(&mut self, addr: u16, value: u8) {
        match addr & 0x00ff {
            0x0000 => {
                self.selection = if value & 0x10 == 0x00 {
                    PadSelection::Direction
                } else {
                    PadSelection::Action
                }
            }
            addr => panic!("Writing to unknown Pad location 0x{:04x}", addr),
        }
    }

    pub fn key_press(&mut self, key: PadKey) {
        match key {
            PadKey::Up => self.up = true,
            PadKey::Down => self.down = true,
            PadKey::Left => self.left = true,
            PadKey::Right => self.right = true,
            PadKey::Start => self.start = true,
            PadKey::Select => self.select = true,
            PadKey::A => self.a = true,
            PadKey::B => self.b = true,
        }
        // a high-to-low transition only raises the interrupt when the
        // line belongs to the group currently selected for reading
        let on_selected_line = match key {
            PadKey::Up | PadKey::Down | PadKey::Left | PadKey::Right => {
                self.selection == PadSelection::Direction
            }
            PadKey::Start | PadKey::Select | PadKey::A | PadKey::B => {
                self.selection == PadSelection::Action
            }
        };
        if on_selected_line {
            self.int_pad = true;
        }
    }

    pub fn key_lift(&mut self, key: PadKey) {
        match key {
            PadKey::Up => self.up = false,
            PadKey::Down => self.down = false,
            PadKey::Left => self.left = false,
            PadKey::Right => self.right = false,
            PadKey::Start => self.start = false,
            PadKey::Select => self.select = false,
            PadKey::A => self.a = false,
            PadKey::B => self.b = false,
        }
    }

    pub fn int_pad(&self) -> bool {
        self.int_pad
    }

    pub fn set_int_pad(&mut self, value: bool) {
        self.int_pad = value;
    }

    pub fn ack_pad(&mut self) {
        self.set_int_pad(false);
    }

    /// Returns the set of buttons currently held down, in a stable order.
    /// Used by the TAS recorder to detect frame-to-frame input changes.
    pub fn active_keys(&self) -> Vec<PadKey> {
        let mut keys = vec![];
        if self.up {
            keys.push(PadKey::Up);
        }
        if self.down {
            keys.push(PadKey::Down);
        }
        if self.left {
            keys.push(PadKey::Left);
        }
        if self.right {
            keys.push(PadKey::Right);
        }
        if self.start {
            keys.push(PadKey::Start);
        }
        if self.select {
            keys.push(PadKey::Select);
        }
        if self.a {
            keys.push(PadKey::A);
        }
        if self.b {
            keys.push(PadKey::B);
        }
        keys
    }
}

impl BusComponent for Pad {
    fn read(&self, addr: u16) -> u8 {
        self.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.write(addr, value);
    }
}

impl Default for Pad {
    fn default() -> Self {
        Self::new()
    }
}

impl StateComponent for Pad {
    fn state(&self, _format: Option<StateFormat>) -> Result<Vec<u8>, Error> {
        let mut cursor = Cursor::new(Vec::new());
        let buttons = if self.down { 0x01 } else { 0x00 }
            | if self.up { 0x02 } else { 0x00 }
            | if self.left { 0x04 } else { 0x00 }
            | if self.right { 0x08 } else { 0x00 }
            | if self.start { 0x10 } else { 0x00 }
            | if self.select { 0x20 } else { 0x00 }
            | if self.b { 0x40 } else { 0x00 }
            | if self.a { 0x80 } else { 0x00 };
        write_u8(&mut cursor, buttons)?;
        write_u8(
            &mut cursor,
            match self.selection {
                PadSelection::Action => 0x00,
                PadSelection::Direction => 0x01,
            },
        )?;
        write_u8(&mut cursor, self.int_pad as u8)?;
        Ok(cursor.into_inner())
    }

    fn set_state(&mut self, data: &[u8], _format: Option<StateFormat>) -> Result<(), Error> {
        let mut cursor = Cursor::new(data);
        let buttons = read_u8(&mut cursor)?;
        self.down = buttons & 0x01 != 0;
        self.up = buttons & 0x02 != 0;
        self.left = buttons & 0x04 != 0;
        self.right = buttons & 0x08 != 0;
        self.start = buttons & 0x10 != 0;
        self.select = buttons & 0x20 != 0;
        self.b = buttons & 0x40 != 0;
        self.a = buttons & 0x80 != 0;
        self.selection = match read_u8(&mut cursor)? {
            0x01 => PadSelection::Direction,
            _ => PadSelection::Action,
        };
        self.int_pad = read_u8(&mut cursor)? != 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_press_on_selected_line_raises_interrupt() {
        let mut pad = Pad::new();
        pad.write(0x0000, 0x20); // select the Direction group (P14 low)
        pad.key_press(PadKey::Up);
        assert!(pad.int_pad());
    }

    #[test]
    fn test_key_press_on_unselected_line_does_not_raise_interrupt() {
        let mut pad = Pad::new();
        pad.write(0x0000, 0x10); // select the Action group (P15 low)
        pad.key_press(PadKey::Up);
        assert!(!pad.int_pad());
    }
}
