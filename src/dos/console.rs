//! Direct console input, the DL=0xFF arm of int21 function 0x06.

use crate::keyboard::Keyboard;

#[cfg(test)]
#[path = "./console_test.rs"]
mod console_test;

/// state carried between direct console input calls. extended keys
/// (ascii 0) are reported over two calls: first the zero ascii code,
/// then the scancode kept pending here
#[derive(Clone, Copy)]
pub struct Console {
    pending_scan: u8,
}

impl Console {
    pub fn default() -> Self {
        Console { pending_scan: 0 }
    }

    /// non-blocking read for direct console input.
    /// returns (AL, zero flag); zero flag set means no data available
    pub fn direct_input(&mut self, keyboard: &mut Keyboard) -> (u8, bool) {
        if self.pending_scan != 0 {
            // a previous call returned ascii 0, hand over the scancode
            let scan = self.pending_scan;
            self.pending_scan = 0;
            return (scan, false);
        }
        match keyboard.consume() {
            Some(event) => {
                // keep the scancode only for extended keys
                self.pending_scan = if event.ascii == 0 { event.scancode } else { 0 };
                (event.ascii, false)
            }
            None => {
                self.pending_scan = 0;
                (0, true)
            }
        }
    }
}
