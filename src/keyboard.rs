use std::collections::VecDeque;

#[cfg(test)]
#[path = "./keyboard_test.rs"]
mod keyboard_test;

const DEBUG_KEYBOARD: bool = false;

/// a buffered key, as the BIOS would report it: extended keys
/// (function / arrow keys) carry ascii 0 and a nonzero scancode
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyEvent {
    pub scancode: u8,
    pub ascii: u8,
}

/// FIFO of key events injected by the surrounding emulation layer
#[derive(Clone)]
pub struct Keyboard {
    events: VecDeque<KeyEvent>,
}

impl Keyboard {
    pub fn default() -> Self {
        Keyboard {
            events: VecDeque::new(),
        }
    }

    pub fn has_queued_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn add_keypress(&mut self, scancode: u8, ascii: u8) {
        let event = KeyEvent { scancode, ascii };
        if DEBUG_KEYBOARD {
            println!("keyboard: add_keypress {:?}", event);
        }
        self.events.push_back(event);
    }

    /// non-blocking look at the oldest queued key
    pub fn peek(&self) -> Option<KeyEvent> {
        self.events.front().cloned()
    }

    /// non-blocking read of the oldest queued key
    pub fn consume(&mut self) -> Option<KeyEvent> {
        let event = self.events.pop_front();
        if DEBUG_KEYBOARD {
            println!("keyboard: consume {:?}", event);
        }
        event
    }
}
