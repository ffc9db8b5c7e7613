#![allow(dead_code)]
#![allow(clippy::single_match)]
#![allow(clippy::verbose_bit_mask)]
#![allow(clippy::cognitive_complexity)]

#[macro_use]
extern crate quick_error;

#[cfg(test)]
extern crate pretty_assertions;

pub mod cpu;
pub mod dos;
pub mod keyboard;
pub mod machine;
pub mod memory;
