//! The DOS data heap: a packed block of locale tables and misc flags
//! placed in upper memory, read directly by guest machine code.
//!
//! Every offset below is part of the binary contract. Programs capture
//! pointers into this block (via int21 functions 0x34, 0x63 and 0x65)
//! and index it with hard-coded displacements, so the layout must never
//! shift.

use crate::dos::memalloc::{AllocError, ParagraphAllocator};
use crate::memory::{ExecutionMode, MemoryAddress, MMU};

#[cfg(test)]
#[path = "./heap_test.rs"]
mod heap_test;

/// characters which terminate a filename
const FILENAME_TERMINATORS: &[u8] = b"\"\\./[]:|<>+=;,";

/// uppercase equivalents of chars 0x80-0xFF: size word + 128 entries
pub const UPPERCASE_SIZE: u32 = 0;
pub const UPPERCASE_TABLE: u32 = 2;
/// lowercase equivalents of chars 0x00-0xFF: size word + 256 entries
pub const LOWERCASE_SIZE: u32 = 130;
pub const LOWERCASE_TABLE: u32 = 132;
/// sort weights for chars 0x00-0xFF: size word + 256 entries
pub const COLLATING_SIZE: u32 = 388;
pub const COLLATING_TABLE: u32 = 390;
/// filename character rules: size word + 8 rule bytes + terminator list
pub const FILENAME_SIZE: u32 = 646;
pub const FILENAME_ILLEGAL_TABLE: u32 = 656;
/// DBCS lead byte ranges: count word + 16 range bytes
pub const DBCS_SIZE: u32 = 672;
pub const DBCS_TABLE: u32 = 674;
/// interrupt 21 nesting flag, maintained by the surrounding emulation layer
pub const MISC_INDOS: u32 = 690;

/// total size of the heap block in bytes
pub const HEAP_SIZE: u32 = 691;

/// handle to the lazily built heap block. created once per emulated
/// session, never freed or resized; both address forms point at the
/// same storage
#[derive(Clone, Copy)]
pub struct DosHeap {
    segment: u16,
    selector: u16,
}

impl DosHeap {
    /// allocates the block in upper memory, fills it, and maps a
    /// protected mode selector over it
    pub fn create(umb: &mut ParagraphAllocator, mmu: &mut MMU) -> Result<DosHeap, AllocError> {
        let paragraphs = ((HEAP_SIZE + 15) / 16) as u16;
        let segment = umb.allocate(paragraphs)?;
        fill_heap(mmu, segment);
        let base = MemoryAddress::RealSegmentOffset(segment, 0).value();
        let selector = mmu.descriptors.allocate(base, HEAP_SIZE - 1);
        Ok(DosHeap { segment, selector })
    }

    /// the stable guest-visible handle, segment or selector depending
    /// on addressing mode
    pub fn handle(&self, mode: ExecutionMode) -> u16 {
        match mode {
            ExecutionMode::Real => self.segment,
            ExecutionMode::Protected16 => self.selector,
        }
    }
}

fn fill_heap(mmu: &mut MMU, segment: u16) {
    let mut addr = MemoryAddress::RealSegmentOffset(segment, 0);

    // uppercase table. chars 0x80-0xFF carry no case in the OEM
    // single-byte locale exposed here, so they map to themselves
    mmu.write_u16_inc(&mut addr, 128);
    for i in 0..128u16 {
        mmu.write_u8_inc(&mut addr, (128 + i) as u8);
    }

    // lowercase table
    mmu.write_u16_inc(&mut addr, 256);
    for i in 0..=255u8 {
        mmu.write_u8_inc(&mut addr, i.to_ascii_lowercase());
    }

    // collating table, sort order = byte value
    mmu.write_u16_inc(&mut addr, 256);
    for i in 0..=255u8 {
        mmu.write_u8_inc(&mut addr, i);
    }

    // filename rules, as reported by MS-DOS 3.30-6.00
    mmu.write_u16_inc(&mut addr, 8 + FILENAME_TERMINATORS.len() as u16);
    mmu.write_u8_inc(&mut addr, 0x01); // reserved
    mmu.write_u8_inc(&mut addr, 0x00); // lowest permissible char
    mmu.write_u8_inc(&mut addr, 0xFF); // highest permissible char
    mmu.write_u8_inc(&mut addr, 0x00); // reserved
    mmu.write_u8_inc(&mut addr, 0x00); // excluded range, first
    mmu.write_u8_inc(&mut addr, 0x00); // excluded range, last
    mmu.write_u8_inc(&mut addr, 0x02); // reserved
    mmu.write_u8_inc(&mut addr, FILENAME_TERMINATORS.len() as u8);
    for i in 0..16 {
        let b = *FILENAME_TERMINATORS.get(i).unwrap_or(&0);
        mmu.write_u8_inc(&mut addr, b);
    }

    // DBCS lead byte table: no ranges
    mmu.write_u16_inc(&mut addr, 0);
    for _ in 0..16 {
        mmu.write_u8_inc(&mut addr, 0);
    }

    // InDos flag
    mmu.write_u8_inc(&mut addr, 0);
}
