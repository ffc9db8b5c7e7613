//! Paragraph-granularity guest memory allocation, int21 functions
//! 0x48 and 0x49.

use crate::memory::{DescriptorTable, ExecutionMode, MemoryAddress};

#[cfg(test)]
#[path = "./memalloc_test.rs"]
mod memalloc_test;

const DEBUG_ALLOC: bool = false;

quick_error! {
    #[derive(Debug, PartialEq)]
    pub enum AllocError {
        /// not enough room; reports the free paragraphs still available
        InsufficientMemory(available: u16) {
            display("insufficient memory, {} paragraphs available", available)
        }
        /// the handle names no live allocation
        InvalidHandle {
            display("invalid memory block handle")
        }
    }
}

#[derive(Clone, Copy)]
struct Block {
    segment: u16,
    paragraphs: u16,
    used: bool,
}

/// first-fit allocator handing out guest memory in 16-byte paragraphs
#[derive(Clone)]
pub struct ParagraphAllocator {
    blocks: Vec<Block>,
}

impl ParagraphAllocator {
    pub fn new(first_segment: u16, paragraphs: u16) -> Self {
        ParagraphAllocator {
            blocks: vec![Block {
                segment: first_segment,
                paragraphs,
                used: false,
            }],
        }
    }

    /// allocates a block, returns its segment
    pub fn allocate(&mut self, paragraphs: u16) -> Result<u16, AllocError> {
        let wanted = paragraphs.max(1); // zero-length requests still occupy a paragraph
        for i in 0..self.blocks.len() {
            if !self.blocks[i].used && self.blocks[i].paragraphs >= wanted {
                let spare = self.blocks[i].paragraphs - wanted;
                self.blocks[i].paragraphs = wanted;
                self.blocks[i].used = true;
                let segment = self.blocks[i].segment;
                if spare > 0 {
                    self.blocks.insert(i + 1, Block {
                        segment: segment + wanted,
                        paragraphs: spare,
                        used: false,
                    });
                }
                if DEBUG_ALLOC {
                    println!("alloc: {} paragraphs at {:04X}", wanted, segment);
                }
                return Ok(segment);
            }
        }
        Err(AllocError::InsufficientMemory(self.available()))
    }

    pub fn free(&mut self, segment: u16) -> Result<(), AllocError> {
        for block in &mut self.blocks {
            if block.used && block.segment == segment {
                block.used = false;
                if DEBUG_ALLOC {
                    println!("alloc: freed block at {:04X}", segment);
                }
                self.coalesce();
                return Ok(());
            }
        }
        Err(AllocError::InvalidHandle)
    }

    /// total free space, in paragraphs
    pub fn available(&self) -> u16 {
        self.blocks.iter().filter(|b| !b.used).map(|b| b.paragraphs).sum()
    }

    fn coalesce(&mut self) {
        let mut i = 0;
        while i + 1 < self.blocks.len() {
            if !self.blocks[i].used && !self.blocks[i + 1].used {
                self.blocks[i].paragraphs += self.blocks[i + 1].paragraphs;
                self.blocks.remove(i + 1);
            } else {
                i += 1;
            }
        }
    }
}

/// the two allocation personalities behind int21 memory services:
/// real mode hands out conventional memory segments, 16-bit protected
/// mode hands out selectors backed by the same arena. the upper memory
/// arena holds DOS-internal data visible to the guest, like the int21
/// heap block
#[derive(Clone)]
pub struct DosMemory {
    pub conventional: ParagraphAllocator,
    pub umb: ParagraphAllocator,

    /// selector -> backing segment, for handles given to protected mode guests
    selectors: Vec<(u16, u16)>,
}

impl DosMemory {
    /// first segment of the conventional memory arena
    pub const CONVENTIONAL_BASE: u16 = 0x0800;
    /// size of the conventional memory arena, in paragraphs (up to 0x9FFF:0)
    pub const CONVENTIONAL_PARAGRAPHS: u16 = 0x9800;
    /// first segment of the upper memory block arena
    pub const UMB_BASE: u16 = 0xC800;
    /// size of the upper memory arena, in paragraphs
    pub const UMB_PARAGRAPHS: u16 = 0x2000;

    pub fn default() -> Self {
        DosMemory {
            conventional: ParagraphAllocator::new(Self::CONVENTIONAL_BASE, Self::CONVENTIONAL_PARAGRAPHS),
            umb: ParagraphAllocator::new(Self::UMB_BASE, Self::UMB_PARAGRAPHS),
            selectors: Vec::new(),
        }
    }

    /// allocates `paragraphs` for the guest. the returned handle is a
    /// segment in real mode and a selector in 16-bit protected mode
    pub fn allocate(&mut self, paragraphs: u16, mode: ExecutionMode, descriptors: &mut DescriptorTable) -> Result<u16, AllocError> {
        let segment = self.conventional.allocate(paragraphs)?;
        match mode {
            ExecutionMode::Real => Ok(segment),
            ExecutionMode::Protected16 => {
                let base = MemoryAddress::RealSegmentOffset(segment, 0).value();
                let limit = u32::from(paragraphs.max(1)) * 16 - 1;
                let selector = descriptors.allocate(base, limit);
                self.selectors.push((selector, segment));
                Ok(selector)
            }
        }
    }

    pub fn free(&mut self, handle: u16, mode: ExecutionMode, descriptors: &mut DescriptorTable) -> Result<(), AllocError> {
        match mode {
            ExecutionMode::Real => self.conventional.free(handle),
            ExecutionMode::Protected16 => {
                let pos = self.selectors.iter().position(|&(sel, _)| sel == handle);
                match pos {
                    Some(pos) => {
                        let (selector, segment) = self.selectors.remove(pos);
                        self.conventional.free(segment)?;
                        descriptors.free(selector).map_err(|_| AllocError::InvalidHandle)?;
                        Ok(())
                    }
                    None => Err(AllocError::InvalidHandle),
                }
            }
        }
    }

    /// free paragraphs in the conventional arena
    pub fn available(&self) -> u16 {
        self.conventional.available()
    }
}
