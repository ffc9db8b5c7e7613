quick_error! {
    #[derive(Debug, PartialEq)]
    pub enum MemoryError {
        /// the selector names no live descriptor table entry
        InvalidSelector(selector: u16) {
            display("invalid selector {:04X}", selector)
        }
        /// the address range runs past the end of guest memory
        OutOfRange(addr: u32) {
            display("address {:06X} out of range", addr)
        }
    }
}

#[derive(Clone)]
struct Descriptor {
    base: u32,
    limit: u32,
    present: bool,
}

/// a flat emulation of the protected mode descriptor table, mapping
/// selectors to linear base addresses
#[derive(Clone)]
pub struct DescriptorTable {
    descriptors: Vec<Descriptor>,
}

impl DescriptorTable {
    /// selector value of the first descriptor table entry
    pub const FIRST_SELECTOR: u16 = 0x0008;

    pub fn default() -> Self {
        DescriptorTable {
            descriptors: Vec::new(),
        }
    }

    /// creates a descriptor covering `limit` + 1 bytes at `base`,
    /// returns its selector
    pub fn allocate(&mut self, base: u32, limit: u32) -> u16 {
        for (i, desc) in self.descriptors.iter_mut().enumerate() {
            if !desc.present {
                *desc = Descriptor { base, limit, present: true };
                return Self::FIRST_SELECTOR + (i as u16 * 8);
            }
        }
        self.descriptors.push(Descriptor { base, limit, present: true });
        Self::FIRST_SELECTOR + ((self.descriptors.len() as u16 - 1) * 8)
    }

    pub fn free(&mut self, selector: u16) -> Result<(), MemoryError> {
        let index = self.index_of(selector)?;
        self.descriptors[index].present = false;
        Ok(())
    }

    /// linear base address for a selector
    pub fn base(&self, selector: u16) -> Result<u32, MemoryError> {
        Ok(self.descriptors[self.index_of(selector)?].base)
    }

    fn index_of(&self, selector: u16) -> Result<usize, MemoryError> {
        let masked = selector & !0x0007; // strip RPL bits
        if masked < Self::FIRST_SELECTOR {
            return Err(MemoryError::InvalidSelector(selector));
        }
        let index = ((masked - Self::FIRST_SELECTOR) / 8) as usize;
        match self.descriptors.get(index) {
            Some(desc) if desc.present => Ok(index),
            _ => Err(MemoryError::InvalidSelector(selector)),
        }
    }
}
