use crate::memory::{DescriptorTable, ExecutionMode, FlatMemory, MemoryAddress, MemoryError, MEMORY_SIZE};

#[cfg(test)]
#[path = "./mmu_test.rs"]
mod mmu_test;

const DEBUG_MMU: bool = false;
const DEBUG_VEC: bool = false;

#[derive(Clone)]
pub struct MMU {
    pub memory: FlatMemory,

    /// selector mappings for 16-bit protected mode guests
    pub descriptors: DescriptorTable,
}

impl MMU {
    pub fn default() -> Self {
        MMU {
            memory: FlatMemory::new(),
            descriptors: DescriptorTable::default(),
        }
    }

    /// translates a guest segment:offset or selector:offset pair to a
    /// linear address. an unknown selector is an error, never a
    /// dereferencable address
    pub fn resolve(&self, seg: u16, offset: u32, mode: ExecutionMode) -> Result<u32, MemoryError> {
        match mode {
            ExecutionMode::Real => Ok(MemoryAddress::RealSegmentOffset(seg, offset).value()),
            ExecutionMode::Protected16 => Ok(self.descriptors.base(seg)? + offset),
        }
    }

    /// checks that `length` bytes at `addr` stay inside guest memory.
    /// pointers from the guest can aim anywhere, so a range running off
    /// the end must fail the call, not the process
    fn check_range(addr: u32, length: usize) -> Result<u32, MemoryError> {
        if (addr as usize) + length > MEMORY_SIZE {
            return Err(MemoryError::OutOfRange(addr));
        }
        Ok(addr)
    }

    pub fn read_mode(&self, seg: u16, offset: u32, mode: ExecutionMode, length: usize) -> Result<Vec<u8>, MemoryError> {
        let addr = Self::check_range(self.resolve(seg, offset, mode)?, length)?;
        Ok(Vec::from(self.memory.read(addr, length)))
    }

    pub fn write_mode(&mut self, seg: u16, offset: u32, mode: ExecutionMode, data: &[u8]) -> Result<(), MemoryError> {
        let addr = Self::check_range(self.resolve(seg, offset, mode)?, data.len())?;
        self.memory.write(addr, data);
        Ok(())
    }

    pub fn read_u8_mode(&self, seg: u16, offset: u32, mode: ExecutionMode) -> Result<u8, MemoryError> {
        let addr = Self::check_range(self.resolve(seg, offset, mode)?, 1)?;
        Ok(self.memory.read_u8(addr))
    }

    pub fn write_u8_mode(&mut self, seg: u16, offset: u32, mode: ExecutionMode, data: u8) -> Result<(), MemoryError> {
        let addr = Self::check_range(self.resolve(seg, offset, mode)?, 1)?;
        self.memory.write_u8(addr, data);
        Ok(())
    }

    pub fn write_u16_mode(&mut self, seg: u16, offset: u32, mode: ExecutionMode, data: u16) -> Result<(), MemoryError> {
        let addr = Self::check_range(self.resolve(seg, offset, mode)?, 2)?;
        self.memory.write_u16(addr, data);
        Ok(())
    }

    pub fn write_u32_mode(&mut self, seg: u16, offset: u32, mode: ExecutionMode, data: u32) -> Result<(), MemoryError> {
        let addr = Self::check_range(self.resolve(seg, offset, mode)?, 4)?;
        self.memory.write_u32(addr, data);
        Ok(())
    }

    /// reads a sequence of data from real mode memory
    pub fn read(&self, seg: u16, offset: u32, length: usize) -> Vec<u8> {
        let addr = MemoryAddress::RealSegmentOffset(seg, offset).value();
        Vec::from(self.memory.read(addr, length))
    }

    /// writes a sequence of data to real mode memory
    pub fn write(&mut self, seg: u16, offset: u32, data: &[u8]) {
        let addr = MemoryAddress::RealSegmentOffset(seg, offset).value();
        self.memory.write(addr, data);
    }

    pub fn read_u8(&self, seg: u16, offset: u32) -> u8 {
        let addr = MemoryAddress::RealSegmentOffset(seg, offset).value();
        let v = self.memory.read_u8(addr);
        if DEBUG_MMU {
            println!("mmu.read_u8 from ({:04X}:{:04X} == {:06X}) = {:02X}", seg, offset, addr, v);
        }
        v
    }

    pub fn read_u16(&self, seg: u16, offset: u32) -> u16 {
        let addr = MemoryAddress::RealSegmentOffset(seg, offset).value();
        let v = self.memory.read_u16(addr);
        if DEBUG_MMU {
            println!("mmu.read_u16 from ({:04X}:{:04X} == {:06X}) = {:04X}", seg, offset, addr, v);
        }
        v
    }

    pub fn write_u8(&mut self, seg: u16, offset: u32, data: u8) {
        let addr = MemoryAddress::RealSegmentOffset(seg, offset).value();
        if DEBUG_MMU {
            println!("mmu.write_u8 to ({:04X}:{:04X} == {:06X}) = {:02X}", seg, offset, addr, data);
        }
        self.memory.write_u8(addr, data);
    }

    pub fn write_u16(&mut self, seg: u16, offset: u32, data: u16) {
        let addr = MemoryAddress::RealSegmentOffset(seg, offset).value();
        if DEBUG_MMU {
            println!("mmu.write_u16 to ({:04X}:{:04X} == {:06X}) = {:04X}", seg, offset, addr, data);
        }
        self.memory.write_u16(addr, data);
    }

    /// write data and increase addr
    pub fn write_u8_inc(&mut self, addr: &mut MemoryAddress, data: u8) {
        self.memory.write_u8(addr.value(), data);
        addr.inc_u8();
    }

    /// write data and increase addr
    pub fn write_u16_inc(&mut self, addr: &mut MemoryAddress, data: u16) {
        self.memory.write_u16(addr.value(), data);
        addr.inc_u16();
    }

    /// read real mode interrupt vector, returns segment, offset
    pub fn read_vec(&self, v: u8) -> (u16, u16) {
        let v_abs = u32::from(v) << 2;
        let off = self.memory.read_u16(v_abs);
        let seg = self.memory.read_u16(v_abs + 2);
        if DEBUG_VEC {
            println!("mmu.read_vec: {:02X} = {:04X}:{:04X}", v, seg, off);
        }
        (seg, off)
    }

    /// write real mode interrupt vector
    pub fn write_vec(&mut self, v: u8, data: MemoryAddress) {
        let v_abs = u32::from(v) << 2;
        self.memory.write_u16(v_abs, data.offset() as u16);
        self.memory.write_u16(v_abs + 2, data.segment());
        if DEBUG_VEC {
            println!("mmu.write_vec: {:02X} = {:04X}:{:04X}", v, data.segment(), data.offset());
        }
    }
}
