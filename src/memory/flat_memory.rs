/// total addressable guest memory, 1 MB + 64 kB for the HMA wraparound
pub const MEMORY_SIZE: usize = 0x11_0000;

/// the flat backing store for guest memory
#[derive(Clone)]
pub struct FlatMemory {
    pub data: Vec<u8>,
}

impl FlatMemory {
    pub fn new() -> Self {
        FlatMemory {
            data: vec![0u8; MEMORY_SIZE],
        }
    }

    pub fn read(&self, addr: u32, length: usize) -> &[u8] {
        &self.data[addr as usize..(addr as usize) + length]
    }

    pub fn write(&mut self, addr: u32, data: &[u8]) {
        self.data[addr as usize..(addr as usize) + data.len()].copy_from_slice(data);
    }

    pub fn read_u8(&self, addr: u32) -> u8 {
        self.data[addr as usize]
    }

    pub fn read_u16(&self, addr: u32) -> u16 {
        u16::from(self.read_u8(addr)) | u16::from(self.read_u8(addr + 1)) << 8
    }

    pub fn read_u32(&self, addr: u32) -> u32 {
        u32::from(self.read_u16(addr)) | u32::from(self.read_u16(addr + 2)) << 16
    }

    pub fn write_u8(&mut self, addr: u32, data: u8) {
        self.data[addr as usize] = data;
    }

    pub fn write_u16(&mut self, addr: u32, data: u16) {
        self.write_u8(addr, data as u8);
        self.write_u8(addr + 1, (data >> 8) as u8);
    }

    pub fn write_u32(&mut self, addr: u32, data: u32) {
        self.write_u16(addr, data as u16);
        self.write_u16(addr + 2, (data >> 16) as u16);
    }
}
