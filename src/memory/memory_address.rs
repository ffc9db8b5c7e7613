use std::fmt;

/// how the guest addresses memory for the duration of one int21 call
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ExecutionMode {
    /// 16-bit real mode, linear = segment * 16 + offset
    Real,

    /// 16-bit protected mode, the segment value is a selector into
    /// the descriptor table
    Protected16,
}

/// represents a real mode memory address inside the vm
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemoryAddress {
    /// a real mode segment:offset pair (0x0_0000 - 0x10_FFEF)
    RealSegmentOffset(u16, u32),

    /// a unknown value
    Unset,
}

impl fmt::Display for MemoryAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MemoryAddress::RealSegmentOffset(seg, off) => write!(f, "{:04X}:{:04X}", seg, off),
            MemoryAddress::Unset => write!(f, "(unset)"),
        }
    }
}

impl MemoryAddress {
    pub fn default_real() -> MemoryAddress {
        MemoryAddress::RealSegmentOffset(0, 0)
    }

    /// translates a segment:offset pair to a physical (flat) address
    pub fn value(self) -> u32 {
        match self {
            MemoryAddress::RealSegmentOffset(seg, off) => ((u32::from(seg)) << 4).wrapping_add(off),
            MemoryAddress::Unset => unreachable!(),
        }
    }

    pub fn segment(self) -> u16 {
        match self {
            MemoryAddress::RealSegmentOffset(seg, _) => seg,
            MemoryAddress::Unset => 0,
        }
    }

    pub fn offset(self) -> u32 {
        match self {
            MemoryAddress::RealSegmentOffset(_, off) => off,
            MemoryAddress::Unset => 0,
        }
    }

    /// increase offset by 1
    pub fn inc_u8(&mut self) {
        self.inc_n(1);
    }

    /// increase offset by 2
    pub fn inc_u16(&mut self) {
        self.inc_n(2);
    }

    /// increase offset by 4
    pub fn inc_u32(&mut self) {
        self.inc_n(4);
    }

    /// increase offset by n
    pub fn inc_n(&mut self, n: u16) {
        match *self {
            MemoryAddress::RealSegmentOffset(_, ref mut off) => *off += u32::from(n),
            MemoryAddress::Unset => unreachable!(),
        }
    }
}
