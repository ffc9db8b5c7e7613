use std::fmt;

use crate::cpu::Flags;

#[cfg(test)]
#[path = "./register_test.rs"]
mod register_test;

/// a named register with 8, 16 and 32-bit views
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum R {
    AL, CL, DL, BL, AH, CH, DH, BH,
    AX, CX, DX, BX, SP, BP, SI, DI,
    ES, CS, SS, DS, FS, GS,
    EAX, ECX, EDX, EBX, ESP, EBP, ESI, EDI,
}

impl fmt::Display for R {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl R {
    pub fn as_str(self) -> &'static str {
        match self {
            R::AL => "al", R::CL => "cl", R::DL => "dl", R::BL => "bl",
            R::AH => "ah", R::CH => "ch", R::DH => "dh", R::BH => "bh",
            R::AX => "ax", R::CX => "cx", R::DX => "dx", R::BX => "bx",
            R::SP => "sp", R::BP => "bp", R::SI => "si", R::DI => "di",
            R::ES => "es", R::CS => "cs", R::SS => "ss", R::DS => "ds",
            R::FS => "fs", R::GS => "gs",
            R::EAX => "eax", R::ECX => "ecx", R::EDX => "edx", R::EBX => "ebx",
            R::ESP => "esp", R::EBP => "ebp", R::ESI => "esi", R::EDI => "edi",
        }
    }

    /// index into the general purpose register bank
    fn gpr_index(self) -> usize {
        match self {
            R::AL | R::AH | R::AX | R::EAX => 0,
            R::CL | R::CH | R::CX | R::ECX => 1,
            R::DL | R::DH | R::DX | R::EDX => 2,
            R::BL | R::BH | R::BX | R::EBX => 3,
            R::SP | R::ESP => 4,
            R::BP | R::EBP => 5,
            R::SI | R::ESI => 6,
            R::DI | R::EDI => 7,
            _ => panic!("not a gpr: {:?}", self),
        }
    }

    /// index into the segment register bank
    fn sreg_index(self) -> usize {
        match self {
            R::ES => 0,
            R::CS => 1,
            R::SS => 2,
            R::DS => 3,
            R::FS => 4,
            R::GS => 5,
            _ => panic!("not a segment register: {:?}", self),
        }
    }

    fn is_sreg(self) -> bool {
        match self {
            R::ES | R::CS | R::SS | R::DS | R::FS | R::GS => true,
            _ => false,
        }
    }

    fn is_hi8(self) -> bool {
        match self {
            R::AH | R::CH | R::DH | R::BH => true,
            _ => false,
        }
    }
}

/// the guest cpu state as captured at the moment of a software interrupt,
/// mutated in place by the int21 handlers to convey results
#[derive(Copy, Clone, Default)]
pub struct RegisterState {
    gpr: [u32; 8],
    sreg: [u16; 6],
    pub eip: u32,
    pub flags: Flags,
}

impl RegisterState {
    pub fn get_r8(&self, r: R) -> u8 {
        let val = self.gpr[r.gpr_index()];
        if r.is_hi8() {
            (val >> 8) as u8
        } else {
            val as u8
        }
    }

    pub fn set_r8(&mut self, r: R, val: u8) {
        let old = self.gpr[r.gpr_index()];
        self.gpr[r.gpr_index()] = if r.is_hi8() {
            (old & 0xFFFF_00FF) | (u32::from(val) << 8)
        } else {
            (old & 0xFFFF_FF00) | u32::from(val)
        };
    }

    pub fn get_r16(&self, r: R) -> u16 {
        if r.is_sreg() {
            self.sreg[r.sreg_index()]
        } else {
            self.gpr[r.gpr_index()] as u16
        }
    }

    pub fn set_r16(&mut self, r: R, val: u16) {
        if r.is_sreg() {
            self.sreg[r.sreg_index()] = val;
        } else {
            let old = self.gpr[r.gpr_index()];
            self.gpr[r.gpr_index()] = (old & 0xFFFF_0000) | u32::from(val);
        }
    }

    pub fn get_r32(&self, r: R) -> u32 {
        self.gpr[r.gpr_index()]
    }

    pub fn set_r32(&mut self, r: R, val: u32) {
        self.gpr[r.gpr_index()] = val;
    }
}
