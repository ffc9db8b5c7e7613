#[cfg(test)]
#[path = "./flag_test.rs"]
mod flag_test;

// https://en.wikipedia.org/wiki/FLAGS_register
#[derive(Copy, Clone, Default)]
pub struct Flags {
    pub carry: bool,        // 0: carry flag, the int21 success/failure signal
    pub parity: bool,       // 2: parity flag
    pub auxiliary_carry: bool, // 4: auxiliary carry flag (AF)
    pub zero: bool,         // 6: zero flag
    pub sign: bool,         // 7: sign flag
    pub trap: bool,         // 8: trap flag (single step)
    pub interrupt: bool,    // 9: interrupt flag
    pub direction: bool,    // 10: direction flag
    pub overflow: bool,     // 11: overflow flag
    pub virtual_mode: bool, // 17: virtual-8086 mode (EFLAGS only)
}

const FLAG_CF: u32 = 0x0000_0001;
const FLAG_PF: u32 = 0x0000_0004;
const FLAG_AF: u32 = 0x0000_0010;
const FLAG_ZF: u32 = 0x0000_0040;
const FLAG_SF: u32 = 0x0000_0080;
const FLAG_TF: u32 = 0x0000_0100;
const FLAG_IF: u32 = 0x0000_0200;
const FLAG_DF: u32 = 0x0000_0400;
const FLAG_OF: u32 = 0x0000_0800;
const FLAG_VM: u32 = 0x0002_0000;

impl Flags {
    pub fn u16(self) -> u16 {
        self.u32() as u16
    }

    pub fn u32(self) -> u32 {
        let mut val = 0;
        if self.carry {
            val |= FLAG_CF;
        }
        if self.parity {
            val |= FLAG_PF;
        }
        if self.auxiliary_carry {
            val |= FLAG_AF;
        }
        if self.zero {
            val |= FLAG_ZF;
        }
        if self.sign {
            val |= FLAG_SF;
        }
        if self.trap {
            val |= FLAG_TF;
        }
        if self.interrupt {
            val |= FLAG_IF;
        }
        if self.direction {
            val |= FLAG_DF;
        }
        if self.overflow {
            val |= FLAG_OF;
        }
        if self.virtual_mode {
            val |= FLAG_VM;
        }
        val
    }

    pub fn set_u16(&mut self, val: u16) {
        let vm = self.virtual_mode;
        self.set_u32(u32::from(val));
        self.virtual_mode = vm; // not addressable through the 16-bit view
    }

    pub fn set_u32(&mut self, val: u32) {
        self.carry = val & FLAG_CF != 0;
        self.parity = val & FLAG_PF != 0;
        self.auxiliary_carry = val & FLAG_AF != 0;
        self.zero = val & FLAG_ZF != 0;
        self.sign = val & FLAG_SF != 0;
        self.trap = val & FLAG_TF != 0;
        self.interrupt = val & FLAG_IF != 0;
        self.direction = val & FLAG_DF != 0;
        self.overflow = val & FLAG_OF != 0;
        self.virtual_mode = val & FLAG_VM != 0;
    }
}
