use crate::cpu::RegisterState;
use crate::dos::DosServices;
use crate::memory::MMU;

/// handler for software interrupts, the trap entry point signature.
/// the generic int21 fallback handler and the EMS ioctl driver both
/// plug in through this trait
pub trait Component {
    /// returns true if interrupt was handled
    fn int(&mut self, _int: u8, _regs: &mut RegisterState, _mmu: &mut MMU) -> bool {
        false
    }
}

/// minimal assembly of guest memory, a register snapshot and the DOS
/// service layer, as used by the surrounding emulator and by tests
pub struct Machine {
    pub mmu: MMU,
    pub regs: RegisterState,
    pub dos: DosServices,
}

impl Machine {
    pub fn default() -> Self {
        Machine {
            mmu: MMU::default(),
            regs: RegisterState::default(),
            dos: DosServices::default(),
        }
    }

    /// delivers a software interrupt trap to the DOS service layer
    pub fn int(&mut self, int: u8) -> bool {
        self.dos.int(int, &mut self.regs, &mut self.mmu)
    }
}
