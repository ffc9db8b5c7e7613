use std::collections::HashMap;

use crate::cpu::{RegisterState, R};
use crate::machine::Component;
use crate::memory::MMU;

#[cfg(test)]
#[path = "./ioctl_test.rs"]
mod ioctl_test;

const DEBUG_IOCTL: bool = false;

/// device name the expanded memory driver registers under
pub const EMS_DEVICE_NAME: &str = "EMMXXXX0";

/// process-wide sharing-retry configuration (int 21, ax = 440B)
#[derive(Clone, Copy)]
pub struct SharingRetry {
    pub count: u16,
    pub pause: u16,
}

impl SharingRetry {
    pub fn default() -> Self {
        // DOS defaults to 3 retries with a pause of 1 between them
        SharingRetry { count: 3, pause: 1 }
    }
}

/// ioctl sub-dispatcher (ah = 0x44). the handle in BX is resolved to a
/// device identity first: calls aimed at the EMS driver are forwarded
/// to it wholesale. everything else dispatches on the subfunction in AL,
/// with unhandled subfunctions forwarded to the generic handler
pub fn dispatch(
    regs: &mut RegisterState,
    mmu: &mut MMU,
    devices: &HashMap<u16, String>,
    sharing: &mut SharingRetry,
    ems: &mut Option<Box<dyn Component>>,
    fallback: &mut Option<Box<dyn Component>>,
) {
    let handle = regs.get_r16(R::BX);
    if devices.get(&handle).map(String::as_str) == Some(EMS_DEVICE_NAME) {
        match ems {
            Some(driver) => {
                driver.int(0x21, regs, mmu);
            }
            None => {
                println!("int21: no EMS driver for handle {:04X}", handle);
                regs.flags.carry = true;
            }
        }
        return;
    }

    match regs.get_r8(R::AL) {
        0x0B => {
            // set sharing retry count: CX = retries, DX = pause.
            // a zero retry count is rejected without touching state
            let count = regs.get_r16(R::CX);
            if count == 0 {
                regs.set_r16(R::AX, 0x0001);
                regs.flags.carry = true;
                return;
            }
            sharing.count = count;
            sharing.pause = regs.get_r16(R::DX);
            if DEBUG_IOCTL {
                println!(
                    "ioctl: sharing retry count {}, pause {}",
                    sharing.count, sharing.pause
                );
            }
        }
        _ => {
            if let Some(handler) = fallback {
                handler.int(0x21, regs, mmu);
            }
        }
    }
}
