use chrono::{DateTime, Local, TimeZone};
use pretty_assertions::assert_eq;

use crate::cpu::{RegisterState, R};
use crate::dos::error::{ERROR_FILE_NOT_FOUND, ERROR_INVALID_BLOCK, ERROR_NOT_ENOUGH_MEMORY};
use crate::dos::services::{Clock, HostFiles};
use crate::machine::{Component, Machine};
use crate::memory::{MemoryAddress, MMU};

struct FixedClock {
    now: DateTime<Local>,
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.now
    }
}

struct FailingFiles;

impl HostFiles for FailingFiles {
    fn flush(&mut self, _handle: u16) -> Result<(), u16> {
        Err(ERROR_FILE_NOT_FOUND)
    }
    fn duplicate(&mut self, _handle: u16) -> Result<u16, u16> {
        Err(ERROR_FILE_NOT_FOUND)
    }
    fn set_handle_count(&mut self, _count: u16) -> Result<(), u16> {
        Err(ERROR_FILE_NOT_FOUND)
    }
}

struct RecordingHandler;

impl Component for RecordingHandler {
    fn int(&mut self, _int: u8, regs: &mut RegisterState, _mmu: &mut MMU) -> bool {
        regs.set_r16(R::AX, 0xBEEF);
        true
    }
}

fn friday_afternoon() -> Box<FixedClock> {
    Box::new(FixedClock {
        now: Local.ymd(2024, 3, 15).and_hms_milli(13, 30, 5, 120),
    })
}

#[test]
fn get_date_reports_host_clock() {
    let mut machine = Machine::default();
    machine.dos.clock = friday_afternoon();
    machine.regs.set_r8(R::AH, 0x2A);
    machine.int(0x21);

    assert_eq!(2024, machine.regs.get_r16(R::CX));
    assert_eq!(3, machine.regs.get_r8(R::DH));
    assert_eq!(15, machine.regs.get_r8(R::DL));
    assert_eq!(5, machine.regs.get_r8(R::AL)); // friday, 0 = sunday
}

#[test]
fn get_time_reports_host_clock() {
    let mut machine = Machine::default();
    machine.dos.clock = friday_afternoon();
    machine.regs.set_r8(R::AH, 0x2C);
    machine.int(0x21);

    assert_eq!(13, machine.regs.get_r8(R::CH));
    assert_eq!(30, machine.regs.get_r8(R::CL));
    assert_eq!(5, machine.regs.get_r8(R::DH));
    assert_eq!(12, machine.regs.get_r8(R::DL)); // hundredths
}

#[test]
fn set_date_is_discarded() {
    let mut machine = Machine::default();
    machine.dos.clock = friday_afternoon();
    machine.regs.set_r8(R::AH, 0x2B);
    machine.regs.set_r16(R::CX, 1999);
    machine.regs.set_r8(R::DH, 12);
    machine.regs.set_r8(R::DL, 31);
    machine.int(0x21);
    assert_eq!(0, machine.regs.get_r8(R::AL));

    machine.regs.set_r8(R::AH, 0x2A);
    machine.int(0x21);
    assert_eq!(2024, machine.regs.get_r16(R::CX));
}

#[test]
fn version_oem_byte_depends_on_al() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x3000);
    machine.int(0x21);
    assert_eq!(5, machine.regs.get_r8(R::AL));
    assert_eq!(0, machine.regs.get_r8(R::AH));
    assert_eq!(0xFF, machine.regs.get_r8(R::BH));
    assert_eq!(0x12, machine.regs.get_r8(R::BL));
    assert_eq!(0x3456, machine.regs.get_r16(R::CX));

    machine.regs.set_r16(R::AX, 0x3001);
    machine.int(0x21);
    assert_eq!(0x08, machine.regs.get_r8(R::BH));
}

#[test]
fn cpm_leftovers_succeed_with_al_zero() {
    for ah in &[0x18u8, 0x1D, 0x1E, 0x20, 0x61, 0x6B] {
        let mut machine = Machine::default();
        machine.regs.set_r8(R::AH, *ah);
        machine.regs.set_r8(R::AL, 0x55);
        machine.int(0x21);
        assert_eq!(0, machine.regs.get_r8(R::AL));
        assert!(!machine.regs.flags.carry);
    }
}

#[test]
fn unknown_function_sets_carry() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x7200);
    machine.int(0x21);
    assert!(machine.regs.flags.carry);
}

#[test]
fn character_output_lands_in_output_buffer() {
    let mut machine = Machine::default();
    machine.regs.set_r8(R::AH, 0x02);
    machine.regs.set_r8(R::DL, b'h');
    machine.int(0x21);
    machine.regs.set_r8(R::AH, 0x06);
    machine.regs.set_r8(R::DL, b'i');
    machine.int(0x21);

    assert_eq!(b"hi".to_vec(), machine.dos.output);
    assert_eq!(b'i', machine.regs.get_r8(R::AL));
}

#[test]
fn direct_console_input_reads_queued_key() {
    let mut machine = Machine::default();
    machine.dos.keyboard.add_keypress(0x10, b'q');
    machine.regs.set_r8(R::AH, 0x06);
    machine.regs.set_r8(R::DL, 0xFF);
    machine.int(0x21);
    assert_eq!(b'q', machine.regs.get_r8(R::AL));
    assert!(!machine.regs.flags.zero);

    machine.regs.set_r8(R::AH, 0x06);
    machine.regs.set_r8(R::DL, 0xFF);
    machine.int(0x21);
    assert!(machine.regs.flags.zero);
}

#[test]
fn stdin_status_tracks_queue() {
    let mut machine = Machine::default();
    machine.regs.set_r8(R::AH, 0x0B);
    machine.int(0x21);
    assert_eq!(0x00, machine.regs.get_r8(R::AL));

    machine.dos.keyboard.add_keypress(0x10, b'q');
    machine.regs.set_r8(R::AH, 0x0B);
    machine.int(0x21);
    assert_eq!(0xFF, machine.regs.get_r8(R::AL));
}

#[test]
fn flush_and_redispatch_runs_the_inner_function() {
    let mut machine = Machine::default();
    machine.dos.keyboard.add_keypress(0x10, b'q'); // flushed before dispatch
    machine.regs.set_r16(R::AX, 0x0C06);
    machine.regs.set_r8(R::DL, b'A');
    machine.int(0x21);

    assert_eq!(b"A".to_vec(), machine.dos.output);
    assert!(!machine.dos.keyboard.has_queued_events());
}

#[test]
fn flush_with_other_subfunction_only_flushes() {
    let mut machine = Machine::default();
    machine.dos.keyboard.add_keypress(0x10, b'q');
    machine.regs.set_r16(R::AX, 0x0C00);
    machine.int(0x21);

    assert_eq!(0, machine.regs.get_r8(R::AL));
    assert!(!machine.dos.keyboard.has_queued_events());
}

#[test]
fn allocate_and_free_paragraphs() {
    let mut machine = Machine::default();
    machine.regs.set_r8(R::AH, 0x48);
    machine.regs.set_r16(R::BX, 0x10);
    machine.int(0x21);
    assert!(!machine.regs.flags.carry);
    let handle = machine.regs.get_r16(R::AX);
    assert_eq!(0x0800, handle);

    machine.regs.set_r8(R::AH, 0x49);
    machine.regs.set_r16(R::ES, handle);
    machine.int(0x21);
    assert!(!machine.regs.flags.carry);

    // the block is gone, freeing again is an error
    machine.regs.set_r8(R::AH, 0x49);
    machine.regs.set_r16(R::ES, handle);
    machine.int(0x21);
    assert!(machine.regs.flags.carry);
    assert_eq!(ERROR_INVALID_BLOCK, machine.regs.get_r16(R::AX));
}

#[test]
fn failed_allocation_reports_free_paragraphs() {
    let mut machine = Machine::default();
    machine.regs.set_r8(R::AH, 0x48);
    machine.regs.set_r16(R::BX, 0xFFFF);
    machine.int(0x21);

    assert!(machine.regs.flags.carry);
    assert_eq!(ERROR_NOT_ENOUGH_MEMORY, machine.regs.get_r16(R::AX));
    assert_eq!(0x9800, machine.regs.get_r16(R::BX));
}

#[test]
fn protected_mode_allocation_hands_out_selectors() {
    let mut machine = Machine::default();
    machine.dos.config.win16 = true;
    machine.regs.set_r8(R::AH, 0x48);
    machine.regs.set_r16(R::BX, 0x10);
    machine.int(0x21);
    let selector = machine.regs.get_r16(R::AX);
    assert_eq!(0x0008, selector);
    assert_eq!(0x08000, machine.mmu.descriptors.base(selector).unwrap());

    machine.regs.set_r8(R::AH, 0x49);
    machine.regs.set_r16(R::ES, selector);
    machine.int(0x21);
    assert!(!machine.regs.flags.carry);
    assert_eq!(0, machine.regs.get_r16(R::ES)); // dead selector unloaded
}

#[test]
fn bad_selector_faults_as_general_failure() {
    let mut machine = Machine::default();
    machine.dos.config.win16 = true;
    machine.regs.set_r8(R::AH, 0x38);
    machine.regs.set_r16(R::DS, 0xBEEF);
    machine.regs.set_r16(R::DX, 0);
    machine.int(0x21);

    assert!(machine.regs.flags.carry);
    assert_eq!(31, machine.regs.get_r16(R::AX));
}

#[test]
fn country_info_at_top_of_hma_fails_the_call() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x3800);
    machine.regs.set_r16(R::DS, 0xFFFF);
    machine.regs.set_r16(R::DX, 0xFFEF);
    machine.int(0x21);

    // the 34-byte block would run past the end of guest memory
    assert!(machine.regs.flags.carry);
    assert_eq!(31, machine.regs.get_r16(R::AX));
}

#[test]
fn extended_error_after_failed_call() {
    let mut machine = Machine::default();
    machine.dos.host_files = Box::new(FailingFiles);
    machine.regs.set_r8(R::AH, 0x45);
    machine.regs.set_r16(R::BX, 3);
    machine.int(0x21);
    assert!(machine.regs.flags.carry);
    assert_eq!(ERROR_FILE_NOT_FOUND, machine.regs.get_r16(R::AX));

    // 0x59 reads the stored error without clearing it
    machine.regs.set_r8(R::AH, 0x59);
    machine.regs.set_r16(R::BX, 0);
    machine.int(0x21);
    assert_eq!(ERROR_FILE_NOT_FOUND, machine.regs.get_r16(R::AX));
    assert_eq!(0x08, machine.regs.get_r8(R::BH)); // class: not found
    assert_eq!(0x04, machine.regs.get_r8(R::BL)); // action: abort
    assert_eq!(0x02, machine.regs.get_r8(R::CH)); // locus: disk
}

#[test]
fn stored_error_is_cleared_by_the_next_modern_call() {
    let mut machine = Machine::default();
    machine.dos.host_files = Box::new(FailingFiles);
    machine.regs.set_r8(R::AH, 0x45);
    machine.int(0x21);
    assert!(machine.regs.flags.carry);

    machine.regs.set_r16(R::AX, 0x3000);
    machine.int(0x21);

    machine.regs.set_r8(R::AH, 0x59);
    machine.int(0x21);
    assert_eq!(0, machine.regs.get_r16(R::AX));
    assert_eq!(0, machine.regs.get_r8(R::BH));
}

#[test]
fn indos_flag_address_is_stable() {
    let mut machine = Machine::default();
    machine.regs.set_r8(R::AH, 0x34);
    machine.int(0x21);
    let seg = machine.regs.get_r16(R::ES);
    assert_eq!(0xC800, seg);
    assert_eq!(690, machine.regs.get_r16(R::BX));

    machine.regs.set_r8(R::AH, 0x34);
    machine.int(0x21);
    assert_eq!(seg, machine.regs.get_r16(R::ES));
}

#[test]
fn heap_handles_agree_across_modes() {
    let mut machine = Machine::default();
    machine.regs.set_r8(R::AH, 0x34);
    machine.int(0x21);
    let segment = machine.regs.get_r16(R::ES);

    machine.dos.config.win16 = true;
    machine.regs.set_r8(R::AH, 0x34);
    machine.int(0x21);
    let selector = machine.regs.get_r16(R::ES);

    assert_ne!(segment, selector);
    let linear = MemoryAddress::RealSegmentOffset(segment, 0).value();
    assert_eq!(linear, machine.mmu.descriptors.base(selector).unwrap());
}

#[test]
fn interrupt_vectors_round_trip_in_real_mode() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x2580);
    machine.regs.set_r16(R::DS, 0x2000);
    machine.regs.set_r16(R::DX, 0x0104);
    machine.int(0x21);

    machine.regs.set_r16(R::AX, 0x3580);
    machine.int(0x21);
    assert_eq!(0x2000, machine.regs.get_r16(R::ES));
    assert_eq!(0x0104, machine.regs.get_r16(R::BX));
}

#[test]
fn interrupt_vectors_are_per_mode() {
    let mut machine = Machine::default();
    machine.dos.config.win16 = true;
    machine.regs.set_r16(R::AX, 0x2580);
    machine.regs.set_r16(R::DS, 0x0777);
    machine.regs.set_r16(R::DX, 0x0042);
    machine.int(0x21);

    // the real mode table was not touched
    machine.dos.config.win16 = false;
    machine.regs.set_r16(R::AX, 0x3580);
    machine.int(0x21);
    assert_eq!(0x0000, machine.regs.get_r16(R::ES));

    machine.dos.config.win16 = true;
    machine.regs.set_r16(R::AX, 0x3580);
    machine.int(0x21);
    assert_eq!(0x0777, machine.regs.get_r16(R::ES));
    assert_eq!(0x0042, machine.regs.get_r16(R::BX));
}

#[test]
fn country_information_block() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x3800);
    machine.regs.set_r16(R::DS, 0x3000);
    machine.regs.set_r16(R::DX, 0);
    machine.int(0x21);

    assert_eq!(1, machine.regs.get_r16(R::AX)); // country code
    assert_eq!(1, machine.regs.get_r16(R::BX));
    assert_eq!(b'$', machine.mmu.read_u8(0x3000, 2));
    assert_eq!(b'.', machine.mmu.read_u8(0x3000, 9));
    assert_eq!(1, machine.mmu.read_u8(0x3000, 17)); // 24-hour clock
}

#[test]
fn extended_country_table_pointer() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x6502);
    machine.regs.set_r16(R::ES, 0x4000);
    machine.regs.set_r16(R::DI, 0x10);
    machine.int(0x21);

    assert_eq!(5, machine.regs.get_r16(R::CX));
    assert_eq!(0x02, machine.mmu.read_u8(0x4000, 0x10));
    let segptr = machine.mmu.memory.read_u32(MemoryAddress::RealSegmentOffset(0x4000, 0x11).value());
    assert_eq!(0xC800_0000, segptr); // heap segment, uppercase table at 0
}

#[test]
fn extended_country_general_info() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x6501);
    machine.regs.set_r16(R::ES, 0x4000);
    machine.regs.set_r16(R::DI, 0);
    machine.int(0x21);

    assert_eq!(41, machine.regs.get_r16(R::CX));
    assert_eq!(0x01, machine.mmu.read_u8(0x4000, 0));
    assert_eq!(38, machine.mmu.read_u16(0x4000, 1));
    assert_eq!(1, machine.mmu.read_u16(0x4000, 3)); // country
    assert_eq!(437, machine.mmu.read_u16(0x4000, 5)); // code page
    assert_eq!(b'$', machine.mmu.read_u8(0x4000, 9)); // block offset 2
}

#[test]
fn extended_country_asciiz_uppercase() {
    let mut machine = Machine::default();
    machine.mmu.write(0x3000, 0x20, b"dos rules\0");
    machine.regs.set_r16(R::AX, 0x6522);
    machine.regs.set_r16(R::DS, 0x3000);
    machine.regs.set_r16(R::DX, 0x20);
    machine.int(0x21);

    assert_eq!(b"DOS RULES\0".to_vec(), machine.mmu.read(0x3000, 0x20, 10));
}

#[test]
fn terminate_records_exit_and_return_code_reads_once() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x4C07);
    machine.int(0x21);
    assert_eq!(Some(7), machine.dos.exit);

    machine.regs.set_r8(R::AH, 0x4D);
    machine.int(0x21);
    assert_eq!(0x0007, machine.regs.get_r16(R::AX));

    machine.regs.set_r8(R::AH, 0x4D);
    machine.int(0x21);
    assert_eq!(0, machine.regs.get_r16(R::AX));
}

#[test]
fn psp_segment_round_trips() {
    let mut machine = Machine::default();
    machine.regs.set_r8(R::AH, 0x50);
    machine.regs.set_r16(R::BX, 0x1234);
    machine.int(0x21);

    machine.regs.set_r8(R::AH, 0x51);
    machine.int(0x21);
    assert_eq!(0x1234, machine.regs.get_r16(R::BX));

    machine.regs.set_r8(R::AH, 0x62);
    machine.int(0x21);
    assert_eq!(0x1234, machine.regs.get_r16(R::BX));
}

#[test]
fn verify_flag_round_trips() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x2E01);
    machine.int(0x21);

    machine.regs.set_r8(R::AH, 0x54);
    machine.int(0x21);
    assert_eq!(1, machine.regs.get_r8(R::AL));
}

#[test]
fn codepage_query() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x6601);
    machine.int(0x21);
    assert_eq!(437, machine.regs.get_r16(R::BX));
    assert_eq!(437, machine.regs.get_r16(R::DX));
}

#[test]
fn console_write_through_write_handle() {
    let mut machine = Machine::default();
    machine.mmu.write(0x3000, 0x40, b"hello");
    machine.regs.set_r8(R::AH, 0x40);
    machine.regs.set_r16(R::BX, 1);
    machine.regs.set_r16(R::CX, 5);
    machine.regs.set_r16(R::DS, 0x3000);
    machine.regs.set_r16(R::DX, 0x40);
    machine.int(0x21);

    assert_eq!(5, machine.regs.get_r16(R::AX));
    assert_eq!(b"hello".to_vec(), machine.dos.output);
}

#[test]
fn file_functions_reach_the_fallback_handler() {
    let mut machine = Machine::default();
    machine.dos.fallback = Some(Box::new(RecordingHandler));
    machine.regs.set_r16(R::AX, 0x3D00); // open file
    machine.int(0x21);
    assert_eq!(0xBEEF, machine.regs.get_r16(R::AX));

    // file writes on non-console handles are delegated too
    machine.regs.set_r8(R::AH, 0x40);
    machine.regs.set_r16(R::BX, 5);
    machine.int(0x21);
    assert_eq!(0xBEEF, machine.regs.get_r16(R::AX));
}

#[test]
fn dbcs_pointer_names_the_heap_table() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x6300);
    machine.int(0x21);
    assert_eq!(0xC800, machine.regs.get_r16(R::DS));
    assert_eq!(674, machine.regs.get_r16(R::SI));
    assert_eq!(0, machine.regs.get_r8(R::AL));
}

#[test]
fn list_of_lists_pointer() {
    let mut machine = Machine::default();
    machine.regs.set_r8(R::AH, 0x52);
    machine.int(0x21);
    assert_eq!(0x0080, machine.regs.get_r16(R::ES));
    assert_eq!(0x0026, machine.regs.get_r16(R::BX));
}

#[test]
fn allocation_strategy_is_low_first_fit() {
    let mut machine = Machine::default();
    machine.regs.set_r16(R::AX, 0x5800);
    machine.int(0x21);
    assert_eq!(1, machine.regs.get_r16(R::AX));
    assert!(!machine.regs.flags.carry);

    machine.regs.set_r16(R::AX, 0x5801);
    machine.int(0x21);
    assert!(!machine.regs.flags.carry);
}
