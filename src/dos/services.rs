//! The int21 service dispatcher.
//!
//! Guest programs request DOS services by raising software interrupt
//! 0x21 with a function number in AH. Results travel back through the
//! register snapshot; the carry flag signals failure and AX then holds
//! a DOS error code. Families that need a real filesystem or program
//! loader behind them are forwarded to a pluggable fallback handler.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Local, Timelike};

use crate::cpu::{RegisterState, R};
use crate::dos::console::Console;
use crate::dos::country::{country_information, DEFAULT_CODEPAGE, DEFAULT_COUNTRY};
use crate::dos::error::{self, ERROR_GENERAL_FAILURE, ERROR_INVALID_BLOCK, ERROR_NOT_ENOUGH_MEMORY, ERROR_SUCCESS};
use crate::dos::heap::{self, DosHeap};
use crate::dos::ioctl::{self, SharingRetry};
use crate::dos::memalloc::{AllocError, DosMemory};
use crate::keyboard::Keyboard;
use crate::machine::Component;
use crate::memory::{ExecutionMode, MemoryAddress, MemoryError, MMU};

#[cfg(test)]
#[path = "./services_test.rs"]
mod services_test;

const DEBUG_INT21: bool = false;

/// reported DOS version, 5.0
const DOS_VERSION_MAJOR: u8 = 5;
const DOS_VERSION_MINOR: u8 = 0;

/// traditional location of the DOS list of lists in real mode
const LOL_REAL: (u16, u16) = (0x0080, 0x0026);

/// host clock, behind a seam so tests can pin the time
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// host file primitives consumed by the handle-level functions that
/// are not forwarded wholesale. errors are DOS error codes
pub trait HostFiles {
    fn flush(&mut self, handle: u16) -> Result<(), u16>;
    fn duplicate(&mut self, handle: u16) -> Result<u16, u16>;
    fn set_handle_count(&mut self, count: u16) -> Result<(), u16>;
}

/// default host with no file table wired up: flushes succeed trivially
/// and duplication hands the handle back unchanged
pub struct PassthroughFiles;

impl HostFiles for PassthroughFiles {
    fn flush(&mut self, _handle: u16) -> Result<(), u16> {
        Ok(())
    }
    fn duplicate(&mut self, handle: u16) -> Result<u16, u16> {
        Ok(handle)
    }
    fn set_handle_count(&mut self, _count: u16) -> Result<(), u16> {
        Ok(())
    }
}

/// session-wide settings that select the host personality
pub struct DosConfig {
    /// richer 16-bit Windows personality: protected mode addressing is
    /// honored when the snapshot is not in virtual-8086 mode
    pub win16: bool,
    pub country: u16,
    pub codepage: u16,
    /// list-of-lists pointer handed out by function 0x52, per mode
    pub lol_real: (u16, u16),
    pub lol_protected: (u16, u16),
}

impl DosConfig {
    pub fn default() -> Self {
        DosConfig {
            win16: false,
            country: DEFAULT_COUNTRY,
            codepage: DEFAULT_CODEPAGE,
            lol_real: LOL_REAL,
            lol_protected: (0, 0),
        }
    }
}

/// the DOS service layer. all process-wide mutable state of the
/// emulated DOS kernel lives here, with a defined construction and no
/// teardown, and is reached only through `&mut`
pub struct DosServices {
    pub config: DosConfig,
    pub memory: DosMemory,
    pub keyboard: Keyboard,
    pub clock: Box<dyn Clock>,
    pub host_files: Box<dyn HostFiles>,

    /// generic handler for the delegated function families
    pub fallback: Option<Box<dyn Component>>,
    /// expanded memory driver, target of ioctl calls on its device handle
    pub ems: Option<Box<dyn Component>>,
    /// guest handle -> device name, consulted by the ioctl dispatcher
    pub devices: HashMap<u16, String>,

    /// console output bytes, as a screen-less frontend would collect them
    pub output: Vec<u8>,
    /// set when the guest program asked to terminate, with its exit code
    pub exit: Option<u8>,

    heap: Option<DosHeap>,
    console: Console,
    sharing: SharingRetry,
    last_error: u16,
    psp_segment: u16,
    return_code: u16,
    verify: bool,
    /// protected mode interrupt handlers, seg:off per vector
    pm_vectors: Vec<(u16, u16)>,
}

impl Component for DosServices {
    fn int(&mut self, int: u8, regs: &mut RegisterState, mmu: &mut MMU) -> bool {
        if int != 0x21 {
            return false;
        }
        self.int21(regs, mmu);
        true
    }
}

impl DosServices {
    pub fn default() -> Self {
        DosServices {
            config: DosConfig::default(),
            memory: DosMemory::default(),
            keyboard: Keyboard::default(),
            clock: Box::new(SystemClock),
            host_files: Box::new(PassthroughFiles),
            fallback: None,
            ems: None,
            devices: HashMap::new(),
            output: Vec::new(),
            exit: None,
            heap: None,
            console: Console::default(),
            sharing: SharingRetry::default(),
            last_error: ERROR_SUCCESS,
            psp_segment: 0,
            return_code: 0,
            verify: false,
            pm_vectors: vec![(0, 0); 256],
        }
    }

    /// the addressing mode of the current call. virtual-8086 mode and
    /// the plain DOS personality both mean real mode addressing
    fn execution_mode(&self, regs: &RegisterState) -> ExecutionMode {
        if regs.flags.virtual_mode || !self.config.win16 {
            ExecutionMode::Real
        } else {
            ExecutionMode::Protected16
        }
    }

    /// the int21 heap block, built on first reference
    fn heap(&mut self, mmu: &mut MMU) -> Result<DosHeap, AllocError> {
        match self.heap {
            Some(h) => Ok(h),
            None => {
                let h = DosHeap::create(&mut self.memory.umb, mmu)?;
                self.heap = Some(h);
                Ok(h)
            }
        }
    }

    /// obsolete and never-implemented selectors: complain and fail the call
    fn unimplemented(&self, regs: &mut RegisterState) {
        println!("int21: unhandled function AX={:04X}", regs.get_r16(R::AX));
        regs.flags.carry = true;
    }

    /// hands the whole call to the generic fallback handler
    fn forward(&mut self, regs: &mut RegisterState, mmu: &mut MMU) {
        match &mut self.fallback {
            Some(handler) => {
                handler.int(0x21, regs, mmu);
            }
            None => {
                println!("int21: no fallback handler for AX={:04X}", regs.get_r16(R::AX));
                regs.flags.carry = true;
            }
        }
    }

    fn write_char(&mut self, b: u8) {
        self.output.push(b);
    }

    /// entry point for interrupt 0x21. the carry flag is cleared up
    /// front; the stored extended error is cleared for every modern
    /// function except 0x59, which exists to read it
    pub fn int21(&mut self, regs: &mut RegisterState, mmu: &mut MMU) {
        regs.flags.carry = false;
        let ah = regs.get_r8(R::AH);
        if DEBUG_INT21 {
            println!("int21: dispatch AX={:04X}", regs.get_r16(R::AX));
        }
        if ah >= 0x2F && ah != 0x59 {
            self.last_error = ERROR_SUCCESS;
        }
        let propagate = match self.dispatch(regs, mmu) {
            Ok(propagate) => propagate,
            Err(e) => {
                println!("int21: address fault, {}", e);
                self.last_error = ERROR_GENERAL_FAILURE;
                true
            }
        };
        if propagate {
            regs.set_r16(R::AX, self.last_error);
            regs.flags.carry = true;
        }
    }

    /// one branch per AH function. returns whether the stored error
    /// should be propagated into AX + carry
    fn dispatch(&mut self, regs: &mut RegisterState, mmu: &mut MMU) -> Result<bool, MemoryError> {
        let ah = regs.get_r8(R::AH);
        let mode = self.execution_mode(regs);
        match ah {
            0x00 => {
                // terminate program
                self.return_code = 0;
                self.exit = Some(0);
            }
            0x01 => {
                // read keyboard with echo, non-blocking variant
                match self.keyboard.consume() {
                    Some(event) => {
                        regs.set_r8(R::AL, event.ascii);
                        if event.ascii != 0 {
                            self.write_char(event.ascii);
                        }
                    }
                    None => regs.set_r8(R::AL, 0),
                }
            }
            0x02 => {
                // write character to stdout
                let dl = regs.get_r8(R::DL);
                self.write_char(dl);
                regs.set_r8(R::AL, dl);
            }
            0x06 => {
                // direct console i/o: DL = 0xFF reads, anything else writes
                let dl = regs.get_r8(R::DL);
                if dl == 0xFF {
                    let (al, empty) = self.console.direct_input(&mut self.keyboard);
                    regs.set_r8(R::AL, al);
                    regs.flags.zero = empty;
                } else {
                    self.write_char(dl);
                    regs.set_r8(R::AL, dl);
                }
            }
            0x07 | 0x08 => {
                // read keyboard without echo
                let al = match self.keyboard.consume() {
                    Some(event) => event.ascii,
                    None => 0,
                };
                regs.set_r8(R::AL, al);
            }
            0x0B => {
                // stdin status
                let al = if self.keyboard.has_queued_events() { 0xFF } else { 0x00 };
                regs.set_r8(R::AL, al);
            }
            0x0C => {
                // flush input buffer, then re-dispatch the read function in AL
                while self.keyboard.consume().is_some() {}
                let al = regs.get_r8(R::AL);
                match al {
                    0x01 | 0x06 | 0x07 | 0x08 | 0x0A => {
                        regs.set_r8(R::AH, al);
                        self.int21(regs, mmu);
                    }
                    _ => regs.set_r8(R::AL, 0),
                }
            }
            0x0D => {
                // disk reset, nothing to flush
            }
            0x18 | 0x1D | 0x1E | 0x20 | 0x61 | 0x6B => {
                // CP/M leftovers, always succeed with AL=0
                regs.set_r8(R::AL, 0);
            }
            0x25 => {
                // set interrupt vector DS:DX
                let v = regs.get_r8(R::AL);
                let seg = regs.get_r16(R::DS);
                let off = regs.get_r16(R::DX);
                match mode {
                    ExecutionMode::Real => {
                        mmu.write_vec(v, MemoryAddress::RealSegmentOffset(seg, u32::from(off)));
                    }
                    ExecutionMode::Protected16 => {
                        self.pm_vectors[usize::from(v)] = (seg, off);
                    }
                }
            }
            0x2A => {
                // get system date
                let now = self.clock.now();
                regs.set_r16(R::CX, now.year() as u16);
                regs.set_r8(R::DH, now.month() as u8);
                regs.set_r8(R::DL, now.day() as u8);
                regs.set_r8(R::AL, now.weekday().num_days_from_sunday() as u8);
            }
            0x2B => {
                // set system date: accepted and discarded, the host owns the clock
                println!("int21: set date {:04}-{:02}-{:02} ignored",
                    regs.get_r16(R::CX), regs.get_r8(R::DH), regs.get_r8(R::DL));
                regs.set_r8(R::AL, 0);
            }
            0x2C => {
                // get system time
                let now = self.clock.now();
                regs.set_r8(R::CH, now.hour() as u8);
                regs.set_r8(R::CL, now.minute() as u8);
                regs.set_r8(R::DH, now.second() as u8);
                regs.set_r8(R::DL, (now.nanosecond() / 10_000_000) as u8);
            }
            0x2D => {
                // set system time: accepted and discarded
                println!("int21: set time {:02}:{:02}:{:02} ignored",
                    regs.get_r8(R::CH), regs.get_r8(R::CL), regs.get_r8(R::DH));
                regs.set_r8(R::AL, 0);
            }
            0x2E => {
                // set verify flag
                self.verify = regs.get_r8(R::AL) & 1 != 0;
            }
            0x30 => {
                // get version. BH answers the OEM-number variant only
                // when the caller passed AL=0
                let oem_wanted = regs.get_r8(R::AL) == 0;
                regs.set_r8(R::AL, DOS_VERSION_MAJOR);
                regs.set_r8(R::AH, DOS_VERSION_MINOR);
                regs.set_r8(R::BH, if oem_wanted { 0xFF } else { 0x08 });
                regs.set_r8(R::BL, 0x12); // serial number, high part
                regs.set_r16(R::CX, 0x3456); // serial number, low part
            }
            0x31 => {
                println!("int21: terminate and stay resident not supported, DX={:04X} paragraphs", regs.get_r16(R::DX));
            }
            0x34 => {
                // address of the InDOS flag
                match self.heap(mmu) {
                    Ok(h) => {
                        regs.set_r16(R::ES, h.handle(mode));
                        regs.set_r16(R::BX, heap::MISC_INDOS as u16);
                    }
                    Err(_) => {
                        self.last_error = ERROR_NOT_ENOUGH_MEMORY;
                        return Ok(true);
                    }
                }
            }
            0x35 => {
                // get interrupt vector into ES:BX
                let v = regs.get_r8(R::AL);
                let (seg, off) = match mode {
                    ExecutionMode::Real => mmu.read_vec(v),
                    ExecutionMode::Protected16 => self.pm_vectors[usize::from(v)],
                };
                regs.set_r16(R::ES, seg);
                regs.set_r16(R::BX, off);
            }
            0x38 => {
                // get country information into DS:DX
                let seg = regs.get_r16(R::DS);
                let off = u32::from(regs.get_r16(R::DX));
                mmu.write_mode(seg, off, mode, &country_information())?;
                regs.set_r16(R::AX, self.config.country);
                regs.set_r16(R::BX, self.config.country);
            }
            0x40 => {
                // write to handle: console handles are served here, file
                // handles belong to the fallback
                let handle = regs.get_r16(R::BX);
                if handle == 1 || handle == 2 {
                    let seg = regs.get_r16(R::DS);
                    let off = u32::from(regs.get_r16(R::DX));
                    let count = regs.get_r16(R::CX);
                    let data = mmu.read_mode(seg, off, mode, usize::from(count))?;
                    self.output.extend_from_slice(&data);
                    regs.set_r16(R::AX, count);
                } else {
                    self.forward(regs, mmu);
                }
            }
            0x44 => {
                ioctl::dispatch(regs, mmu, &self.devices, &mut self.sharing, &mut self.ems, &mut self.fallback);
            }
            0x45 => {
                // duplicate file handle
                match self.host_files.duplicate(regs.get_r16(R::BX)) {
                    Ok(new_handle) => regs.set_r16(R::AX, new_handle),
                    Err(code) => {
                        self.last_error = code;
                        return Ok(true);
                    }
                }
            }
            0x48 => {
                // allocate memory block, BX paragraphs
                match self.memory.allocate(regs.get_r16(R::BX), mode, &mut mmu.descriptors) {
                    Ok(handle) => regs.set_r16(R::AX, handle),
                    Err(AllocError::InsufficientMemory(available)) => {
                        regs.set_r16(R::BX, available);
                        self.last_error = ERROR_NOT_ENOUGH_MEMORY;
                        return Ok(true);
                    }
                    Err(AllocError::InvalidHandle) => {
                        self.last_error = ERROR_INVALID_BLOCK;
                        return Ok(true);
                    }
                }
            }
            0x49 => {
                // free memory block addressed by ES
                match self.memory.free(regs.get_r16(R::ES), mode, &mut mmu.descriptors) {
                    Ok(()) => {
                        if mode == ExecutionMode::Protected16 {
                            // the selector is dead, do not leave it loaded
                            regs.set_r16(R::ES, 0);
                        }
                    }
                    Err(_) => {
                        self.last_error = ERROR_INVALID_BLOCK;
                        return Ok(true);
                    }
                }
            }
            0x4C => {
                // terminate with return code
                let code = regs.get_r8(R::AL);
                self.return_code = u16::from(code);
                self.exit = Some(code);
            }
            0x4D => {
                // get return code of last terminated program, read-once
                regs.set_r16(R::AX, self.return_code);
                self.return_code = 0;
            }
            0x50 => {
                self.psp_segment = regs.get_r16(R::BX);
            }
            0x51 | 0x62 => {
                regs.set_r16(R::BX, self.psp_segment);
            }
            0x52 => {
                // pointer to the list of lists
                let (seg, off) = match mode {
                    ExecutionMode::Real => self.config.lol_real,
                    ExecutionMode::Protected16 => self.config.lol_protected,
                };
                regs.set_r16(R::ES, seg);
                regs.set_r16(R::BX, off);
            }
            0x54 => {
                regs.set_r8(R::AL, self.verify as u8);
            }
            0x58 => {
                // allocation strategy: we always search low memory first fit
                match regs.get_r8(R::AL) {
                    0x00 => regs.set_r16(R::AX, 1),
                    0x01 => {} // set strategy, accepted and ignored
                    _ => self.unimplemented(regs),
                }
            }
            0x59 => {
                // get extended error information
                let err = error::translate(self.last_error);
                regs.set_r16(R::AX, err.code);
                regs.set_r8(R::BH, err.class);
                regs.set_r8(R::BL, err.action);
                regs.set_r8(R::CH, err.locus);
            }
            0x63 => {
                // double byte character set tables
                if regs.get_r8(R::AL) == 0 {
                    match self.heap(mmu) {
                        Ok(h) => {
                            regs.set_r16(R::DS, h.handle(mode));
                            regs.set_r16(R::SI, heap::DBCS_TABLE as u16);
                            regs.set_r8(R::AL, 0);
                        }
                        Err(_) => {
                            self.last_error = ERROR_NOT_ENOUGH_MEMORY;
                            return Ok(true);
                        }
                    }
                }
            }
            0x65 => {
                return self.extended_country(regs, mmu, mode);
            }
            0x66 => {
                // global code page
                match regs.get_r8(R::AL) {
                    0x01 => {
                        regs.set_r16(R::BX, self.config.codepage);
                        regs.set_r16(R::DX, self.config.codepage);
                    }
                    _ => {
                        println!("int21: set code page {:04X} ignored", regs.get_r16(R::BX));
                    }
                }
            }
            0x67 => {
                // set handle count
                if let Err(code) = self.host_files.set_handle_count(regs.get_r16(R::BX)) {
                    self.last_error = code;
                    return Ok(true);
                }
            }
            0x68 | 0x6A => {
                // commit file
                if let Err(code) = self.host_files.flush(regs.get_r16(R::BX)) {
                    self.last_error = code;
                    return Ok(true);
                }
            }
            0x70 => {
                // windows 95 internationalization, not provided
                regs.set_r8(R::AL, 0);
                regs.flags.carry = true;
            }
            0xDC | 0xEA => {
                // novell netware probes, ignored
            }
            // families served by the generic handler: character devices
            // with line discipline, drive info, FCB and filename level
            // functions, handle level file i/o, directories, exec,
            // find first/next, file times and the long filename set
            0x09 | 0x0A | 0x0E | 0x11 | 0x12 | 0x19..=0x1C | 0x1F | 0x29 | 0x2F
            | 0x32 | 0x33 | 0x36 | 0x37 | 0x39..=0x3F | 0x41..=0x43 | 0x46 | 0x47
            | 0x4A | 0x4B | 0x4E | 0x4F | 0x56 | 0x57 | 0x5A..=0x60 | 0x69 | 0x6C
            | 0x71 | 0x73 => {
                self.forward(regs, mmu);
            }
            _ => self.unimplemented(regs),
        }
        Ok(false)
    }

    /// extended country information, function 0x65
    fn extended_country(&mut self, regs: &mut RegisterState, mmu: &mut MMU, mode: ExecutionMode) -> Result<bool, MemoryError> {
        let sub = regs.get_r8(R::AL);
        match sub {
            0x01 => {
                // general info: id, size word, country, code page, 34-byte block
                let seg = regs.get_r16(R::ES);
                let mut off = u32::from(regs.get_r16(R::DI));
                mmu.write_u8_mode(seg, off, mode, 0x01)?;
                off += 1;
                mmu.write_u16_mode(seg, off, mode, 38)?;
                off += 2;
                mmu.write_u16_mode(seg, off, mode, self.config.country)?;
                off += 2;
                mmu.write_u16_mode(seg, off, mode, self.config.codepage)?;
                off += 2;
                mmu.write_mode(seg, off, mode, &country_information())?;
                regs.set_r16(R::CX, 41);
            }
            0x02..=0x07 => {
                // pointer to one of the heap tables: id byte + seg:off dword
                let table = match sub {
                    0x02 | 0x04 => heap::UPPERCASE_SIZE,
                    0x03 => heap::LOWERCASE_SIZE,
                    0x05 => heap::FILENAME_SIZE,
                    0x06 => heap::COLLATING_SIZE,
                    _ => heap::DBCS_SIZE,
                };
                let handle = match self.heap(mmu) {
                    Ok(h) => h.handle(mode),
                    Err(_) => {
                        self.last_error = ERROR_NOT_ENOUGH_MEMORY;
                        return Ok(true);
                    }
                };
                let seg = regs.get_r16(R::ES);
                let off = u32::from(regs.get_r16(R::DI));
                mmu.write_u8_mode(seg, off, mode, sub)?;
                mmu.write_u32_mode(seg, off + 1, mode, (u32::from(handle) << 16) | table)?;
                regs.set_r16(R::CX, 5);
            }
            0x20 | 0xA0 => {
                // uppercase single character in DL
                let dl = regs.get_r8(R::DL);
                regs.set_r8(R::DL, dl.to_ascii_uppercase());
            }
            0x21 | 0xA1 => {
                // uppercase a counted buffer at DS:DX, length CX
                let seg = regs.get_r16(R::DS);
                let off = u32::from(regs.get_r16(R::DX));
                let data = mmu.read_mode(seg, off, mode, usize::from(regs.get_r16(R::CX)))?;
                let upper: Vec<u8> = data.iter().map(|b| b.to_ascii_uppercase()).collect();
                mmu.write_mode(seg, off, mode, &upper)?;
            }
            0x22 | 0xA2 => {
                // uppercase an ASCIIZ string at DS:DX
                let seg = regs.get_r16(R::DS);
                let mut off = u32::from(regs.get_r16(R::DX));
                loop {
                    let b = mmu.read_u8_mode(seg, off, mode)?;
                    if b == 0 {
                        break;
                    }
                    mmu.write_u8_mode(seg, off, mode, b.to_ascii_uppercase())?;
                    off += 1;
                }
            }
            _ => self.unimplemented(regs),
        }
        Ok(false)
    }
}
