//! Extended error reporting, int21 function 0x59.
//!
//! Legacy programs branch on the (class, action, locus) triple, so the
//! mapping below is a fixed table reproduced value for value.

#[cfg(test)]
#[path = "./error_test.rs"]
mod error_test;

// host error codes, shared numeric space with the DOS codes returned in AX
pub const ERROR_SUCCESS: u16 = 0;
pub const ERROR_FILE_NOT_FOUND: u16 = 2;
pub const ERROR_PATH_NOT_FOUND: u16 = 3;
pub const ERROR_TOO_MANY_OPEN_FILES: u16 = 4;
pub const ERROR_ACCESS_DENIED: u16 = 5;
pub const ERROR_INVALID_HANDLE: u16 = 6;
pub const ERROR_NOT_ENOUGH_MEMORY: u16 = 8;
pub const ERROR_INVALID_BLOCK: u16 = 9;
pub const ERROR_INVALID_DRIVE: u16 = 15;
pub const ERROR_NO_MORE_FILES: u16 = 18;
pub const ERROR_SEEK: u16 = 25;
pub const ERROR_GENERAL_FAILURE: u16 = 31;
pub const ERROR_SHARING_VIOLATION: u16 = 32;
pub const ERROR_LOCK_VIOLATION: u16 = 33;
pub const ERROR_HANDLE_DISK_FULL: u16 = 39;
pub const ERROR_NO_NETWORK: u16 = 73;
pub const ERROR_FILE_EXISTS: u16 = 80;
pub const ERROR_CANNOT_MAKE: u16 = 82;
pub const ERROR_DISK_FULL: u16 = 112;
pub const ERROR_DIR_NOT_EMPTY: u16 = 145;
pub const ERROR_ALREADY_EXISTS: u16 = 183;

/// error class, returned in BH
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum ErrorClass {
    OutOfResource = 0x01,
    Temporary = 0x02,
    AccessDenied = 0x03,
    SystemFailure = 0x06,
    ProgramError = 0x07,
    NotFound = 0x08,
    MediaError = 0x0B,
    Exists = 0x0C,
}

/// suggested action, returned in BL
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum ErrorAction {
    Retry = 0x01,
    AskUser = 0x03,
    Abort = 0x04,
    Ignore = 0x06,
}

/// error locus, returned in CH
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
pub enum ErrorLocus {
    Unknown = 0x01,
    Disk = 0x02,
    Network = 0x03,
    Serial = 0x04,
    Memory = 0x05,
}

/// the register-level form of an extended error report
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtendedError {
    pub code: u16,
    pub class: u8,
    pub action: u8,
    pub locus: u8,
}

/// classifies a host error code. total over all inputs: success is the
/// all-zero triple, codes outside the table fall back to the broadest
/// category
pub fn translate(code: u16) -> ExtendedError {
    use self::ErrorAction::*;
    use self::ErrorClass::*;
    use self::ErrorLocus::*;

    let (class, action, locus) = match code {
        ERROR_SUCCESS => {
            return ExtendedError { code, class: 0, action: 0, locus: 0 };
        }
        ERROR_DIR_NOT_EMPTY => (Exists, Ignore, Disk),
        ERROR_ACCESS_DENIED => (AccessDenied, Abort, Disk),
        ERROR_CANNOT_MAKE => (AccessDenied, Abort, Unknown),
        ERROR_DISK_FULL | ERROR_HANDLE_DISK_FULL => (MediaError, Abort, Disk),
        ERROR_FILE_EXISTS | ERROR_ALREADY_EXISTS => (Exists, Abort, Disk),
        ERROR_FILE_NOT_FOUND => (NotFound, Abort, Disk),
        ERROR_GENERAL_FAILURE => (SystemFailure, Abort, Unknown),
        ERROR_INVALID_DRIVE => (MediaError, Abort, Disk),
        ERROR_INVALID_HANDLE => (ProgramError, Abort, Disk),
        ERROR_LOCK_VIOLATION => (AccessDenied, Abort, Disk),
        ERROR_NO_MORE_FILES => (MediaError, Abort, Disk),
        ERROR_NO_NETWORK => (NotFound, Abort, Network),
        ERROR_NOT_ENOUGH_MEMORY => (OutOfResource, Abort, Memory),
        ERROR_PATH_NOT_FOUND => (NotFound, Abort, Disk),
        ERROR_SEEK => (NotFound, Ignore, Disk),
        ERROR_SHARING_VIOLATION => (Temporary, Retry, Disk),
        ERROR_TOO_MANY_OPEN_FILES => (ProgramError, Abort, Disk),
        _ => {
            println!("int21: unrecognized host error {}", code);
            (SystemFailure, Abort, Unknown)
        }
    };
    ExtendedError {
        code,
        class: class as u8,
        action: action as u8,
        locus: locus as u8,
    }
}
