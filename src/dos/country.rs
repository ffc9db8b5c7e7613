//! Country-specific information blocks, int21 functions 0x38 and 0x65.

#[cfg(test)]
#[path = "./country_test.rs"]
mod country_test;

/// size of the country information block
pub const COUNTRY_INFO_SIZE: usize = 34;

/// default country code exposed to the guest (United States)
pub const DEFAULT_COUNTRY: u16 = 0x0001;

/// default OEM code page
pub const DEFAULT_CODEPAGE: u16 = 437;

/// builds the 34-byte country information block from the locale
/// settings we expose. field offsets are the guest-visible contract
pub fn country_information() -> [u8; COUNTRY_INFO_SIZE] {
    let mut buffer = [0u8; COUNTRY_INFO_SIZE];

    // 00 - WORD: date format, 0 = mm/dd/yy
    buffer[0] = 0;
    buffer[1] = 0;

    // 02 - BYTE[5]: ASCIIZ currency symbol
    buffer[2] = b'$';
    buffer[3] = 0;

    // 07 - BYTE[2]: ASCIIZ thousands separator
    buffer[7] = 0;

    // 09 - BYTE[2]: ASCIIZ decimal separator
    buffer[9] = b'.';

    // 11 - BYTE[2]: ASCIIZ date separator
    buffer[11] = b'/';

    // 13 - BYTE[2]: ASCIIZ time separator
    buffer[13] = b':';

    // 15 - BYTE: currency format flags
    buffer[15] = 0;

    // 16 - BYTE: digits after decimal in currency
    buffer[16] = 0;

    // 17 - BYTE: time format, bit 0 set = 24-hour clock
    buffer[17] = 1;

    // 18 - DWORD: case map routine, not provided
    // 22 - BYTE[2]: ASCIIZ data-list separator
    buffer[22] = b',';

    // 24 - BYTE[10]: reserved, zero filled
    buffer
}
