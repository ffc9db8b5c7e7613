// these modules are re-exported as a single module

pub use self::register::*;
mod register;

pub use self::flag::*;
mod flag;
