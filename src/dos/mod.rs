// these modules are re-exported as a single module

pub use self::console::*;
mod console;

pub use self::country::*;
mod country;

pub use self::error::*;
mod error;

pub use self::heap::*;
mod heap;

pub use self::ioctl::*;
mod ioctl;

pub use self::memalloc::*;
mod memalloc;

pub use self::services::*;
mod services;
