//! Handlers for the commands users type, e.g. `symbols --dynamic`. Output goes to
//! an io::Write so that it can be tested.
pub mod elf;
pub mod misc;
pub mod tables;

pub use elf::*;
pub use misc::*;
