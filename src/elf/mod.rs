//! Read-only ELF support. Everything here works on a borrowed byte buffer and
//! validates as it goes: a file either parses completely or not at all.
//! Quick ELF reference: https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
//!
//! ELF files start with an ELF header which includes:
//! * A magic number to identify the file as an ELF file.
//! * The class (32 or 64 bit) and byte order. These determine how every other
//!   record is laid out.
//! * The architecture, e.g. Linux AMD x86-64.
//! * The offset to and number of program headers.
//! * The offset to and number of section headers.
//!
//! Program headers identify segments. Segments are used by the OS to load an exe into
//! memory. A program header has type, vaddr, offset, etc.
//!
//! Section headers identify sections. Sections are used for static linking. Section
//! headers have name, type, vaddr, offset, size, etc. Two of the sections are symbol
//! tables (.symtab and .dynsym), each paired with a string table for the symbol names.
pub(crate) mod allow_list;
pub mod elf_binary;
pub mod error;
pub mod header;
pub mod io;
pub mod primitives;
pub mod sections;
pub mod segments;
pub mod symbols;

#[cfg(test)]
pub(crate) mod testing;

pub use elf_binary::*;
pub use error::*;
pub use header::*;
pub use io::*;
pub use primitives::*;
pub use sections::*;
pub use segments::*;
pub use symbols::*;
