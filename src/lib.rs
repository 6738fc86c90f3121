//! Inspects executables: detects the container format and, for ELF files, parses and
//! validates the headers, sections, and symbol tables.
pub mod binary;
pub mod commands;
pub mod elf;
pub mod file;
pub mod repl;
pub mod utils;
