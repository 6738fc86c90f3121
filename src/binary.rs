//! Figures out which kind of executable a file holds. Only ELF files are parsed.
use crate::elf::ELF_MAGIC;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinaryKind {
    Elf,
    /// Windows Portable Executable.
    Pe,
    MachO,
    Unknown,
}

impl BinaryKind {
    pub fn detect(bytes: &[u8]) -> BinaryKind {
        if bytes.starts_with(&ELF_MAGIC) {
            BinaryKind::Elf
        } else if bytes.len() >= 0x42 && bytes.starts_with(b"MZ") && &bytes[0x40..0x42] == b"PE"
        {
            BinaryKind::Pe
        } else if bytes.starts_with(&[0xfe, 0xed, 0xfa, 0xce]) {
            BinaryKind::MachO
        } else {
            BinaryKind::Unknown
        }
    }
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BinaryKind::Elf => write!(f, "ELF"),
            BinaryKind::Pe => write!(f, "PE"),
            BinaryKind::MachO => write!(f, "Mach-O"),
            BinaryKind::Unknown => write!(f, "unknown"),
        }
    }
}
