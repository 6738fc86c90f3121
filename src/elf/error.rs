//! Everything that can go wrong while interpreting an ELF buffer. Missing symbol
//! tables are not in here: those are represented by an empty table.
use std::error::Error;
use std::fmt;

/// Fields of the ELF header that are validated (or that can make the header
/// unusable for the rest of the parse).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HeaderField {
    Class,
    Data,
    ShortVersion,
    OsAbi,
    AbiVersion,
    Type,
    Machine,
    LongVersion,
    HeaderSize,
    ProgramHeaderSize,
    ProgramHeaderCount,
    SectionHeaderSize,
    SectionNamesIndex,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgramHeaderField {
    Type,
    Flags,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionHeaderField {
    Type,
    EntrySize,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElfError {
    /// The first four bytes are not 0x7f 'E' 'L' 'F'.
    BadMagic,

    /// An enumerated header field is outside its allow-list, or a size/count field
    /// can't describe a usable table.
    MalformedHeader { field: HeaderField, value: u64 },

    /// A read of size bytes at offset would go past the end of the buffer.
    OutOfBounds { offset: u64, size: u64 },

    /// Program header number index has a bad type or flags.
    MalformedProgramHeader {
        index: usize,
        field: ProgramHeaderField,
        value: u64,
    },

    /// Section header number index has a bad type or can't be used as a table.
    MalformedSectionHeader {
        index: usize,
        field: SectionHeaderField,
        value: u64,
    },

    /// A string table entry at offset isn't UTF-8.
    InvalidString { offset: u64 },
}

impl HeaderField {
    pub fn name(self) -> &'static str {
        match self {
            HeaderField::Class => "class",
            HeaderField::Data => "data encoding",
            HeaderField::ShortVersion => "short version",
            HeaderField::OsAbi => "OS ABI",
            HeaderField::AbiVersion => "ABI version",
            HeaderField::Type => "type",
            HeaderField::Machine => "machine",
            HeaderField::LongVersion => "long version",
            HeaderField::HeaderSize => "header size",
            HeaderField::ProgramHeaderSize => "program header size",
            HeaderField::ProgramHeaderCount => "program header count",
            HeaderField::SectionHeaderSize => "section header size",
            HeaderField::SectionNamesIndex => "section names index",
        }
    }
}

impl ProgramHeaderField {
    pub fn name(self) -> &'static str {
        match self {
            ProgramHeaderField::Type => "type",
            ProgramHeaderField::Flags => "flags",
        }
    }
}

impl SectionHeaderField {
    pub fn name(self) -> &'static str {
        match self {
            SectionHeaderField::Type => "type",
            SectionHeaderField::EntrySize => "entry size",
        }
    }
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElfError::BadMagic => write!(f, "not an ELF file (bad magic)"),
            ElfError::MalformedHeader { field, value } => {
                write!(f, "ELF header has invalid {} ({value:#x})", field.name())
            }
            ElfError::OutOfBounds { offset, size } => {
                write!(f, "read of {size} bytes at offset {offset:#x} is out of bounds")
            }
            ElfError::MalformedProgramHeader {
                index,
                field,
                value,
            } => write!(
                f,
                "program header {index} has invalid {} ({value:#x})",
                field.name()
            ),
            ElfError::MalformedSectionHeader {
                index,
                field,
                value,
            } => write!(
                f,
                "section header {index} has invalid {} ({value:#x})",
                field.name()
            ),
            ElfError::InvalidString { offset } => {
                write!(f, "string at offset {offset:#x} is not UTF-8")
            }
        }
    }
}

impl Error for ElfError {}
