//! Used by the linker and debugger. Also see segments.
use super::allow_list::allow_list;
use super::io::{table_offset, to_index};
use super::{
    Bytes, ElfClass, ElfError, ElfHeader, HeaderField, Offset, Reader, SectionHeaderField,
    SectionIndex, Stream, StringIndex, VirtualAddr,
};
use std::borrow::Cow;

const WRITE_FLAG: u64 = 1 << 0; // Writable
const ALLOC_FLAG: u64 = 1 << 1; // Occupies memory during execution
const EXECINSTR_FLAG: u64 = 1 << 2; // Executable
const MERGE_FLAG: u64 = 1 << 4; // Might be merged
const STRINGS_FLAG: u64 = 1 << 5; // Contains nul-terminated strings
const INFO_LINK_FLAG: u64 = 1 << 6; // `sh_info' contains SHT index
const LINK_ORDER_FLAG: u64 = 1 << 7; // Preserve order after combining
const OS_NONCONFORMING_FLAG: u64 = 1 << 8; // Non-standard OS specific handling required
const GROUP_FLAG: u64 = 1 << 9; // Section is member of a group.
const TLS_FLAG: u64 = 1 << 10; // Section hold thread-local data.
const COMPRESSED_FLAG: u64 = 1 << 11; // Section with compressed data.
const MASKOS_FLAG: u64 = 0x0ff00000; // OS-specific.
const MASKPROC_FLAG: u64 = 0xf0000000; // Processor-specific

allow_list! {
    pub enum SectionType: u32 {
        /// Not to be used.
        Null = 0, "NULL";

        /// CPU instructions or constant data.
        ProgBits = 1, "PROGBITS";

        /// Symbols for the linker and debugger.
        SymbolTable = 2, "SYMTAB";

        /// Strings for use by the linker and debugger.
        StringTable = 3, "STRTAB";

        /// Relocation entries with addends.
        RelocationsWith = 4, "RELA";

        /// Symbol hash table.
        SymbolHashTable = 5, "HASH";

        /// Dynamic linking information.
        Dynamic = 6, "DYNAMIC";

        /// Arbitrary metadata.
        Note = 7, "NOTE";

        /// Uninitialized data.
        NoBits = 8, "NOBITS";

        /// Relocation entries without addends.
        RelocationsWithout = 9, "REL";

        Shlib = 10, "SHLIB";

        /// Dynamic linker symbol table.
        DynamicSymbolTable = 11, "DYNSYM";

        /// Array of pointers to initialization functions.
        InitArray = 14, "INIT_ARRAY";

        /// Array of pointers to termination functions.
        FiniArray = 15, "FINI_ARRAY";

        /// Array of pointers to functions to be called before the regular
        /// initialization functions.
        PreinitArray = 16, "PREINIT_ARRAY";

        /// Indices of sections that must be linked together.
        Group = 17, "GROUP";

        /// Extended section indices for a symbol table.
        SymbolTableIndices = 18, "SYMTAB_SHNDX";

        /// GNU style hash table.
        Hash = 0x6ffffff6, "GNU_HASH";

        /// GNU symbol versions that are provided.
        VerDef = 0x6ffffffd, "VERDEF";

        /// GNU symbol versions that are required.
        VerNeed = 0x6ffffffe, "VERNEED";

        /// GNU symbol version table.
        VerSym = 0x6fffffff, "VERSYM";

        LoProc = 0x70000000, "LOPROC";
        HiProc = 0x7fffffff, "HIPROC";
        LoUser = 0x80000000, "LOUSER";
        HiUser = 0xffffffff, "HIUSER";
    }
}

/// Describes a section. Elf32_Shdr or Elf64_Shdr, see
/// https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SectionHeader<'a> {
    /// Offset into the section name table. Zero means no name.
    pub name_index: StringIndex,

    /// Usually points into the ELF bytes, names that aren't UTF-8 are converted
    /// lossily. Empty if the file has no section name table.
    pub name: Cow<'a, str>,

    pub stype: SectionType,

    /// Write, alloc, and/or exec.
    pub flags: u64,

    /// Virtual address of the section once loaded, zero if not allocated.
    pub addr: u64,

    /// File offset of the section's bytes.
    pub offset: u64,

    /// Number of bytes in the section. NOBITS sections have no bytes in the file.
    pub size: u64,

    /// Link to another section with related information, usually a string
    /// or symbol table.
    pub link: u32,

    /// Additional section info.
    pub info: u32,

    /// Section alignment.
    pub align: u64,

    /// Set if the section holds a table of entries.
    pub entry_size: u64,
}

/// Section zero is always NULL but when the ELF header fields overflow the real
/// values are stored in it.
#[derive(Clone, Copy, Debug)]
pub struct SectionZero {
    /// Number of section headers if e_shnum is SHN_LORESERVE.
    pub size: u64,

    /// Index of the section name table if e_shstrndx is SHN_XINDEX.
    pub link: u32,

    /// Number of program headers if e_phnum is PN_XNUM.
    pub info: u32,
}

impl SectionZero {
    pub fn new(reader: &Reader, section_offset: u64) -> Result<Self, ElfError> {
        let mut s = Stream::new(reader, to_index(section_offset)?);
        s.offset += 8; // name and type
        let _flags = s.read_class_word()?;
        let _addr = s.read_addr()?;
        let _offset = s.read_offset()?;
        let size = s.read_class_word()?;
        let link = s.read_word()?;
        let info = s.read_word()?;
        Ok(SectionZero { size, link, info })
    }
}

fn record_size(class: ElfClass) -> u64 {
    match class {
        ElfClass::Class32 => 40,
        ElfClass::Class64 => 64,
    }
}

/// Returns an empty list if the file has no section header table. Fails if any
/// section header can't be read, has a bad type, or has a name that can't be read.
pub fn parse_section_headers<'a>(
    bytes: &'a [u8],
    header: &ElfHeader,
) -> Result<Vec<SectionHeader<'a>>, ElfError> {
    if header.section_offset == 0 || header.num_section_entries == 0 {
        return Ok(Vec::new());
    }

    let reader = header.reader(bytes);
    if (header.section_entry_size as u64) < record_size(header.class) {
        return Err(ElfError::MalformedHeader {
            field: HeaderField::SectionHeaderSize,
            value: header.section_entry_size as u64,
        });
    }

    let count = section_count(&reader, header)?;
    let names_index = names_index(&reader, header)?;
    if names_index != SectionIndex::UNDEF && names_index.0 as u64 >= count {
        return Err(ElfError::MalformedHeader {
            field: HeaderField::SectionNamesIndex,
            value: names_index.0 as u64,
        });
    }

    let mut sections = Vec::new();
    for index in 0..count {
        let offset = table_offset(
            header.section_offset,
            index,
            header.section_entry_size as u64,
        )?;
        sections.push(SectionHeader::new(&reader, offset, index as usize)?);
    }

    if names_index != SectionIndex::UNDEF {
        let names = sections[names_index.0 as usize].offset;
        for section in sections.iter_mut() {
            let offset = names
                .checked_add(section.name_index.0 as u64)
                .ok_or(ElfError::OutOfBounds {
                    offset: names,
                    size: section.name_index.0 as u64,
                })?;
            section.name = reader.read_name(to_index(offset)?)?;
        }
    }
    Ok(sections)
}

fn section_count(reader: &Reader, header: &ElfHeader) -> Result<u64, ElfError> {
    if header.num_section_entries as u32 == SectionIndex::LORESERVE.0 {
        Ok(SectionZero::new(reader, header.section_offset)?.size)
    } else {
        Ok(header.num_section_entries as u64)
    }
}

fn names_index(reader: &Reader, header: &ElfHeader) -> Result<SectionIndex, ElfError> {
    if header.string_table_index as u32 == SectionIndex::XINDEX.0 {
        Ok(SectionIndex(
            SectionZero::new(reader, header.section_offset)?.link,
        ))
    } else {
        Ok(SectionIndex(header.string_table_index as u32))
    }
}

impl<'a> SectionHeader<'a> {
    /// The name isn't resolved here, that requires the section name table. Index is
    /// only used for error reporting.
    pub fn new(reader: &Reader<'a>, offset: usize, index: usize) -> Result<Self, ElfError> {
        // Same field order for both classes but flags, sizes, and addresses are wider
        // in 64-bit files.
        let mut s = Stream::new(reader, offset);
        let name_index = StringIndex(s.read_word()?);
        let stype = s.read_word()?;
        let stype = SectionType::from_raw(stype).ok_or(ElfError::MalformedSectionHeader {
            index,
            field: SectionHeaderField::Type,
            value: stype as u64,
        })?;
        Ok(SectionHeader {
            name_index,
            name: Cow::Borrowed(""),
            stype,
            flags: s.read_class_word()?,
            addr: s.read_addr()?,
            offset: s.read_offset()?,
            size: s.read_class_word()?,
            link: s.read_word()?,
            info: s.read_word()?,
            align: s.read_class_word()?,
            entry_size: s.read_class_word()?,
        })
    }

    /// Addressing for the bytes in the section using offsets from the start of the ELF file.
    pub fn obytes(&self) -> Bytes<Offset> {
        Bytes::<Offset>::from_raw(self.offset, self.size)
    }

    /// Addressing for the bytes in the section using virtual addresses.
    pub fn vbytes(&self) -> Bytes<VirtualAddr> {
        Bytes::<VirtualAddr>::from_raw(self.addr, self.size)
    }

    /// Number of bytes the section occupies in the file.
    pub fn file_size(&self) -> u64 {
        if self.stype == SectionType::NoBits {
            0
        } else {
            self.size
        }
    }

    pub fn flags(flags: u64) -> String {
        let mut result = Vec::new();
        if flags & WRITE_FLAG != 0 {
            result.push("WRITE");
        }
        if flags & ALLOC_FLAG != 0 {
            result.push("ALLOC");
        }
        if flags & EXECINSTR_FLAG != 0 {
            result.push("EXEC");
        }
        if flags & MERGE_FLAG != 0 {
            result.push("MERGE");
        }
        if flags & STRINGS_FLAG != 0 {
            result.push("STRINGS");
        }
        if flags & INFO_LINK_FLAG != 0 {
            result.push("INFO");
        }
        if flags & LINK_ORDER_FLAG != 0 {
            result.push("LINK");
        }
        if flags & OS_NONCONFORMING_FLAG != 0 {
            result.push("OS_NONCONFORMING");
        }
        if flags & GROUP_FLAG != 0 {
            result.push("GROUP");
        }
        if flags & TLS_FLAG != 0 {
            result.push("TLS");
        }
        if flags & COMPRESSED_FLAG != 0 {
            result.push("COMPRESSED");
        }
        if flags & MASKOS_FLAG != 0 {
            result.push("MASKOS");
        }
        if flags & MASKPROC_FLAG != 0 {
            result.push("MASKPROC");
        }
        if result.is_empty() {
            result.push("none");
        }
        result.join(" ")
    }
}
