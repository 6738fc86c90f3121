//! Used by the run-time loader. Also see sections.
use super::allow_list::allow_list;
use super::io::{Field, Width, table_offset};
use super::{
    Bytes, ElfClass, ElfError, ElfHeader, HeaderField, Offset, ProgramHeaderField, Reader,
    SectionZero, VirtualAddr,
};

const EXECUTE_FLAG: u32 = 0x1;
const WRITE_FLAG: u32 = 0x2;
const READ_FLAG: u32 = 0x4;

/// e_phnum value meaning the real count is in sh_info of section zero.
pub const PN_XNUM: u16 = 0xffff;

allow_list! {
    pub enum SegmentType: u32 {
        /// Unused entry.
        Null = 0, "NULL";

        /// A loadable segment, described by p_filesz and p_memsz.
        Load = 1, "LOAD";

        /// Specifies dynamic linking information.
        Dynamic = 2, "DYNAMIC";

        /// Location and size of a null-terminated path name to invoke as an interpreter.
        Interpreter = 3, "INTERP";

        /// The location and size of auxiliary information.
        Note = 4, "NOTE";

        /// Reserved but has unspecified semantics.
        Shlib = 5, "SHLIB";

        /// The location and size of the program header table itself.
        Phdr = 6, "PHDR";

        /// The Thread-Local Storage template.
        Tls = 7, "TLS";

        LoProc = 0x70000000, "LOPROC";
        HiProc = 0x7fffffff, "HIPROC";

        /// Location of the .eh_frame_hdr section.
        GnuEhFrame = 0x6474e550, "GNU_EH_FRAME";

        /// Flags say whether the stack should be executable.
        GnuStack = 0x6474e551, "GNU_STACK";

        /// Made read-only after relocation.
        GnuRelro = 0x6474e552, "GNU_RELRO";

        /// Location of the .note.gnu.property section.
        GnuProperty = 0x6474e553, "GNU_PROPERTY";
    }
}

/// Describes a segment. Elf64_Phdr or Elf32_Phdr, see
/// https://llvm.org/doxygen/BinaryFormat_2ELF_8h_source.html
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProgramHeader {
    pub stype: SegmentType,

    /// Read/Write/Execute flags. Always a non-empty combination.
    pub flags: u32,

    /// Offset to the first byte of the segment.
    pub offset: u64,

    /// Virtual address of the first byte in the segment.
    pub vaddr: u64,

    /// Physical address of the first byte in the segment.
    pub paddr: u64,

    /// Number of bytes in the segment in the file.
    pub file_size: u64,

    /// Number of bytes in the segment in memory.
    pub mem_size: u64,

    pub align: u64,
}

/// Where each field lives. Note that p_flags moves as well as changing size.
struct Layout {
    size: u64,
    stype: Field,
    flags: Field,
    offset: Field,
    vaddr: Field,
    paddr: Field,
    file_size: Field,
    mem_size: Field,
    align: Field,
}

const LAYOUT32: Layout = Layout {
    size: 32,
    stype: Field::new(0, Width::Word),
    offset: Field::new(4, Width::Word),
    vaddr: Field::new(8, Width::Word),
    paddr: Field::new(12, Width::Word),
    file_size: Field::new(16, Width::Word),
    mem_size: Field::new(20, Width::Word),
    flags: Field::new(24, Width::Word),
    align: Field::new(28, Width::Word),
};

const LAYOUT64: Layout = Layout {
    size: 56,
    stype: Field::new(0, Width::Word),
    flags: Field::new(4, Width::Word),
    offset: Field::new(8, Width::Xword),
    vaddr: Field::new(16, Width::Xword),
    paddr: Field::new(24, Width::Xword),
    file_size: Field::new(32, Width::Xword),
    mem_size: Field::new(40, Width::Xword),
    align: Field::new(48, Width::Xword),
};

impl Layout {
    fn for_class(class: ElfClass) -> &'static Layout {
        match class {
            ElfClass::Class32 => &LAYOUT32,
            ElfClass::Class64 => &LAYOUT64,
        }
    }
}

/// Returns an empty list for files without program headers (e.g. relocatables).
/// Fails if any program header can't be read or has a bad type or bad flags.
pub fn parse_program_headers(
    bytes: &[u8],
    header: &ElfHeader,
) -> Result<Vec<ProgramHeader>, ElfError> {
    if header.ph_offset == 0 || header.num_ph_entries == 0 {
        return Ok(Vec::new());
    }

    let reader = header.reader(bytes);
    let layout = Layout::for_class(header.class);
    if (header.ph_entry_size as u64) < layout.size {
        return Err(ElfError::MalformedHeader {
            field: HeaderField::ProgramHeaderSize,
            value: header.ph_entry_size as u64,
        });
    }

    let count = program_header_count(&reader, header)?;
    let mut segments = Vec::new();
    for index in 0..count {
        let offset = table_offset(header.ph_offset, index, header.ph_entry_size as u64)?;
        segments.push(ProgramHeader::new(&reader, offset, index as usize)?);
    }
    Ok(segments)
}

/// If there are too many program headers to fit into e_phnum the real count is
/// in section zero so we have to peek at the section table first.
fn program_header_count(reader: &Reader, header: &ElfHeader) -> Result<u64, ElfError> {
    if header.num_ph_entries != PN_XNUM {
        return Ok(header.num_ph_entries as u64);
    }
    if header.section_offset == 0 {
        return Err(ElfError::MalformedHeader {
            field: HeaderField::ProgramHeaderCount,
            value: PN_XNUM as u64,
        });
    }
    let zero = SectionZero::new(reader, header.section_offset)?;
    Ok(zero.info as u64)
}

impl ProgramHeader {
    /// Index is only used for error reporting.
    pub fn new(reader: &Reader, offset: usize, index: usize) -> Result<Self, ElfError> {
        let layout = Layout::for_class(reader.class);
        let read = |field| reader.read_field(offset, field);

        let stype = read(layout.stype)? as u32;
        let stype = SegmentType::from_raw(stype).ok_or(ElfError::MalformedProgramHeader {
            index,
            field: ProgramHeaderField::Type,
            value: stype as u64,
        })?;

        let flags = read(layout.flags)? as u32;
        if !(1..=7).contains(&flags) {
            return Err(ElfError::MalformedProgramHeader {
                index,
                field: ProgramHeaderField::Flags,
                value: flags as u64,
            });
        }

        Ok(ProgramHeader {
            stype,
            flags,
            offset: read(layout.offset)?,
            vaddr: read(layout.vaddr)?,
            paddr: read(layout.paddr)?,
            file_size: read(layout.file_size)?,
            mem_size: read(layout.mem_size)?,
            align: read(layout.align)?,
        })
    }

    /// Addressing for the bytes in the segment using offsets from the start of the ELF file.
    pub fn obytes(&self) -> Bytes<Offset> {
        Bytes::<Offset>::from_raw(self.offset, self.file_size)
    }

    /// Addressing for the bytes in the segment using virtual addresses.
    pub fn vbytes(&self) -> Bytes<VirtualAddr> {
        Bytes::<VirtualAddr>::from_raw(self.vaddr, self.mem_size)
    }

    /// Maps an address inside the segment to a file offset. None if the address isn't
    /// in the segment or is in the part of the segment that isn't backed by the file.
    pub fn to_offset(&self, vaddr: VirtualAddr) -> Option<Offset> {
        if self.vbytes().contains(vaddr) {
            let delta = vaddr.0 - self.vaddr;
            if delta < self.file_size {
                return Some(Offset(self.offset + delta));
            }
        }
        None
    }

    pub fn executable(&self) -> bool {
        self.flags & EXECUTE_FLAG != 0
    }

    pub fn writeable(&self) -> bool {
        self.flags & WRITE_FLAG != 0
    }

    pub fn readable(&self) -> bool {
        self.flags & READ_FLAG != 0
    }

    pub fn flags(flags: u32) -> String {
        let mut result = String::new();
        if flags & READ_FLAG != 0 {
            result.push('r');
        } else {
            result.push('-');
        }
        if flags & WRITE_FLAG != 0 {
            result.push('w');
        } else {
            result.push('-');
        }
        if flags & EXECUTE_FLAG != 0 {
            result.push('x');
        } else {
            result.push('-');
        }
        result
    }
}
