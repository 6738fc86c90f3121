//! The ELF header which starts every ELF file. It identifies the file (magic, class,
//! byte order, target OS and CPU) and says where the program and section header
//! tables are.
use super::allow_list::allow_list;
use super::{ElfError, HeaderField, Reader, Stream};

pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of e_ident, the identification bytes at the start of the header.
pub const EI_NIDENT: usize = 16;

/// The only defined value for both the short (e_ident) and long (e_version) versions.
pub const EV_CURRENT: u32 = 1;

allow_list! {
    /// Whether addresses and offsets are 32 or 64 bits. This determines the size and,
    /// for some records, the order of fields everywhere else in the file.
    pub enum ElfClass: u8 {
        Class32 = 1, "ELF32";
        Class64 = 2, "ELF64";
    }
}

allow_list! {
    /// Byte order of multi-byte fields.
    pub enum DataEncoding: u8 {
        Lsb = 1, "2's complement, little endian";
        Msb = 2, "2's complement, big endian";
    }
}

allow_list! {
    /// The OS (or ABI) the binary targets.
    pub enum OsAbi: u8 {
        SystemV = 0, "UNIX System V ABI";
        HpUx = 1, "HP-UX ABI";
        NetBsd = 2, "NetBSD ABI";
        Linux = 3, "Linux ABI";
        Solaris = 6, "Solaris ABI";
        Irix = 8, "IRIX ABI";
        FreeBsd = 9, "FreeBSD ABI";
        Tru64 = 10, "TRU64 Unix ABI";
        Arm = 97, "ARM architecture ABI";
        Standalone = 255, "Stand-alone (embedded) ABI";
    }
}

allow_list! {
    pub enum FileType: u16 {
        /// Object file, input to the static linker.
        Relocatable = 1, "Relocatable";
        Executable = 2, "Executable";
        /// Shared library or position independent executable.
        SharedObject = 3, "Shared Object";
        Core = 4, "Core dump";
    }
}

allow_list! {
    /// CPU architecture the binary requires.
    pub enum Machine: u16 {
        M32 = 1, "AT&T WE 32100";
        Sparc = 2, "Sun Microsystems SPARC";
        I386 = 3, "Intel 80386";
        M68k = 4, "Motorola 68000";
        M88k = 5, "Motorola 88000";
        I860 = 7, "Intel 80860";
        Mips = 8, "MIPS RS3000 (big-endian only)";
        Parisc = 15, "HP/PA";
        Sparc32Plus = 18, "SPARC with enhanced instruction set";
        Ppc = 20, "PowerPC";
        Ppc64 = 21, "PowerPC 64-bit";
        S390 = 22, "IBM S/390";
        Arm = 40, "Advanced RISC Machines";
        SuperH = 42, "Renesas SuperH";
        SparcV9 = 43, "SPARC v9 64-bit";
        Ia64 = 50, "Intel Itanium";
        X86_64 = 62, "AMD x86-64";
        Vax = 75, "DEC Vax";
        AArch64 = 183, "ARM 64-bit";
        RiscV = 243, "RISC-V";
    }
}

impl ElfClass {
    /// The only e_ehsize allowed for this class.
    pub fn header_size(self) -> u16 {
        match self {
            ElfClass::Class32 => 52,
            ElfClass::Class64 => 64,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ElfHeader {
    pub class: ElfClass,
    pub encoding: DataEncoding,

    /// Version from the identification bytes.
    pub short_version: u8,

    pub os_abi: OsAbi,

    /// Zero if standards conforming.
    pub abi_version: u8,

    pub etype: FileType,
    pub machine: Machine,

    /// Version from e_version.
    pub long_version: u32,

    /// Virtual address execution starts at. Zero if the file isn't executable.
    pub entry: u64,

    /// File offset of the program header table, zero if there isn't one.
    pub ph_offset: u64,

    /// File offset of the section header table, zero if there isn't one.
    pub section_offset: u64,

    /// Processor specific flags.
    pub flags: u32,

    pub header_size: u16,
    pub ph_entry_size: u16,

    /// Can be PN_XNUM in which case the real count is in section zero.
    pub num_ph_entries: u16,

    pub section_entry_size: u16,

    /// Can be SHN_LORESERVE in which case the real count is in section zero.
    pub num_section_entries: u16,

    /// Section containing the section names. Can be SHN_XINDEX in which case the
    /// real index is in section zero.
    pub string_table_index: u16,
}

pub fn parse_header(bytes: &[u8]) -> Result<ElfHeader, ElfError> {
    ElfHeader::new(bytes)
}

fn malformed(field: HeaderField, value: impl Into<u64>) -> ElfError {
    ElfError::MalformedHeader {
        field,
        value: value.into(),
    }
}

impl ElfHeader {
    /// Validation stops at the first bad field, checking fields in file order.
    pub fn new(bytes: &[u8]) -> Result<Self, ElfError> {
        // Single bytes don't care about class or byte order.
        let ident = Reader::new(bytes, ElfClass::Class64, DataEncoding::Lsb);
        if ident.slice(0, ELF_MAGIC.len())? != &ELF_MAGIC[..] {
            return Err(ElfError::BadMagic);
        }

        let class = ident.read_byte(4)?;
        let class = ElfClass::from_raw(class).ok_or(malformed(HeaderField::Class, class))?;
        let data = ident.read_byte(5)?;
        let encoding = DataEncoding::from_raw(data).ok_or(malformed(HeaderField::Data, data))?;

        // Field sizes differ between 32-bit and 64-bit ELF files, see
        // https://llvm.org/doxygen/BinaryFormat_2ELF_8h_source.html.
        let reader = Reader::new(bytes, class, encoding);
        let mut s = Stream::new(&reader, 6);
        let short_version = s.read_byte()?;
        let os_abi = s.read_byte()?;
        let abi_version = s.read_byte()?;

        s.offset = EI_NIDENT;
        let etype = s.read_half()?;
        let machine = s.read_half()?;
        let long_version = s.read_word()?;
        let entry = s.read_addr()?;
        let ph_offset = s.read_offset()?;
        let section_offset = s.read_offset()?;
        let flags = s.read_word()?;
        let header_size = s.read_half()?;
        let ph_entry_size = s.read_half()?;
        let num_ph_entries = s.read_half()?;
        let section_entry_size = s.read_half()?;
        let num_section_entries = s.read_half()?;
        let string_table_index = s.read_half()?;

        if short_version as u32 != EV_CURRENT {
            return Err(malformed(HeaderField::ShortVersion, short_version));
        }
        let os_abi = OsAbi::from_raw(os_abi).ok_or(malformed(HeaderField::OsAbi, os_abi))?;
        if abi_version != 0 {
            return Err(malformed(HeaderField::AbiVersion, abi_version));
        }
        let etype = FileType::from_raw(etype).ok_or(malformed(HeaderField::Type, etype))?;
        let machine =
            Machine::from_raw(machine).ok_or(malformed(HeaderField::Machine, machine))?;
        if long_version != EV_CURRENT {
            return Err(malformed(HeaderField::LongVersion, long_version));
        }
        if header_size != class.header_size() {
            return Err(malformed(HeaderField::HeaderSize, header_size));
        }

        Ok(ElfHeader {
            class,
            encoding,
            short_version,
            os_abi,
            abi_version,
            etype,
            machine,
            long_version,
            entry,
            ph_offset,
            section_offset,
            flags,
            header_size,
            ph_entry_size,
            num_ph_entries,
            section_entry_size,
            num_section_entries,
            string_table_index,
        })
    }

    /// Reader over bytes using this header's class and byte order.
    pub fn reader<'a>(&self, bytes: &'a [u8]) -> Reader<'a> {
        Reader::new(bytes, self.class, self.encoding)
    }

    pub fn little_endian(&self) -> bool {
        self.encoding == DataEncoding::Lsb
    }

    pub fn sixty_four_bit(&self) -> bool {
        self.class == ElfClass::Class64
    }

    pub fn stype(&self) -> &'static str {
        self.etype.name()
    }

    pub fn abi(&self) -> &'static str {
        self.os_abi.name()
    }

    pub fn machine(&self) -> &'static str {
        self.machine.name()
    }
}
