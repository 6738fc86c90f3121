//! Builds small synthetic ELF images for the unit tests. Layout is: header, program
//! headers, section contents (8-byte aligned), the section name table, and finally
//! the section header table. Section zero and .shstrtab are added automatically.
use super::{DataEncoding, ElfClass};

#[derive(Clone, Default)]
pub struct TestSection {
    pub name: String,
    pub stype: u32,
    pub flags: u64,
    pub addr: u64,
    pub data: Vec<u8>,

    /// Overrides the size written to the header, otherwise data.len().
    pub size: Option<u64>,

    pub link: u32,
    pub info: u32,
    pub align: u64,
    pub entry_size: u64,
}

#[derive(Clone)]
pub struct TestSegment {
    pub ptype: u32,
    pub flags: u32,
    pub offset: u64,
    pub vaddr: u64,
    pub paddr: u64,
    pub file_size: u64,
    pub mem_size: u64,
    pub align: u64,
}

impl Default for TestSegment {
    fn default() -> Self {
        TestSegment {
            ptype: 1,
            flags: 0x5,
            offset: 0,
            vaddr: 0x400000,
            paddr: 0x400000,
            file_size: 0x100,
            mem_size: 0x200,
            align: 0x1000,
        }
    }
}

#[derive(Clone, Default)]
pub struct TestSymbol {
    pub name: &'static str,
    pub value: u64,
    pub size: u64,
    pub info: u8,
    pub other: u8,
    pub shndx: u16,
}

pub struct Layout {
    pub ph_offset: u64,

    /// File offset of each added section's contents.
    pub data_offsets: Vec<u64>,

    /// Offset of each added section's name within .shstrtab, .shstrtab itself last.
    pub name_offsets: Vec<u32>,

    pub names_offset: u64,
    pub section_offset: u64,
}

pub struct ImageBuilder {
    pub class: ElfClass,
    pub encoding: DataEncoding,
    pub os_abi: u8,
    pub etype: u16,
    pub machine: u16,
    pub entry: u64,
    pub flags: u32,

    /// Written as section zero.
    pub zero: TestSection,

    pub sections: Vec<TestSection>,
    pub segments: Vec<TestSegment>,

    /// If false the header has no section header table.
    pub section_table: bool,
}

impl TestSection {
    pub fn new(name: &str, stype: u32, data: &[u8]) -> Self {
        TestSection {
            name: name.to_string(),
            stype,
            data: data.to_vec(),
            align: 1,
            ..Default::default()
        }
    }
}

impl ImageBuilder {
    /// Little endian x86-64 relocatable with no program headers and no sections
    /// other than zero and .shstrtab.
    pub fn new(class: ElfClass) -> Self {
        ImageBuilder {
            class,
            encoding: DataEncoding::Lsb,
            os_abi: 0,
            etype: 1,
            machine: 62,
            entry: 0,
            flags: 0,
            zero: TestSection::default(),
            sections: Vec::new(),
            segments: Vec::new(),
            section_table: true,
        }
    }

    /// Adds a symbol table plus its string table (".symtab" pairs with ".strtab",
    /// ".dynsym" with ".dynstr"). A null symbol is always written first.
    pub fn add_symbols(&mut self, table: &str, symbols: &[TestSymbol]) {
        let mut strings = vec![0u8];
        let mut out = self.out();
        out.symbol(0, &TestSymbol::default());
        for symbol in symbols {
            let name = if symbol.name.is_empty() {
                0
            } else {
                let offset = strings.len() as u32;
                strings.extend_from_slice(symbol.name.as_bytes());
                strings.push(0);
                offset
            };
            out.symbol(name, symbol);
        }

        let (stype, strtab) = if table == ".dynsym" {
            (11, ".dynstr")
        } else {
            (2, ".strtab")
        };
        let strtab_index = self.sections.len() as u32 + 2;
        let mut section = TestSection::new(table, stype, &out.bytes);
        section.link = strtab_index;
        section.info = 1;
        section.align = 8;
        section.entry_size = self.symbol_size();
        self.sections.push(section);
        self.sections.push(TestSection::new(strtab, 3, &strings));
    }

    pub fn symbol_size(&self) -> u64 {
        match self.class {
            ElfClass::Class32 => 16,
            ElfClass::Class64 => 24,
        }
    }

    pub fn header_size(&self) -> u64 {
        match self.class {
            ElfClass::Class32 => 52,
            ElfClass::Class64 => 64,
        }
    }

    pub fn ph_entry_size(&self) -> u64 {
        match self.class {
            ElfClass::Class32 => 32,
            ElfClass::Class64 => 56,
        }
    }

    pub fn section_entry_size(&self) -> u64 {
        match self.class {
            ElfClass::Class32 => 40,
            ElfClass::Class64 => 64,
        }
    }

    /// Contents of .shstrtab and the offset of each name in it.
    fn names(&self) -> (Vec<u8>, Vec<u32>) {
        let mut table = vec![0u8];
        let mut offsets = Vec::new();
        let names = self
            .sections
            .iter()
            .map(|s| s.name.as_str())
            .chain(std::iter::once(".shstrtab"));
        for name in names {
            if name.is_empty() {
                offsets.push(0);
            } else {
                offsets.push(table.len() as u32);
                table.extend_from_slice(name.as_bytes());
                table.push(0);
            }
        }
        (table, offsets)
    }

    pub fn layout(&self) -> Layout {
        let mut offset = self.header_size();
        let ph_offset = if self.segments.is_empty() { 0 } else { offset };
        offset += self.segments.len() as u64 * self.ph_entry_size();

        let mut data_offsets = Vec::new();
        for section in self.sections.iter() {
            offset = align8(offset);
            data_offsets.push(offset);
            offset += section.data.len() as u64;
        }

        let (names, name_offsets) = self.names();
        let names_offset = align8(offset);
        let section_offset = align8(names_offset + names.len() as u64);
        Layout {
            ph_offset,
            data_offsets,
            name_offsets,
            names_offset,
            section_offset,
        }
    }

    pub fn build(&self) -> Vec<u8> {
        let layout = self.layout();
        let (names, _) = self.names();
        let num_sections = self.sections.len() as u16 + 2;
        let mut out = self.out();

        // header
        out.bytes.extend_from_slice(&[0x7f, b'E', b'L', b'F']);
        out.u8(self.class.raw());
        out.u8(self.encoding.raw());
        out.u8(1);
        out.u8(self.os_abi);
        out.pad_to(16);
        out.u16(self.etype);
        out.u16(self.machine);
        out.u32(1);
        out.addr(self.entry);
        out.addr(layout.ph_offset);
        out.addr(if self.section_table {
            layout.section_offset
        } else {
            0
        });
        out.u32(self.flags);
        out.u16(self.header_size() as u16);
        out.u16(self.ph_entry_size() as u16);
        out.u16(self.segments.len() as u16);
        out.u16(self.section_entry_size() as u16);
        if self.section_table {
            out.u16(num_sections);
            out.u16(num_sections - 1);
        } else {
            out.u16(0);
            out.u16(0);
        }

        for segment in self.segments.iter() {
            out.segment(segment);
        }

        for (section, offset) in self.sections.iter().zip(layout.data_offsets.iter()) {
            out.pad_to(*offset);
            out.bytes.extend_from_slice(&section.data);
        }
        out.pad_to(layout.names_offset);
        out.bytes.extend_from_slice(&names);

        if self.section_table {
            out.pad_to(layout.section_offset);
            out.section(0, 0, &self.zero);
            for (i, section) in self.sections.iter().enumerate() {
                out.section(layout.name_offsets[i], layout.data_offsets[i], section);
            }
            let shstrtab = TestSection::new(".shstrtab", 3, &names);
            out.section(
                *layout.name_offsets.last().unwrap(),
                layout.names_offset,
                &shstrtab,
            );
        }
        out.bytes
    }

    fn out(&self) -> Out {
        Out {
            class: self.class,
            encoding: self.encoding,
            bytes: Vec::new(),
        }
    }
}

struct Out {
    class: ElfClass,
    encoding: DataEncoding,
    bytes: Vec<u8>,
}

impl Out {
    fn u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn u16(&mut self, value: u16) {
        match self.encoding {
            DataEncoding::Lsb => self.bytes.extend_from_slice(&value.to_le_bytes()),
            DataEncoding::Msb => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn u32(&mut self, value: u32) {
        match self.encoding {
            DataEncoding::Lsb => self.bytes.extend_from_slice(&value.to_le_bytes()),
            DataEncoding::Msb => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn u64(&mut self, value: u64) {
        match self.encoding {
            DataEncoding::Lsb => self.bytes.extend_from_slice(&value.to_le_bytes()),
            DataEncoding::Msb => self.bytes.extend_from_slice(&value.to_be_bytes()),
        }
    }

    fn addr(&mut self, value: u64) {
        match self.class {
            ElfClass::Class32 => self.u32(value as u32),
            ElfClass::Class64 => self.u64(value),
        }
    }

    fn pad_to(&mut self, offset: u64) {
        self.bytes.resize(offset as usize, 0);
    }

    fn segment(&mut self, segment: &TestSegment) {
        match self.class {
            ElfClass::Class32 => {
                self.u32(segment.ptype);
                self.addr(segment.offset);
                self.addr(segment.vaddr);
                self.addr(segment.paddr);
                self.addr(segment.file_size);
                self.addr(segment.mem_size);
                self.u32(segment.flags);
                self.addr(segment.align);
            }
            ElfClass::Class64 => {
                self.u32(segment.ptype);
                self.u32(segment.flags);
                self.addr(segment.offset);
                self.addr(segment.vaddr);
                self.addr(segment.paddr);
                self.addr(segment.file_size);
                self.addr(segment.mem_size);
                self.addr(segment.align);
            }
        }
    }

    fn section(&mut self, name: u32, offset: u64, section: &TestSection) {
        self.u32(name);
        self.u32(section.stype);
        self.addr(section.flags);
        self.addr(section.addr);
        self.addr(offset);
        self.addr(section.size.unwrap_or(section.data.len() as u64));
        self.u32(section.link);
        self.u32(section.info);
        self.addr(section.align);
        self.addr(section.entry_size);
    }

    fn symbol(&mut self, name: u32, symbol: &TestSymbol) {
        match self.class {
            ElfClass::Class32 => {
                self.u32(name);
                self.u32(symbol.value as u32);
                self.u32(symbol.size as u32);
                self.u8(symbol.info);
                self.u8(symbol.other);
                self.u16(symbol.shndx);
            }
            ElfClass::Class64 => {
                self.u32(name);
                self.u8(symbol.info);
                self.u8(symbol.other);
                self.u16(symbol.shndx);
                self.u64(symbol.value);
                self.u64(symbol.size);
            }
        }
    }
}

fn align8(offset: u64) -> u64 {
    (offset + 7) & !7
}

/// Patches little endian values into an image.
pub fn put_u16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

pub fn put_u64(bytes: &mut [u8], offset: usize, value: u64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}
