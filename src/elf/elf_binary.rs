//! A fully parsed and validated ELF file.
use super::io::to_index;
use super::{
    ElfError, ElfHeader, ProgramHeader, Reader, SectionHeader, SectionIndex, SectionType,
    SegmentType, StringIndex, Symbol, SymbolTable, VirtualAddr, parse_header,
    parse_program_headers, parse_section_headers, parse_symbol_table,
};
use memmap2::Mmap;

/// Table names in the order they are parsed and stored.
pub const SYMBOL_TABLE_NAMES: [&str; 2] = [".dynsym", ".symtab"];

/// Something that can hand out the bytes of an ELF file. The bytes must not change
/// while anything parsed from them is alive.
pub trait ByteSource {
    fn buffer(&self) -> &[u8];

    fn len(&self) -> usize {
        self.buffer().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteSource for [u8] {
    fn buffer(&self) -> &[u8] {
        self
    }
}

impl ByteSource for Vec<u8> {
    fn buffer(&self) -> &[u8] {
        self.as_slice()
    }
}

impl ByteSource for Mmap {
    fn buffer(&self) -> &[u8] {
        self
    }
}

/// Immutable once parsed. Names (of sections and symbols) point into the source's
/// bytes so the source has to outlive this.
#[derive(Debug)]
pub struct ElfBinary<'a> {
    bytes: &'a [u8],
    header: ElfHeader,
    program_headers: Vec<ProgramHeader>,
    section_headers: Vec<SectionHeader<'a>>,
    symbol_tables: Vec<SymbolTable<'a>>,
}

impl<'a> ElfBinary<'a> {
    /// Either everything parses or nothing does. Missing symbol tables are not
    /// errors, they are returned as not applicable tables.
    pub fn parse<S: ByteSource + ?Sized>(source: &'a S) -> Result<Self, ElfError> {
        let bytes = source.buffer();
        let header = parse_header(bytes)?;
        let program_headers = parse_program_headers(bytes, &header)?;
        let section_headers = parse_section_headers(bytes, &header)?;
        let symbol_tables = SYMBOL_TABLE_NAMES
            .iter()
            .map(|name| parse_symbol_table(name, bytes, &header, &section_headers))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ElfBinary {
            bytes,
            header,
            program_headers,
            section_headers,
            symbol_tables,
        })
    }

    pub fn bytes(&self) -> &'a [u8] {
        self.bytes
    }

    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    pub fn program_headers(&self) -> &[ProgramHeader] {
        &self.program_headers
    }

    pub fn section_headers(&self) -> &[SectionHeader<'a>] {
        &self.section_headers
    }

    /// Always two tables: .dynsym and then .symtab.
    pub fn symbol_tables(&self) -> &[SymbolTable<'a>] {
        &self.symbol_tables
    }

    pub fn symbol_table(&self, name: &str) -> Option<&SymbolTable<'a>> {
        self.symbol_tables.iter().find(|t| t.name == name)
    }

    pub fn dynamic_symbols(&self) -> &SymbolTable<'a> {
        &self.symbol_tables[0]
    }

    pub fn symbols(&self) -> &SymbolTable<'a> {
        &self.symbol_tables[1]
    }

    pub fn section(&self, index: SectionIndex) -> Option<&SectionHeader<'a>> {
        self.section_headers.get(index.0 as usize)
    }

    pub fn section_name(&self, index: SectionIndex) -> Option<&str> {
        self.section(index).map(|s| s.name.as_ref())
    }

    /// Returns the first section with the name.
    pub fn find_section(&self, name: &str) -> Option<(SectionIndex, &SectionHeader<'a>)> {
        self.section_headers
            .iter()
            .enumerate()
            .find(|(_, s)| s.name == name)
            .map(|(i, s)| (SectionIndex(i as u32), s))
    }

    /// The first loadable segment whose memory includes vaddr.
    pub fn find_load_segment(&self, vaddr: VirtualAddr) -> Option<&ProgramHeader> {
        self.program_headers
            .iter()
            .find(|s| s.stype == SegmentType::Load && s.vbytes().contains(vaddr))
    }

    /// The section's bytes within the file. Empty for NOBITS sections.
    pub fn section_data(&self, section: &SectionHeader) -> Result<&'a [u8], ElfError> {
        let reader = self.header.reader(self.bytes);
        reader.slice(to_index(section.offset)?, to_index(section.file_size())?)
    }

    /// Returns a string from an arbitrary string table. Note that index can point into
    /// the middle of a string. The string has to be terminated within the section.
    pub fn find_string(&self, section: SectionIndex, index: StringIndex) -> Option<&'a str> {
        let data = self.section_data(self.section(section)?).ok()?;
        let reader = Reader::new(data, self.header.class, self.header.encoding);
        reader.read_string(index.0 as usize).ok()
    }

    /// All of the non-empty strings in a string table section, with their indices.
    /// Returns nothing for other section types. Strings that aren't UTF-8 or aren't
    /// terminated are skipped.
    pub fn strings(&self, section: &SectionHeader) -> Vec<(StringIndex, &'a str)> {
        let mut result = Vec::new();
        if section.stype != SectionType::StringTable {
            return result;
        }
        let Ok(data) = self.section_data(section) else {
            return result;
        };

        let mut start = 0;
        while let Some(len) = data[start..].iter().position(|&b| b == 0) {
            if len > 0
                && let Ok(s) = std::str::from_utf8(&data[start..start + len])
            {
                result.push((StringIndex(start as u32), s));
            }
            start += len + 1;
        }
        result
    }

    /// Checks .symtab first and then .dynsym.
    pub fn symbol_by_name(&self, name: &str) -> Option<&Symbol<'a>> {
        self.symbol_tables
            .iter()
            .rev()
            .find_map(|t| t.symbol_by_name(name))
    }

    /// Checks .symtab first and then .dynsym.
    pub fn symbol_by_address(&self, addr: u64) -> Option<&Symbol<'a>> {
        self.symbol_tables
            .iter()
            .rev()
            .find_map(|t| t.symbol_by_address(addr))
    }

    /// Checks .symtab first and then .dynsym.
    pub fn symbol_containing(&self, addr: u64) -> Option<&Symbol<'a>> {
        self.symbol_tables
            .iter()
            .rev()
            .find_map(|t| t.symbol_containing(addr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::testing::{ImageBuilder, TestSection, TestSegment, TestSymbol};
    use crate::elf::{ElfClass, FileType, HeaderField};

    fn main_symbol(value: u64) -> TestSymbol {
        TestSymbol {
            name: "main",
            value,
            size: 0x10,
            info: 0x12,
            shndx: 1,
            ..Default::default()
        }
    }

    fn relocatable() -> Vec<u8> {
        let mut builder = ImageBuilder::new(ElfClass::Class64);
        builder
            .sections
            .push(TestSection::new(".text", 1, &[0x31, 0xc0, 0xc3]));
        builder.add_symbols(".symtab", &[main_symbol(0)]);
        builder.build()
    }

    #[test]
    fn minimal_relocatable() {
        let bytes = relocatable();
        let binary = ElfBinary::parse(&bytes).unwrap();
        assert_eq!(binary.header().etype, FileType::Relocatable);
        assert!(binary.program_headers().is_empty());

        let progbits: Vec<_> = binary
            .section_headers()
            .iter()
            .filter(|s| s.stype == SectionType::ProgBits)
            .collect();
        assert_eq!(progbits.len(), 1);
        assert_eq!(progbits[0].name, ".text");

        let main = binary.symbol_by_name("main").unwrap();
        assert_eq!(main.value, 0);
        assert_eq!(binary.symbol_by_address(0).unwrap().name, "main");
        assert!(!binary.dynamic_symbols().is_present());
        assert!(binary.symbols().is_present());
    }

    #[test]
    fn parsing_is_idempotent() {
        let bytes = relocatable();
        let first = ElfBinary::parse(&bytes).unwrap();
        let second = ElfBinary::parse(bytes.as_slice()).unwrap();
        assert_eq!(first.header(), second.header());
        assert_eq!(first.program_headers(), second.program_headers());
        assert_eq!(first.section_headers(), second.section_headers());
        for (a, b) in first.symbol_tables().iter().zip(second.symbol_tables()) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.symbols, b.symbols);
        }
    }

    #[test]
    fn tables_are_always_dynsym_then_symtab() {
        let bytes = ImageBuilder::new(ElfClass::Class32).build();
        let binary = ElfBinary::parse(&bytes).unwrap();
        let names: Vec<_> = binary.symbol_tables().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec![".dynsym", ".symtab"]);
        assert!(binary.symbol_tables().iter().all(|t| !t.is_present()));
        assert!(binary.symbol_by_name("main").is_none());
        assert!(binary.symbol_table(".symtab").is_some());
        assert!(binary.symbol_table(".debug").is_none());
    }

    #[test]
    fn symtab_is_searched_before_dynsym() {
        let mut builder = ImageBuilder::new(ElfClass::Class64);
        builder.etype = 3;
        builder
            .sections
            .push(TestSection::new(".text", 1, &[0xc3; 0x20]));
        builder.add_symbols(".dynsym", &[main_symbol(0x1000)]);
        builder.add_symbols(".symtab", &[main_symbol(0x2000)]);
        let bytes = builder.build();

        let binary = ElfBinary::parse(&bytes).unwrap();
        assert_eq!(binary.dynamic_symbols().len(), 2);
        assert_eq!(binary.symbol_by_name("main").unwrap().value, 0x2000);
        assert_eq!(binary.symbol_by_address(0x1000).unwrap().name, "main");
        assert_eq!(binary.symbol_containing(0x100f).unwrap().value, 0x1000);
        assert!(binary.symbol_containing(0x1010).is_none());
    }

    #[test]
    fn sections_and_strings() {
        let bytes = relocatable();
        let binary = ElfBinary::parse(&bytes).unwrap();

        let (index, text) = binary.find_section(".text").unwrap();
        assert_eq!(index, SectionIndex(1));
        assert_eq!(binary.section_data(text).unwrap(), &[0x31, 0xc0, 0xc3]);
        assert_eq!(binary.section_name(SectionIndex(3)), Some(".strtab"));
        assert_eq!(binary.section_name(SectionIndex(99)), None);

        let (strtab, section) = binary.find_section(".strtab").unwrap();
        assert_eq!(binary.find_string(strtab, StringIndex(1)), Some("main"));
        assert_eq!(binary.find_string(strtab, StringIndex(2)), Some("ain"));
        assert_eq!(binary.find_string(strtab, StringIndex(50)), None);
        assert_eq!(binary.strings(section), vec![(StringIndex(1), "main")]);
        assert!(binary.strings(text).is_empty());

        let (_, names) = binary.find_section(".shstrtab").unwrap();
        let names: Vec<_> = binary.strings(names).into_iter().map(|(_, s)| s).collect();
        assert_eq!(names, vec![".text", ".symtab", ".strtab", ".shstrtab"]);
    }

    #[test]
    fn nobits_have_no_file_data() {
        let mut builder = ImageBuilder::new(ElfClass::Class64);
        let mut bss = TestSection::new(".bss", 8, &[]);
        bss.size = Some(0x1000);
        builder.sections.push(bss);
        let bytes = builder.build();

        let binary = ElfBinary::parse(&bytes).unwrap();
        let (_, bss) = binary.find_section(".bss").unwrap();
        assert_eq!(bss.size, 0x1000);
        assert!(binary.section_data(bss).unwrap().is_empty());
    }

    #[test]
    fn load_segments() {
        let mut builder = ImageBuilder::new(ElfClass::Class64);
        builder.etype = 2;
        builder.segments.push(TestSegment {
            ptype: 4,
            ..Default::default()
        });
        builder.segments.push(TestSegment::default());
        let bytes = builder.build();

        let binary = ElfBinary::parse(&bytes).unwrap();
        let load = binary.find_load_segment(VirtualAddr(0x400010)).unwrap();
        assert_eq!(load.stype, SegmentType::Load);
        assert!(binary.find_load_segment(VirtualAddr(0x400200)).is_none());
    }

    #[test]
    fn failures_abort_the_parse() {
        let mut bytes = relocatable();
        bytes[18] = 0xee;
        bytes[19] = 0xee;
        assert_eq!(
            ElfBinary::parse(&bytes).unwrap_err(),
            ElfError::MalformedHeader {
                field: HeaderField::Machine,
                value: 0xeeee
            }
        );

        let bytes = relocatable();
        assert!(matches!(
            ElfBinary::parse(&bytes[..100]),
            Err(ElfError::OutOfBounds { .. })
        ));

        let empty: Vec<u8> = Vec::new();
        assert!(ElfBinary::parse(&empty).is_err());
    }
}
