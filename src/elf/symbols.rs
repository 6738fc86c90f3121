//! Symbol tables map names to addresses (and sizes). Executables normally have a
//! .dynsym table used by the dynamic linker and, unless stripped, a .symtab table
//! with everything the static linker saw.
use super::io::{Field, Width, table_offset, to_index};
use super::{
    ElfClass, ElfError, ElfHeader, Reader, SectionHeader, SectionHeaderField, SectionIndex,
    StringIndex,
};
use rangemap::RangeMap;
use std::borrow::Cow;
use std::collections::HashMap;

/// Elf32_Sym or Elf64_Sym, see https://refspecs.linuxbase.org/elf/gabi4+/ch4.symtab.html
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Symbol<'a> {
    /// Index into the paired string table.
    pub name_index: StringIndex,

    /// Usually points into the ELF bytes, see Reader::read_name. Empty for unnamed
    /// symbols.
    pub name: Cow<'a, str>,

    /// Can be an address, absolute value, etc.
    pub value: u64,

    /// Size of the symbol. Zero if the symbol has no or unknown size.
    pub size: u64,

    /// Type in the low nibble, binding in the high nibble.
    pub info: u8,

    /// Visibility in the low two bits.
    pub other: u8,

    /// Raw st_shndx, see index() for the decoded form.
    pub section: SectionIndex,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolIndex {
    /// Symbol has an absolute value that will not change with relocation.
    Abs,

    /// A common block that has not yet been allocated. Value has alignment.
    Common,

    /// Symbol value refers to another section at this index.
    Index(SectionIndex),

    /// Value is undefined. Linker will fix these up.
    Undef,

    /// Used when Index overflows. Related section will be of type SHT_SYMTAB_SHNDX.
    XIndex,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolVisibility {
    /// Visibility is per binding.
    Default,

    /// Visible only within its object file. CPU may special case this.
    Internal,

    /// Visible only within its object file.
    Hidden,

    /// Visible to other object files but cannot be prempted.
    Protected,
}

/// Linkage visibility and behavior
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolBinding {
    /// Symbol is not visible outside the object file containing its definition. These
    /// will appear before global and weak symbols in the table.
    Local,

    /// Visible to all object files.
    Global,

    /// Similar to Global but has lower precedence. These can be preempted by a Global.
    Weak,

    /// For use by OS or CPU (or not yet assigned).
    Reserved,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolType {
    None,

    /// A data object, variable, array, etc.
    Object,

    /// Function or other executable code.
    Func,

    /// Another section. Used for relocation.
    Section,

    /// Source file associated with the symbol table.
    File,

    /// Uninitialized common blocks. Used by the linker.
    Common,

    /// Thread Local Storage data. Value is an offset to the data.
    Tls,

    /// For use by OS or CPU (or not yet assigned).
    Reserved,
}

/// A named symbol table. If the file doesn't have the table, or doesn't have its
/// string table, the table is "not applicable": it has no sections and no symbols.
#[derive(Clone, Debug)]
pub struct SymbolTable<'a> {
    pub name: String,

    /// The table's own section, None if not applicable.
    pub section: Option<SectionIndex>,

    /// The section holding the symbol names, None if not applicable.
    pub string_section: Option<SectionIndex>,

    /// Trailing bytes that don't make up a full entry. These are ignored.
    pub truncated_bytes: u64,

    /// Every symbol in file order, including the null symbol at index zero.
    pub symbols: Vec<Symbol<'a>>,

    // The indices are into symbols. Later symbols replace earlier ones with the same key.
    by_address: HashMap<u64, usize>,
    by_name: HashMap<Cow<'a, str>, usize>,
    by_range: RangeMap<u64, usize>,
}

struct Layout {
    size: u64,
    name: Field,
    value: Field,
    size_field: Field,
    info: Field,
    other: Field,
    section: Field,
}

const LAYOUT32: Layout = Layout {
    size: 16,
    name: Field::new(0, Width::Word),
    value: Field::new(4, Width::Word),
    size_field: Field::new(8, Width::Word),
    info: Field::new(12, Width::Byte),
    other: Field::new(13, Width::Byte),
    section: Field::new(14, Width::Half),
};

// Fields are rearranged so that the 8-byte ones are aligned.
const LAYOUT64: Layout = Layout {
    size: 24,
    name: Field::new(0, Width::Word),
    info: Field::new(4, Width::Byte),
    other: Field::new(5, Width::Byte),
    section: Field::new(6, Width::Half),
    value: Field::new(8, Width::Xword),
    size_field: Field::new(16, Width::Xword),
};

impl Layout {
    fn for_class(class: ElfClass) -> &'static Layout {
        match class {
            ElfClass::Class32 => &LAYOUT32,
            ElfClass::Class64 => &LAYOUT64,
        }
    }
}

/// The string table for ".symtab" is ".strtab" and for ".dynsym" it's ".dynstr".
pub fn string_table_name(table: &str) -> String {
    table.replacen("sym", "str", 1)
}

/// Returns a not applicable table if either the symbol section or its string section
/// is missing. Sections are matched by name and if there are duplicate names the last
/// one is used.
pub fn parse_symbol_table<'a>(
    name: &str,
    bytes: &'a [u8],
    header: &ElfHeader,
    sections: &[SectionHeader<'a>],
) -> Result<SymbolTable<'a>, ElfError> {
    let strings_name = string_table_name(name);
    let (Some(index), Some(strings_index)) =
        (find_last(sections, name), find_last(sections, &strings_name))
    else {
        return Ok(SymbolTable::not_applicable(name));
    };
    let section = &sections[index];
    let strings = &sections[strings_index];

    let layout = Layout::for_class(header.class);
    if section.entry_size < layout.size {
        return Err(ElfError::MalformedSectionHeader {
            index,
            field: SectionHeaderField::EntrySize,
            value: section.entry_size,
        });
    }

    let count = section.size / section.entry_size;

    let reader = header.reader(bytes);
    let mut table = SymbolTable {
        name: name.to_string(),
        section: Some(SectionIndex(index as u32)),
        string_section: Some(SectionIndex(strings_index as u32)),
        truncated_bytes: section.size % section.entry_size,
        symbols: Vec::new(),
        by_address: HashMap::new(),
        by_name: HashMap::new(),
        by_range: RangeMap::new(),
    };
    for i in 0..count {
        let offset = table_offset(section.offset, i, section.entry_size)?;
        let symbol = Symbol::new(&reader, offset, layout, strings.offset)?;
        table.push(symbol);
    }
    Ok(table)
}

fn find_last(sections: &[SectionHeader], name: &str) -> Option<usize> {
    sections.iter().rposition(|s| s.name == name)
}

impl<'a> SymbolTable<'a> {
    pub fn not_applicable(name: &str) -> Self {
        SymbolTable {
            name: name.to_string(),
            section: None,
            string_section: None,
            truncated_bytes: 0,
            symbols: Vec::new(),
            by_address: HashMap::new(),
            by_name: HashMap::new(),
            by_range: RangeMap::new(),
        }
    }

    /// False for the not applicable table. Note that a table can be present but have
    /// no symbols.
    pub fn is_present(&self) -> bool {
        self.section.is_some()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// If more than one symbol has this value the last one is returned.
    pub fn symbol_by_address(&self, addr: u64) -> Option<&Symbol<'a>> {
        self.by_address.get(&addr).map(|&i| &self.symbols[i])
    }

    /// If more than one symbol has this name the last one is returned.
    pub fn symbol_by_name(&self, name: &str) -> Option<&Symbol<'a>> {
        self.by_name.get(name).map(|&i| &self.symbols[i])
    }

    /// Returns the symbol whose [value, value + size) range includes addr. Symbols
    /// with no size are never returned.
    pub fn symbol_containing(&self, addr: u64) -> Option<&Symbol<'a>> {
        self.by_range.get(&addr).map(|&i| &self.symbols[i])
    }

    fn push(&mut self, symbol: Symbol<'a>) {
        let index = self.symbols.len();
        self.by_address.insert(symbol.value, index);
        if !symbol.name.is_empty() {
            self.by_name.insert(symbol.name.clone(), index);
        }
        // RangeMap can't hold a range ending past u64::MAX.
        if symbol.size > 0
            && let Some(end) = symbol.value.checked_add(symbol.size)
        {
            self.by_range.insert(symbol.value..end, index);
        }
        self.symbols.push(symbol);
    }
}

impl<'a> Symbol<'a> {
    fn new(
        reader: &Reader<'a>,
        offset: usize,
        layout: &Layout,
        strings_offset: u64,
    ) -> Result<Self, ElfError> {
        let read = |field| reader.read_field(offset, field);
        let name_index = StringIndex(read(layout.name)? as u32);
        let name_offset = strings_offset
            .checked_add(name_index.0 as u64)
            .ok_or(ElfError::OutOfBounds {
                offset: strings_offset,
                size: name_index.0 as u64,
            })?;
        Ok(Symbol {
            name_index,
            name: reader.read_name(to_index(name_offset)?)?,
            value: read(layout.value)?,
            size: read(layout.size_field)?,
            info: read(layout.info)? as u8,
            other: read(layout.other)? as u8,
            section: SectionIndex(read(layout.section)? as u32),
        })
    }

    pub fn stype(&self) -> SymbolType {
        SymbolType::from_u8(self.info)
    }

    pub fn binding(&self) -> SymbolBinding {
        SymbolBinding::from_u8(self.info)
    }

    pub fn visibility(&self) -> SymbolVisibility {
        SymbolVisibility::from_u8(self.other)
    }

    pub fn index(&self) -> SymbolIndex {
        SymbolIndex::from_u16(self.section.0 as u16)
    }
}

impl SymbolIndex {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => SymbolIndex::Undef,
            0xfff1 => SymbolIndex::Abs,
            0xfff2 => SymbolIndex::Common,
            0xffff => SymbolIndex::XIndex,
            _ => SymbolIndex::Index(SectionIndex(value as u32)),
        }
    }
}

impl SymbolVisibility {
    pub fn from_u8(value: u8) -> Self {
        match value & 0x3 {
            0 => SymbolVisibility::Default,
            1 => SymbolVisibility::Internal,
            2 => SymbolVisibility::Hidden,
            _ => SymbolVisibility::Protected,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SymbolVisibility::Default => "DEFAULT",
            SymbolVisibility::Internal => "INTERNAL",
            SymbolVisibility::Hidden => "HIDDEN",
            SymbolVisibility::Protected => "PROTECTED",
        }
    }
}

impl SymbolBinding {
    pub fn from_u8(value: u8) -> Self {
        match value >> 4 {
            0 => SymbolBinding::Local,
            1 => SymbolBinding::Global,
            2 => SymbolBinding::Weak,
            _ => SymbolBinding::Reserved,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SymbolBinding::Local => "LOCAL",
            SymbolBinding::Global => "GLOBAL",
            SymbolBinding::Weak => "WEAK",
            SymbolBinding::Reserved => "RESERVED",
        }
    }
}

impl SymbolType {
    pub fn from_u8(value: u8) -> Self {
        match value & 0xf {
            0 => SymbolType::None,
            1 => SymbolType::Object,
            2 => SymbolType::Func,
            3 => SymbolType::Section,
            4 => SymbolType::File,
            5 => SymbolType::Common,
            6 => SymbolType::Tls,
            _ => SymbolType::Reserved,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SymbolType::None => "NOTYPE",
            SymbolType::Object => "OBJECT",
            SymbolType::Func => "FUNC",
            SymbolType::Section => "SECTION",
            SymbolType::File => "FILE",
            SymbolType::Common => "COMMON",
            SymbolType::Tls => "TLS",
            SymbolType::Reserved => "RESERVED",
        }
    }
}
