use super::tables::{add_field, add_simple};
use crate::commands::tables::{SimpleTableBuilder, TableBuilder};
use crate::elf::{
    ElfBinary, ProgramHeader, SectionHeader, SectionType, Symbol, SymbolIndex, VirtualAddr,
};
use crate::repl::{ExplainArgs, LookupArgs, StringsArgs, SymbolsArgs, TableArgs};
use crate::utils::{self, Styling, uwriteln};
use std::io::Write;

pub fn header(out: impl Write, binary: &ElfBinary, args: &ExplainArgs) {
    let mut b = SimpleTableBuilder::new();

    let header = binary.header();
    add_simple!(b, "type", header.stype(), "type of ELF file");
    add_simple!(b, "class", header.class.name(), "32 or 64 bit layout");
    if header.little_endian() {
        add_simple!(
            b,
            "little endian",
            true,
            "words are laid out in memory with the most significant byte last"
        );
    } else {
        add_simple!(
            b,
            "little endian",
            false,
            "words are laid out in memory with the most significant byte first"
        );
    }
    add_simple!(
        b,
        "osabi",
        header.abi(),
        "the OS the binary was compiled for"
    );
    add_simple!(b, "abiversion", header.abi_version, "zero for most ABIs");
    add_simple!(b, "machine", header.machine(), "CPU architecture");
    add_simple!(b, "version", header.long_version, "always 1");
    add_simple!(b, "entry", "{:x}", header.entry, "address execution starts at");
    add_simple!(b, "flags", "{:x}", header.flags, "processor specific flags");
    add_simple!(
        b,
        "ph_offset",
        "{:x}",
        header.ph_offset,
        "offset in the ELF file to the Program Header table"
    );
    add_simple!(
        b,
        "num_ph_entries",
        binary.program_headers().len(),
        "number of entries in the Program Header table"
    );
    add_simple!(
        b,
        "section_offset",
        "{:x}",
        header.section_offset,
        "offset in the ELF file to the section header table"
    );
    add_simple!(
        b,
        "num_section_entries",
        binary.section_headers().len(),
        "number of entries in the section header table"
    );
    add_simple!(
        b,
        "string_table_index",
        header.string_table_index,
        "section index containing the section names"
    );
    b.writeln(out, args.explain);
}

pub fn segments(mut out: impl Write, binary: &ElfBinary, args: &TableArgs) {
    let mut builder = TableBuilder::new();
    builder.add_col_l("type", "the segment type");
    builder.add_col_r(
        "offset",
        "the offset into the ELF file at which the segment appears",
    );
    builder.add_col_r("vaddr", "the virtual address the segment starts at");
    builder.add_col_r("file size", "the size of the segment on disk");
    builder.add_col_r("memory size", "the size of the segment in memory");
    builder.add_col_r("flags", "readable, writeable, and/or executable");
    builder.add_col_r("align", "alignment of the segment in memory and in the file");

    for segment in binary.program_headers().iter() {
        add_field!(builder, "type", segment.stype.name());
        add_field!(builder, "offset", "{:x}", segment.offset);
        add_field!(builder, "vaddr", "{:x}", segment.vaddr);
        add_field!(builder, "file size", "{:x}", segment.file_size);
        add_field!(builder, "memory size", "{:x}", segment.mem_size);
        add_field!(builder, "flags", "{}", ProgramHeader::flags(segment.flags));
        add_field!(builder, "align", "{:x}", segment.align);
    }

    if builder.num_rows() == 0 {
        uwriteln!(out, "no program headers");
        return;
    }
    builder.writeln(&mut out, args.titles, args.explain);
    if args.explain {
        uwriteln!(out);
        uwriteln!(out, "Numeric fields are all in hex.");
    }
}

pub fn sections(out: impl Write, binary: &ElfBinary, args: &TableArgs) {
    let mut builder = TableBuilder::new();
    builder.add_col_r("index", "index into sections.");
    builder.add_col_l("name", "name from the section name table.");
    builder.add_col_l("type", "type of the section.");
    builder.add_col_r("vaddr", "virtual address at execution.");
    builder.add_col_r(
        "offset",
        "offset into the ELF file for the start of the section.",
    );
    builder.add_col_r("size", "section size in bytes.");
    builder.add_col_r("entry_size", "set if the section holds a table of entries.");
    builder.add_col_r("align", "section alignment.");
    builder.add_col_r(
        "link",
        "link to another section with related information, usually a string or symbol table.",
    );
    builder.add_col_r("info", "additional section info");
    builder.add_col_l("flags", "write, alloc, and/or exec.");

    // Would be kind of nice to sort these by name but they are referenced sometimes
    // by index...
    for (i, section) in binary.section_headers().iter().enumerate() {
        add_field!(builder, "index", i); // sections are often referenced by index so this is handy
        add_field!(builder, "name", section.name);
        add_field!(builder, "type", section.stype.name());
        add_field!(builder, "flags", SectionHeader::flags(section.flags));
        add_field!(builder, "vaddr", "{:x}", section.addr);
        add_field!(builder, "offset", "{:x}", section.offset);
        add_field!(builder, "size", "{:x}", section.size);
        add_field!(builder, "entry_size", section.entry_size);
        add_field!(builder, "align", section.align);
        add_field!(builder, "link", section.link);
        add_field!(builder, "info", section.info);
    }

    builder.writeln(out, args.titles, args.explain);
}

pub fn symbols(mut out: impl Write, binary: &ElfBinary, args: &SymbolsArgs) {
    let table = if args.dynamic {
        binary.dynamic_symbols()
    } else {
        binary.symbols()
    };
    if !table.is_present() {
        uwriteln!(out, "{}: N/A", table.name);
        return;
    }
    if table.truncated_bytes > 0 {
        utils::warn(&format!(
            "{} ends with a partial entry, ignoring the last {} bytes",
            table.name, table.truncated_bytes
        ));
    }

    let mut builder = TableBuilder::new();
    builder.add_col_r("index", "symbol index");
    builder.add_col_l("name", "the symbol name");
    builder.add_col_l("type", "the symbol type");
    builder.add_col_r("value", "address, absolute value, etc (in hex)");
    builder.add_col_r("size", "size of the value, 0 for unknown or undefined");
    builder.add_col_l("binding", "linkage visibility and behavior");
    builder.add_col_l(
        "visibility",
        "whether the symbol is visible outside its object file",
    );
    builder.add_col_l(
        "related",
        "indicates a related section or marks the entry as an absolute value",
    );

    for (i, symbol) in table.symbols.iter().enumerate() {
        if let Some(filter) = &args.filter
            && !symbol.name.contains(filter.as_str())
        {
            continue;
        }
        add_field!(builder, "index", i);
        add_field!(builder, "name", symbol.name);
        add_field!(builder, "type", symbol.stype().name());
        add_field!(builder, "value", "{:x}", symbol.value);
        add_field!(builder, "size", symbol.size);
        add_field!(builder, "binding", symbol.binding().name());
        add_field!(builder, "visibility", symbol.visibility().name());
        add_field!(builder, "related", index_to_str(binary, symbol.index()));
    }

    uwriteln!(out, "{} ({} symbols)", table.name, table.len());
    builder.writeln(out, args.titles, args.explain);
}

pub fn lookup(mut out: impl Write, binary: &ElfBinary, args: &LookupArgs) {
    if let Some(name) = &args.name {
        match binary.symbol_by_name(name) {
            Some(symbol) => {
                uwriteln!(out, "{}", describe(binary, symbol));
            }
            None => utils::warn(&format!("couldn't find a symbol named {name}")),
        }
    } else if let Some(addr) = args.addr {
        let exact = binary.symbol_by_address(addr).filter(|s| !s.name.is_empty());
        match exact.or_else(|| binary.symbol_containing(addr)) {
            Some(symbol) => {
                if symbol.value == addr {
                    uwriteln!(out, "{}", describe(binary, symbol));
                } else {
                    uwriteln!(
                        out,
                        "{}+0x{:x} {}",
                        symbol.name,
                        addr - symbol.value,
                        describe(binary, symbol)
                    );
                }
            }
            None => utils::warn(&format!("couldn't find a symbol at 0x{addr:x}")),
        }
        if let Some(segment) = binary.find_load_segment(VirtualAddr(addr))
            && let Some(offset) = segment.to_offset(VirtualAddr(addr))
        {
            uwriteln!(out, "file offset 0x{:x}", offset.0);
        }
    }
}

pub fn strings(mut out: impl Write, binary: &ElfBinary, args: &StringsArgs) {
    let mut found = false;
    for (index, section) in binary.section_headers().iter().enumerate() {
        if args.index.unwrap_or(index) == index && section.stype == SectionType::StringTable {
            if found {
                uwriteln!(out);
            }
            uwriteln!(out, "section {index} {}", section.name);
            let strings = binary.strings(section);
            let max = if args.max_results == 0 {
                strings.len()
            } else {
                args.max_results
            };
            for (i, s) in strings.iter().take(max) {
                uwriteln!(out, "{}: {s}", i.0);
            }
            if strings.len() > max {
                uwriteln!(out, "...");
            }
            found = true;
        }
    }
    if !found {
        match args.index {
            Some(index) => utils::warn(&format!("section {index} isn't a string table")),
            None => utils::warn("no string tables"),
        }
    }
}

/// Non-interactive report: the header, the program and section headers, and both
/// symbol tables.
pub fn dump(mut out: impl Write, binary: &ElfBinary) {
    let table = TableArgs {
        explain: false,
        titles: true,
    };
    header(&mut out, binary, &ExplainArgs { explain: false });
    uwriteln!(out);
    segments(&mut out, binary, &table);
    uwriteln!(out);
    sections(&mut out, binary, &table);
    for dynamic in [true, false] {
        uwriteln!(out);
        let args = SymbolsArgs {
            dynamic,
            explain: false,
            titles: true,
            filter: None,
        };
        symbols(&mut out, binary, &args);
    }
}

fn describe(binary: &ElfBinary, symbol: &Symbol) -> String {
    format!(
        "{} value=0x{:x} size={} {} {} in {}",
        symbol.name,
        symbol.value,
        symbol.size,
        symbol.binding().name(),
        symbol.stype().name(),
        table_name(binary, symbol).unwrap_or("?"),
    )
}

fn table_name<'b>(binary: &'b ElfBinary, symbol: &Symbol) -> Option<&'b str> {
    binary
        .symbol_tables()
        .iter()
        .find(|t| t.symbols.iter().any(|s| std::ptr::eq(s, symbol)))
        .map(|t| t.name.as_str())
}

fn index_to_str(binary: &ElfBinary, index: SymbolIndex) -> String {
    match index {
        SymbolIndex::Abs => "Value".to_string(),
        SymbolIndex::Common => "Common".to_string(),
        SymbolIndex::Index(i) => binary
            .section_name(i)
            .map(|n| n.to_string())
            .unwrap_or(format!("bad section index {}", i.0)),
        SymbolIndex::Undef => "".to_string(),
        SymbolIndex::XIndex => "extended index".to_string(),
    }
}
