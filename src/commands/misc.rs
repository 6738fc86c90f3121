use crate::elf::{ElfBinary, SectionIndex};
use crate::repl::{HexdumpArgs, HexdumpLabels};
use crate::utils::{Styling, uwrite, uwriteln, warn};
use std::io::Write;

pub fn hexdump(out: impl Write, binary: &ElfBinary, args: &HexdumpArgs) {
    if let Some(index) = args.section {
        let Some(section) = binary.section(SectionIndex(index as u32)) else {
            warn(&format!("there is no section {index}"));
            return;
        };
        match binary.section_data(section) {
            Ok(data) if data.is_empty() => warn(&format!("{} has no file data", section.name)),
            Ok(data) => {
                let data = &data[..args.count.min(data.len())];
                write_hex(out, section.addr, data, args.labels);
            }
            Err(err) => warn(&format!("couldn't read {}: {err}", section.name)),
        }
    } else {
        let bytes = binary.bytes();
        let offset = args.offset.unwrap_or(0);
        if offset >= bytes.len() as u64 {
            warn(&format!(
                "offset 0x{offset:x} is past the end of the file (0x{:x} bytes)",
                bytes.len()
            ));
            return;
        }
        let start = offset as usize;
        let end = start.saturating_add(args.count).min(bytes.len());
        write_hex(out, offset, &bytes[start..end], args.labels);
    }
}

/// Sixteen bytes per line: two groups of eight hex bytes followed by the printable
/// ascii characters. addr is used for HexdumpLabels::Addr.
pub fn write_hex(mut out: impl Write, addr: u64, data: &[u8], labels: HexdumpLabels) {
    for (row, chunk) in data.chunks(16).enumerate() {
        let delta = row * 16;
        match labels {
            HexdumpLabels::None => (),
            HexdumpLabels::Addr => {
                let label = format!("{:012x}: ", addr.wrapping_add(delta as u64));
                uwrite!(out, "{}", label.hex_offset());
            }
            HexdumpLabels::Zero => {
                uwrite!(out, "{}", format!("{delta:04x}: ").hex_offset());
            }
        }

        for j in 0..16 {
            if j == 8 {
                uwrite!(out, " ");
            }
            match chunk.get(j) {
                Some(byte) => {
                    uwrite!(out, "{}", format!("{byte:02x} ").hex_hex());
                }
                None => {
                    uwrite!(out, "   ");
                }
            }
        }

        uwrite!(out, "  ");
        let ascii: String = chunk
            .iter()
            .map(|&b| {
                let ch = b as char;
                if ch.is_ascii_graphic() { ch } else { '.' }
            })
            .collect();
        uwriteln!(out, "{}", ascii.hex_ascii());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::ElfClass;
    use crate::elf::testing::{ImageBuilder, TestSection};
    use crate::utils::command_output;

    #[test]
    fn rows_and_groups() {
        let data: Vec<u8> = (b'A'..b'A' + 20).collect();
        let text = command_output!(write_hex, 0x1000, &data, HexdumpLabels::Zero);
        let lines: Vec<_> = text.lines().map(|l| l.trim_end()).collect();
        assert_eq!(
            lines[0],
            "0000: 41 42 43 44 45 46 47 48  49 4a 4b 4c 4d 4e 4f 50   ABCDEFGHIJKLMNOP"
        );
        assert!(lines[1].starts_with("0010: 51 52 53 54    "), "{text}");
        assert!(lines[1].ends_with("QRST"), "{text}");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn labels() {
        let data = [0u8, 0x7f, b' ', b'z'];
        let text = command_output!(write_hex, 0x401000, &data, HexdumpLabels::Addr);
        assert!(text.starts_with("000000401000: 00 7f 20 7a"), "{text}");
        assert!(text.trim_end().ends_with("...z"), "{text}");

        let text = command_output!(write_hex, 0x401000, &data, HexdumpLabels::None);
        assert!(text.starts_with("00 7f 20 7a"), "{text}");
    }

    #[test]
    fn addresses_wrap() {
        let data = [0xaa; 20];
        let text = command_output!(write_hex, u64::MAX - 3, &data, HexdumpLabels::Addr);
        let lines: Vec<_> = text.lines().collect();
        assert!(lines[0].starts_with("fffffffffffffffc: aa aa"), "{text}");
        assert!(lines[1].starts_with("00000000000c: aa aa aa aa"), "{text}");
    }

    #[test]
    fn section_and_offset_sources() {
        let mut builder = ImageBuilder::new(ElfClass::Class64);
        let mut data = TestSection::new(".data", 1, b"hello world");
        data.addr = 0x2000;
        builder.sections.push(data);
        let bytes = builder.build();
        let binary = ElfBinary::parse(&bytes).unwrap();

        let args = HexdumpArgs {
            section: Some(1),
            offset: None,
            count: 5,
            labels: HexdumpLabels::Addr,
        };
        let text = command_output!(hexdump, &binary, &args);
        assert!(text.starts_with("000000002000: 68 65 6c 6c 6f"), "{text}");
        assert!(text.trim_end().ends_with("hello"), "{text}");

        let args = HexdumpArgs {
            section: None,
            offset: Some(1),
            count: 3,
            labels: HexdumpLabels::Zero,
        };
        let text = command_output!(hexdump, &binary, &args);
        assert!(text.starts_with("0000: 45 4c 46"), "{text}");
        assert!(text.trim_end().ends_with("ELF"), "{text}");

        let args = HexdumpArgs {
            section: None,
            offset: Some(bytes.len() as u64),
            count: 3,
            labels: HexdumpLabels::Zero,
        };
        assert!(command_output!(hexdump, &binary, &args).is_empty());
    }
}
