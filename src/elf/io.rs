use super::{DataEncoding, ElfClass, ElfError};
use std::borrow::Cow;

/// Size of a single integer read.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Width {
    Byte,
    Half,
    Word,
    Xword,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
            Width::Word => 4,
            Width::Xword => 8,
        }
    }
}

/// Location of one field within a fixed size record. Records whose field order
/// differs between 32 and 64 bit files are described with a table of these per class.
#[derive(Clone, Copy, Debug)]
pub struct Field {
    pub offset: usize,
    pub width: Width,
}

impl Field {
    pub const fn new(offset: usize, width: Width) -> Self {
        Field { offset, width }
    }
}

/// Bounds checked view of the bytes in an ELF file. Every read goes through slice()
/// so there is exactly one place where we check against the end of the buffer.
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    pub class: ElfClass,
    pub encoding: DataEncoding,
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8], class: ElfClass, encoding: DataEncoding) -> Self {
        Reader {
            class,
            encoding,
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sixty_four_bit(&self) -> bool {
        self.class == ElfClass::Class64
    }

    pub fn slice(&self, offset: usize, size: usize) -> Result<&'a [u8], ElfError> {
        let end = offset.checked_add(size).ok_or(ElfError::OutOfBounds {
            offset: offset as u64,
            size: size as u64,
        })?;
        self.bytes.get(offset..end).ok_or(ElfError::OutOfBounds {
            offset: offset as u64,
            size: size as u64,
        })
    }

    /// Reads an unsigned integer of the given width using the file's byte order.
    pub fn read_uint(&self, offset: usize, width: Width) -> Result<u64, ElfError> {
        match width {
            Width::Byte => self.read_byte(offset).map(u64::from),
            Width::Half => self.read_half(offset).map(u64::from),
            Width::Word => self.read_word(offset).map(u64::from),
            Width::Xword => self.read_xword(offset),
        }
    }

    /// Reads a field of a record that starts at base.
    pub fn read_field(&self, base: usize, field: Field) -> Result<u64, ElfError> {
        let offset = base
            .checked_add(field.offset)
            .ok_or(ElfError::OutOfBounds {
                offset: base as u64,
                size: field.width.bytes() as u64,
            })?;
        self.read_uint(offset, field.width)
    }

    pub fn read_byte(&self, offset: usize) -> Result<u8, ElfError> {
        let [byte] = self.array::<1>(offset)?;
        Ok(byte)
    }

    pub fn read_half(&self, offset: usize) -> Result<u16, ElfError> {
        let bytes = self.array(offset)?;
        match self.encoding {
            DataEncoding::Lsb => Ok(u16::from_le_bytes(bytes)),
            DataEncoding::Msb => Ok(u16::from_be_bytes(bytes)),
        }
    }

    pub fn read_word(&self, offset: usize) -> Result<u32, ElfError> {
        let bytes = self.array(offset)?;
        match self.encoding {
            DataEncoding::Lsb => Ok(u32::from_le_bytes(bytes)),
            DataEncoding::Msb => Ok(u32::from_be_bytes(bytes)),
        }
    }

    pub fn read_xword(&self, offset: usize) -> Result<u64, ElfError> {
        let bytes = self.array(offset)?;
        match self.encoding {
            DataEncoding::Lsb => Ok(u64::from_le_bytes(bytes)),
            DataEncoding::Msb => Ok(u64::from_be_bytes(bytes)),
        }
    }

    /// Read either a u32 or u64 word depending on whether the file is 64-bit.
    /// But, for sanity, always return the result as 64 bits.
    pub fn read_addr(&self, offset: usize) -> Result<u64, ElfError> {
        if self.sixty_four_bit() {
            self.read_xword(offset)
        } else {
            Ok(self.read_word(offset)? as u64)
        }
    }

    /// Read a null-terminated string. The returned str points into the file's bytes.
    pub fn read_string(&self, offset: usize) -> Result<&'a str, ElfError> {
        let bytes = self.read_cstr(offset)?;
        std::str::from_utf8(bytes).map_err(|_| ElfError::InvalidString {
            offset: offset as u64,
        })
    }

    /// Like read_string but for section and symbol names which the format allows to
    /// be arbitrary bytes. Invalid UTF-8 is replaced with U+FFFD.
    pub fn read_name(&self, offset: usize) -> Result<Cow<'a, str>, ElfError> {
        let bytes = self.read_cstr(offset)?;
        Ok(String::from_utf8_lossy(bytes))
    }

    /// The bytes up to (but not including) the null terminator.
    pub fn read_cstr(&self, offset: usize) -> Result<&'a [u8], ElfError> {
        let rest = self.bytes.get(offset..).ok_or(ElfError::OutOfBounds {
            offset: offset as u64,
            size: 1,
        })?;
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ElfError::OutOfBounds {
                offset: offset as u64,
                size: rest.len() as u64 + 1,
            })?;
        Ok(&rest[..len])
    }

    fn array<const N: usize>(&self, offset: usize) -> Result<[u8; N], ElfError> {
        let slice = self.slice(offset, N)?;
        let mut array = [0; N];
        array.copy_from_slice(slice);
        Ok(array)
    }
}

/// Converts a file offset into an index into the buffer.
pub fn to_index(offset: u64) -> Result<usize, ElfError> {
    usize::try_from(offset).map_err(|_| ElfError::OutOfBounds { offset, size: 0 })
}

/// File offset of entry index within a table of entry_size records starting at base.
pub fn table_offset(base: u64, index: u64, entry_size: u64) -> Result<usize, ElfError> {
    index
        .checked_mul(entry_size)
        .and_then(|delta| base.checked_add(delta))
        .ok_or(ElfError::OutOfBounds {
            offset: base,
            size: entry_size,
        })
        .and_then(to_index)
}

/// Sequential reads over a Reader.
pub struct Stream<'r, 'a> {
    pub reader: &'r Reader<'a>,
    pub offset: usize,
}

impl<'r, 'a> Stream<'r, 'a> {
    pub fn new(reader: &'r Reader<'a>, offset: usize) -> Self {
        Stream { reader, offset }
    }

    pub fn read_byte(&mut self) -> Result<u8, ElfError> {
        let byte = self.reader.read_byte(self.offset)?;
        self.offset += 1;
        Ok(byte)
    }

    pub fn read_half(&mut self) -> Result<u16, ElfError> {
        let half = self.reader.read_half(self.offset)?;
        self.offset += 2;
        Ok(half)
    }

    pub fn read_word(&mut self) -> Result<u32, ElfError> {
        let word = self.reader.read_word(self.offset)?;
        self.offset += 4;
        Ok(word)
    }

    pub fn read_xword(&mut self) -> Result<u64, ElfError> {
        let xword = self.reader.read_xword(self.offset)?;
        self.offset += 8;
        Ok(xword)
    }

    pub fn read_addr(&mut self) -> Result<u64, ElfError> {
        let addr = self.reader.read_addr(self.offset)?;
        self.offset += self.class_size();
        Ok(addr)
    }

    pub fn read_offset(&mut self) -> Result<u64, ElfError> {
        self.read_addr()
    }

    /// Fields like section flags and sizes are Elf32_Word in 32-bit files and
    /// Elf64_Xword in 64-bit files.
    pub fn read_class_word(&mut self) -> Result<u64, ElfError> {
        self.read_addr()
    }

    fn class_size(&self) -> usize {
        if self.reader.sixty_four_bit() { 8 } else { 4 }
    }
}
