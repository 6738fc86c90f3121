use std::fmt;
use std::ops::Add;

/// Index into the section table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SectionIndex(pub u32);

/// Index into a string table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct StringIndex(pub u32);

/// An index into a byte within an ELF file.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Offset(pub u64);

/// The address of a byte once the binary has been loaded into memory.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VirtualAddr(pub u64);

/// A range of bytes that can be addressed using either offsets into an ELF file or
/// virtual addresses. Sections and segments can be addressed both ways (though
/// sections that aren't allocated have a zero address).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Bytes<A>
where
    A: Add<u64, Output = A> + Copy + Ord,
{
    pub start: A,
    pub size: u64,
}

impl Bytes<Offset> {
    pub fn from_raw(start: u64, size: u64) -> Self {
        Bytes {
            start: Offset(start),
            size,
        }
    }
}

impl Bytes<VirtualAddr> {
    pub fn from_raw(start: u64, size: u64) -> Self {
        Bytes {
            start: VirtualAddr(start),
            size,
        }
    }
}

impl<A: Add<u64, Output = A> + Copy + Ord> Bytes<A> {
    pub fn contains(&self, addr: A) -> bool {
        addr >= self.start && addr < self.end()
    }

    pub fn end(&self) -> A {
        self.start + self.size
    }
}

impl SectionIndex {
    /// Undefined, missing, irrelevant, or otherwise meaningless section reference.
    pub const UNDEF: SectionIndex = SectionIndex(0);

    /// Start of the range of reserved indices, also used as the "too many sections" escape.
    pub const LORESERVE: SectionIndex = SectionIndex(0xff00);

    /// The real index lives elsewhere (e.g. sh_link of section zero).
    pub const XINDEX: SectionIndex = SectionIndex(0xffff);
}

// Wrapping so that a bogus size can't panic in debug builds. Callers that care
// about overflow check before constructing the range.
impl Add<u64> for VirtualAddr {
    type Output = VirtualAddr;

    fn add(self, rhs: u64) -> Self::Output {
        VirtualAddr(self.0.wrapping_add(rhs))
    }
}

impl Add<u64> for Offset {
    type Output = Offset;

    fn add(self, rhs: u64) -> Self::Output {
        Offset(self.0.wrapping_add(rhs))
    }
}

impl fmt::LowerHex for VirtualAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

impl fmt::LowerHex for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        let bytes = Bytes::<VirtualAddr>::from_raw(0x1000, 0x10);
        assert!(bytes.contains(VirtualAddr(0x1000)));
        assert!(bytes.contains(VirtualAddr(0x100f)));
        assert!(!bytes.contains(VirtualAddr(0x1010)));
        assert!(!bytes.contains(VirtualAddr(0xfff)));
        assert_eq!(bytes.end(), VirtualAddr(0x1010));

        let empty = Bytes::<Offset>::from_raw(0x40, 0);
        assert!(!empty.contains(Offset(0x40)));
        assert_eq!(format!("{:x}", empty.end()), "40");
    }
}
