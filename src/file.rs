//! Read-only memory mapped files.
use crate::elf::ByteSource;
use crate::utils;
use memmap2::Mmap;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};

pub struct MappedFile {
    pub path: PathBuf,
    bytes: Mmap,
}

impl MappedFile {
    pub fn open(path: &Path) -> Result<MappedFile, Box<dyn Error>> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        utils::require(len > 0, "file is empty")?;

        // This is unsafe because it has undefined behavior if the underlying file is
        // modified while the memory map is in use.
        let bytes = unsafe { Mmap::map(&file) }?;
        Ok(MappedFile {
            path: path.to_path_buf(),
            bytes,
        })
    }
}

impl ByteSource for MappedFile {
    fn buffer(&self) -> &[u8] {
        &self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::BinaryKind;
    use crate::elf::testing::ImageBuilder;
    use crate::elf::{ElfBinary, ElfClass};
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("binmatch-{}-{name}", std::process::id()));
        path
    }

    #[test]
    fn maps_and_parses() {
        let path = temp_path("image");
        let image = ImageBuilder::new(ElfClass::Class64).build();
        fs::write(&path, &image).unwrap();

        let file = MappedFile::open(&path).unwrap();
        assert_eq!(file.buffer(), &image[..]);
        assert_eq!(file.len(), image.len());
        assert_eq!(BinaryKind::detect(file.buffer()), BinaryKind::Elf);
        let binary = ElfBinary::parse(&file).unwrap();
        assert_eq!(binary.section_headers().len(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn open_failures() {
        assert!(MappedFile::open(&temp_path("missing")).is_err());

        let path = temp_path("empty");
        fs::write(&path, b"").unwrap();
        let err = MappedFile::open(&path).err().unwrap();
        assert_eq!(err.to_string(), "file is empty");
        fs::remove_file(&path).unwrap();
    }
}
