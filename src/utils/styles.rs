//! Output colors. These come from ~/.binmatch/styles.tcss which is seeded from
//! default.tcss on startup. If that file is missing the built-in defaults are used.
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use termio::prelude::*;
use termio::{StyledString, Termio};

const DEFAULT_STYLES: &str = include_str!("default.tcss");

/// Element names used in the tcss file.
pub const ELEMENTS: [&str; 9] = [
    "explain title",
    "explain text",
    "hex offset",
    "hex hex",
    "hex ascii",
    "table header",
    "table separator",
    "table field",
    "warn",
];

fn style_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".binmatch").join("styles.tcss"))
}

/// Writes the default styles if the user doesn't have a styles file yet. Problems
/// go straight to stderr: warn() itself depends on the styles.
pub fn generate_style_file() {
    let Some(path) = style_path() else {
        eprintln!("couldn't find home directory");
        return;
    };
    if let Err(err) = write_defaults(&path) {
        eprintln!("couldn't create {}: {err}", path.display());
    }
}

fn write_defaults(path: &Path) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => file.write_all(DEFAULT_STYLES.as_bytes()),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(()),
        Err(err) => Err(err),
    }
}

fn default_tcss() -> Termio {
    let mut tcss = Termio::new();
    if let Err(err) = tcss.parse(DEFAULT_STYLES) {
        eprintln!("couldn't parse the default styles: {err}");
    }
    tcss
}

static TCSS: LazyLock<Termio> = LazyLock::new(|| {
    let Some(path) = style_path().filter(|p| p.exists()) else {
        return default_tcss();
    };
    match Termio::from_file(&path.to_string_lossy()) {
        Ok(tcss) => tcss,
        Err(err) => {
            eprintln!("couldn't parse {}: {err}", path.display());
            default_tcss()
        }
    }
});

/// Applies one of the ELEMENTS styles to text.
pub trait Styling: AsRef<str> + Sized {
    fn styled(self, element: &str) -> StyledString {
        self.as_ref().style(element, &TCSS)
    }

    fn explain_title(self) -> StyledString {
        self.styled("explain title")
    }

    fn explain_text(self) -> StyledString {
        self.styled("explain text")
    }

    fn hex_offset(self) -> StyledString {
        self.styled("hex offset")
    }

    fn hex_hex(self) -> StyledString {
        self.styled("hex hex")
    }

    fn hex_ascii(self) -> StyledString {
        self.styled("hex ascii")
    }

    fn table_header(self) -> StyledString {
        self.styled("table header")
    }

    fn table_sep(self) -> StyledString {
        self.styled("table separator")
    }

    fn table_field(self) -> StyledString {
        self.styled("table field")
    }

    fn warn(self) -> StyledString {
        self.styled("warn")
    }
}

impl Styling for String {}
impl Styling for &str {}
