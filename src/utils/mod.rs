pub mod styles;

pub use styles::*;

use std::error::Error;

pub fn require(predicate: bool, err: &str) -> Result<(), Box<dyn Error>> {
    if predicate { Ok(()) } else { Err(err.into()) }
}

pub fn warn(mesg: &str) {
    eprintln!("{}", mesg.warn());
}

/// writeln! for command output. There's nothing useful to do if stdout goes away so
/// errors are ignored.
macro_rules! uwriteln {
    ($out:expr) => {
        let _ = writeln!($out);
    };
    ($out:expr, $($arg:tt)*) => {
        let _ = writeln!($out, $($arg)*);
    };
}
pub(crate) use uwriteln;

/// write! version of uwriteln!.
macro_rules! uwrite {
    ($out:expr, $($arg:tt)*) => {
        let _ = write!($out, $($arg)*);
    };
}
pub(crate) use uwrite;

/// Remove escape sequences from the string (e.g. for colors).
#[cfg(test)]
pub fn strip_escapes(s: &str) -> String {
    // The other way to do this is to change styles.rs to not emit escape sequences for
    // unit tests (and maybe also if some sort of --no-color flag is used). But even with
    // Style::empty() the tabled crate will add escape sequences to the end of lines to
    // reset all modes.
    let mut result = String::with_capacity(s.len());
    let mut escaping = false;

    // Note that escape sequences can be fairly gnarly, e.g. for RGB colors.
    // See https://gist.github.com/fnky/458719343aabd01cfb17a3a4f7296797
    for c in s.chars() {
        if c == '\x1b' {
            escaping = true;
        } else if escaping {
            if c == 'm' {
                escaping = false;
            }
        } else {
            result.push(c);
        }
    }
    result
}

/// Runs a command that writes to an io::Write and returns what it wrote, minus styling.
#[cfg(test)]
macro_rules! command_output {
    ($f:path, $($arg:expr),*) => {{
        let mut v: Vec<u8> = Vec::new();
        $f(&mut v, $($arg),*);
        let s = String::from_utf8(v).unwrap();
        crate::utils::strip_escapes(&s)
    }};
}
#[cfg(test)]
pub(crate) use command_output;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes() {
        assert_eq!(strip_escapes("\x1b[31mred\x1b[0m text"), "red text");
        assert_eq!(strip_escapes("plain"), "plain");
    }

    #[test]
    fn requirements() {
        assert!(require(true, "never").is_ok());
        let err = require(false, "missing path").unwrap_err();
        assert_eq!(err.to_string(), "missing path");
    }
}
