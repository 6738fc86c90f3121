//! Definitions for the commands that are used interactively, e.g.
//! `sections` and `lookup --name main`.
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(infer_subcommands(true))] // allow abreviations
pub struct Repl {
    #[command(subcommand)]
    pub command: MainCommand,
}

#[derive(Subcommand)]
pub enum MainCommand {
    /// Show the ELF header
    Header(ExplainArgs),

    /// Print bytes as hex and ascii
    Hexdump(HexdumpArgs),

    /// Find a symbol by name or address
    Lookup(LookupArgs),

    /// Show section headers
    Sections(TableArgs),

    /// Show program headers
    Segments(TableArgs),

    /// Dump string tables
    Strings(StringsArgs),

    /// Show the .symtab (or .dynsym) symbols
    Symbols(SymbolsArgs),

    /// Exit binmatch
    Quit,
}

#[derive(Args)]
pub struct ExplainArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,
}

#[derive(Args)]
pub struct TableArgs {
    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,
}

#[derive(Args)]
pub struct SymbolsArgs {
    /// Show .dynsym instead of .symtab
    #[arg(short, long)]
    pub dynamic: bool,

    /// Explain columns, fields, etc.
    #[arg(short, long)]
    pub explain: bool,

    /// Add column headers
    #[arg(short, long)]
    pub titles: bool,

    /// Only show symbols whose name includes this
    #[arg(short, long)]
    pub filter: Option<String>,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct LookupArgs {
    /// Exact symbol name
    #[arg(short, long)]
    pub name: Option<String>,

    /// A virtual address, reports the symbol at or containing it
    #[arg(short, long, value_parser = parse_u64_expr)]
    pub addr: Option<u64>,
}

#[derive(Args)]
pub struct HexdumpArgs {
    /// Dump the bytes of the section with this index
    #[arg(short, long, group = "source")]
    pub section: Option<usize>,

    /// Dump the bytes at this offset into the ELF file
    #[arg(short, long, group = "source", value_parser = parse_u64_expr)]
    pub offset: Option<u64>,

    /// Number of bytes to dump
    #[arg(short, long)]
    #[arg(default_value_t = 64)]
    pub count: usize,

    /// How to display the start of each row
    #[arg(short, long, value_name = "TYPE")]
    #[arg(default_value_t = HexdumpLabels::Zero)]
    pub labels: HexdumpLabels,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum HexdumpLabels {
    /// Show nothing at the start of lines
    None,

    /// Show the address (or file offset) for the first byte on each line
    Addr,

    /// Show the offset from zero for the first byte on each line
    Zero,
}

#[derive(Args)]
pub struct StringsArgs {
    /// Section index used to dump just one table
    #[arg(short, long)]
    pub index: Option<usize>,

    /// Max number of results to report for each table, 0 for unlimited
    #[arg(short, long, default_value_t = 10)]
    pub max_results: usize,
}

impl fmt::Display for HexdumpLabels {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HexdumpLabels::None => fmt.write_str("none")?,
            HexdumpLabels::Addr => fmt.write_str("addr")?,
            HexdumpLabels::Zero => fmt.write_str("zero")?,
        }
        Ok(())
    }
}

pub fn parse_u64_expr(s: &str) -> Result<u64, String> {
    if let Some(t) = s.strip_prefix("0x") {
        u64::from_str_radix(t, 16).map_err(|_| format!("`{s}` isn't a hex or decimal number"))
    } else {
        s.parse()
            .map_err(|_| format!("`{s}` isn't a hex or decimal number"))
    }
}
