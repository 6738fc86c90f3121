use binmatch::binary::BinaryKind;
use binmatch::commands;
use binmatch::elf::{ByteSource, ElfBinary};
use binmatch::file::MappedFile;
use binmatch::repl::{MainCommand, Repl};
use binmatch::utils::{self, warn};
use clap::Parser;
use clap_repl::ClapEditor;
use clap_repl::reedline::{
    DefaultPrompt, FileBackedHistory, Highlighter, Prompt, PromptEditMode, PromptHistorySearch,
    StyledText,
};
use nu_ansi_term::{Color, Style};
use std::borrow::Cow;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

const HISTORY_PATH: &str = "/tmp/binmatch-history";
const HISTORY_SIZE: usize = 10000;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// path to an executable, shared library, or object file
    path: PathBuf,

    /// print everything and exit instead of starting the repl
    #[arg(long)]
    dump: bool,
}

/// Colors whatever the user types.
pub struct MyHighlighter {
    color: Color,
}

impl Highlighter for MyHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled_text = StyledText::new();

        styled_text.push((Style::new().fg(self.color), line.to_string()));

        styled_text
    }
}

impl MyHighlighter {
    pub fn new() -> MyHighlighter {
        MyHighlighter { color: Color::Blue }
    }
}

impl Default for MyHighlighter {
    fn default() -> Self {
        MyHighlighter::new()
    }
}

pub struct MyPrompt {
    color: clap_repl::reedline::Color,
    default: DefaultPrompt,
}

impl Prompt for MyPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed("binmatch")
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed("> ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        self.default.render_prompt_multiline_indicator()
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        self.default
            .render_prompt_history_search_indicator(history_search)
    }

    // the text that appears in the prompt
    fn get_prompt_color(&self) -> clap_repl::reedline::Color {
        self.color
    }
}

impl MyPrompt {
    fn new() -> MyPrompt {
        MyPrompt {
            color: clap_repl::reedline::Color::DarkBlue,
            default: DefaultPrompt::default(),
        }
    }
}

fn open(path: &Path) -> MappedFile {
    match MappedFile::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn(&format!("Couldn't load {}: {e}", path.display()));
            process::exit(1);
        }
    }
}

fn parse(file: &MappedFile) -> Result<ElfBinary<'_>, Box<dyn Error>> {
    match BinaryKind::detect(file.buffer()) {
        BinaryKind::Elf => Ok(ElfBinary::parse(file)?),
        kind => Err(format!("{kind} files aren't supported").into()),
    }
}

fn run(binary: &ElfBinary) {
    // left prompt                    before what the user types
    // highlighter                    this is for what the user types
    let rl = ClapEditor::<Repl>::builder()
        .with_prompt(Box::new(MyPrompt::new()))
        .with_editor_hook(|reed| {
            let reed = reed.with_highlighter(Box::new(MyHighlighter::new()));
            match FileBackedHistory::with_file(HISTORY_SIZE, HISTORY_PATH.into()) {
                Ok(history) => reed.with_history(Box::new(history)),
                Err(e) => {
                    warn(&format!("couldn't open {HISTORY_PATH}: {e}"));
                    reed
                }
            }
        })
        .build();

    use MainCommand::*;
    rl.repl(|repl: Repl| match repl.command {
        Header(args) => commands::header(io::stdout(), binary, &args),
        Hexdump(args) => commands::hexdump(io::stdout(), binary, &args),
        Lookup(args) => commands::lookup(io::stdout(), binary, &args),
        Sections(args) => commands::sections(io::stdout(), binary, &args),
        Segments(args) => commands::segments(io::stdout(), binary, &args),
        Strings(args) => commands::strings(io::stdout(), binary, &args),
        Symbols(args) => commands::symbols(io::stdout(), binary, &args),
        Quit => process::exit(0),
    });
}

fn main() {
    utils::generate_style_file();

    let cli = Cli::parse();
    let file = open(&cli.path);
    let binary = match parse(&file) {
        Ok(binary) => binary,
        Err(e) => {
            warn(&format!("Couldn't parse {}: {e}", cli.path.display()));
            process::exit(1);
        }
    };

    if cli.dump {
        commands::dump(io::stdout(), &binary);
    } else {
        run(&binary);
    }
}
