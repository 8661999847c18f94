use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;

use weir::{MatcherKind, Options, RewriteReader, Rewriter};

/// weir — streaming regex find-and-replace.
/// Rewrites stdin (or FILE) to stdout without ever buffering the stream.
#[derive(Parser)]
#[command(name = "weir", version, about)]
struct Cli {
    /// Regex pattern to search for.
    pattern: Option<String>,

    /// Replacement template: $0 is the whole match, $1.. the capture
    /// groups, ${10} delimits, $$ is a literal dollar.
    template: Option<String>,

    /// Input file. Reads stdin when absent.
    file: Option<PathBuf>,

    /// Case-insensitive matching.
    #[arg(short = 'i', long)]
    ignore_case: bool,

    /// Let `.` match newlines too.
    #[arg(short = 's', long)]
    dot_all: bool,

    /// `^` and `$` match at line boundaries.
    #[arg(short = 'm', long)]
    multi_line: bool,

    /// Finalized characters kept as context behind the scan position.
    /// Patterns using \b or multi-line ^ need at least 1.
    #[arg(long, default_value_t = 1)]
    lookbehind: usize,

    /// Characters fetched per refill.
    #[arg(long, default_value_t = weir::DEFAULT_GROWTH_CHUNK)]
    chunk: usize,

    /// Matching engine.
    #[arg(long, value_enum, default_value = "auto")]
    engine: Engine,

    /// Print shell completions for the given shell.
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Engine {
    /// DFA signals when the pattern supports them, public API otherwise.
    Auto,
    /// Walkable DFA: exact defer/advance signals.
    Dfa,
    /// Public regex API with conservative signals.
    Api,
}

impl From<Engine> for MatcherKind {
    fn from(e: Engine) -> Self {
        match e {
            Engine::Auto => MatcherKind::Auto,
            Engine::Dfa => MatcherKind::Dfa,
            Engine::Api => MatcherKind::Api,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Shell completions
    if let Some(shell) = cli.completions {
        clap_complete::generate(shell, &mut Cli::command(), "weir", &mut io::stdout());
        return;
    }

    let (Some(pattern), Some(template)) = (cli.pattern, cli.template) else {
        eprintln!("usage: weir PATTERN TEMPLATE [FILE] [-i] [-s] [-m] [--lookbehind N]");
        process::exit(3);
    };

    let options = Options {
        case_insensitive: cli.ignore_case,
        dot_matches_new_line: cli.dot_all,
        multi_line: cli.multi_line,
        lookbehind: cli.lookbehind,
        growth_chunk: cli.chunk,
        engine: cli.engine.into(),
    };

    let rw = match Rewriter::with_options(&pattern, &template, &options) {
        Ok(rw) => rw,
        Err(e) => {
            eprintln!("{e}");
            process::exit(e.exit_code());
        }
    };

    let result = match cli.file {
        Some(ref path) => match File::open(path) {
            Ok(f) => copy(BufReader::new(f), rw),
            Err(e) => {
                eprintln!("{}: {e}", path.display());
                process::exit(2);
            }
        },
        None => copy(io::stdin().lock(), rw),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(2);
    }
}

fn copy(input: impl Read, rw: Rewriter) -> io::Result<()> {
    let mut reader = RewriteReader::new(input, rw);
    let stdout = io::stdout().lock();
    let mut out = BufWriter::new(stdout);
    io::copy(&mut reader, &mut out)?;
    out.flush()
}
