/*!
Main binary for jsonmatch.
*/

use anyhow::{Context, Result, bail};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use colored::Colorize;
use std::io::{self, IsTerminal, Read, stdout};
use std::path::PathBuf;
use std::process::ExitCode;

use jsonmatch::commands::generate;
use jsonmatch::utils::{OutputFormat, write_outcome};
use jsonmatch::{Json, JsonMatcher, MatchOutcome};

/// Check a JSON document against a jsonmatch pattern.
///
/// Exits with 0 when the document matches, 1 when it does not and 2 on
/// errors.
#[derive(Parser)]
#[command(name = "jm", version, about, arg_required_else_help = true, disable_help_subcommand = true)]
struct Args {
    /// Optional subcommands
    #[command(subcommand)]
    command: Option<Commands>,
    /// Pattern text (e.g., '{"name": string, *: *}')
    pattern: Option<String>,
    #[arg(value_name = "FILE")]
    /// Optional path to the JSON document. If omitted, reads from STDIN
    input: Option<PathBuf>,
    /// Read the pattern from a file; the first positional argument is then
    /// the document
    #[arg(short = 'f', long, value_name = "PATH")]
    pattern_file: Option<PathBuf>,
    /// Print the outcome as a JSON object
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,
    /// Print nothing, only set the exit status
    #[arg(short, long, action = ArgAction::SetTrue, conflicts_with = "json")]
    silent: bool,
    #[command(flatten)]
    verbosity: Verbosity,
}

/// Available subcommands for `jm`
#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    /// Generate additional documentation and/or completions
    Generate(GenerateCommand),
}

/// Generate shell completions and man page
#[derive(Subcommand)]
enum GenerateCommand {
    /// Generate shell completions for the given shell to stdout.
    Shell { shell: clap_complete::Shell },
    /// Generate the man page for jm to output directory if specified, else
    /// the current directory.
    Man {
        /// The output directory to write the man page.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
}

/// Entry point for main binary.
///
/// Errors are reported on STDERR with exit status 2, so they can be told
/// apart from a mismatch.
fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.verbosity.log_level_filter())
        .init();

    match run(args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}: {err:#}", "error".red().bold());
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    if let Some(Commands::Generate(cmd)) = args.command {
        match cmd {
            GenerateCommand::Shell { shell } => {
                generate::write_completions(
                    shell,
                    &mut Args::command(),
                    &mut stdout().lock(),
                );
            }
            GenerateCommand::Man { output_dir } => {
                let path = generate::generate_man_page(
                    Args::command(),
                    output_dir.as_deref(),
                )?;
                println!("Generated: {}", path.display());
            }
        }
        return Ok(ExitCode::SUCCESS);
    }

    // With --pattern-file the only positional names the document
    let (pattern_text, input) = match (args.pattern_file, args.pattern, args.input) {
        (Some(path), first, None) => {
            let text = std::fs::read_to_string(&path).with_context(|| {
                format!("Failed to read pattern file {}", path.display())
            })?;
            (text, first.map(PathBuf::from))
        }
        (Some(_), _, Some(extra)) => {
            bail!("unexpected argument {}", extra.display())
        }
        (None, Some(text), input) => (text, input),
        (None, None, _) => {
            bail!("Pattern required unless using subcommand")
        }
    };

    let pattern: JsonMatcher =
        pattern_text.parse().context("Failed to parse pattern")?;

    let document_text = if let Some(path) = input {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file {}", path.display()))?
    } else {
        if io::stdin().is_terminal() {
            // No piped input and no file specified
            Args::command().print_help()?;
            return Ok(ExitCode::from(2));
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    };
    let document: Json =
        document_text.parse().context("Failed to parse document")?;

    let outcome = pattern.matches(&document);
    if !args.silent {
        let format = if args.json { OutputFormat::Json } else { OutputFormat::Text };
        write_outcome(&mut stdout().lock(), &outcome, format)?;
    }

    Ok(match outcome {
        MatchOutcome::Matched => ExitCode::SUCCESS,
        MatchOutcome::Mismatched { .. } => ExitCode::from(1),
    })
}
