//! Output helpers for the `jm` binary.

use anyhow::Context as _;
use colored::Colorize;
use std::io::Write;
use std::io::{self, ErrorKind};

use crate::matcher::MatchOutcome;

/// How a [`MatchOutcome`] is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `matched`, or `<path>: <reason>`, colorized when enabled.
    Text,
    /// One line of JSON, see [`MatchOutcome`]'s `Serialize` impl.
    Json,
}

/// Write `outcome` to `writer` in `format`.
///
/// Silently returns `Ok(())` on broken pipe so that piping to tools like
/// `head` exits cleanly.
///
/// # Errors
///
/// Returns an error if writing to `writer` fails.
pub fn write_outcome<W: Write>(
    writer: &mut W,
    outcome: &MatchOutcome,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let result = match format {
        OutputFormat::Text => write_text(writer, outcome),
        OutputFormat::Json => serde_json::to_string(outcome)
            .map_err(io::Error::from)
            .and_then(|line| writeln!(writer, "{line}")),
    };

    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::BrokenPipe => Ok(()),
        Err(err) => Err(err).context("write match outcome to stdout"),
    }
}

fn write_text<W: Write>(writer: &mut W, outcome: &MatchOutcome) -> io::Result<()> {
    match outcome {
        MatchOutcome::Matched => writeln!(writer, "{}", "matched".green()),
        MatchOutcome::Mismatched { reason, path } => {
            writeln!(writer, "{}: {}", path.bold().magenta(), reason.red())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(outcome: &MatchOutcome, format: OutputFormat) -> String {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        write_outcome(&mut buffer, outcome, format).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn text_output() {
        assert_eq!(render(&MatchOutcome::Matched, OutputFormat::Text), "matched\n");
        let mismatch = MatchOutcome::Mismatched {
            reason: "expect null at $[0]".into(),
            path: "$[0]".into(),
        };
        assert_eq!(
            render(&mismatch, OutputFormat::Text),
            "$[0]: expect null at $[0]\n"
        );
    }

    #[test]
    fn json_output() {
        let mismatch = MatchOutcome::Mismatched {
            reason: "expect null at $[0]".into(),
            path: "$[0]".into(),
        };
        let line = render(&mismatch, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["outcome"], "mismatched");
        assert_eq!(value["reason"], "expect null at $[0]");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn broken_pipe_is_ignored() {
        let result =
            write_outcome(&mut ClosedPipe, &MatchOutcome::Matched, OutputFormat::Text);
        assert!(result.is_ok());
    }
}
