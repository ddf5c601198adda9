//! `generate` subcommand: shell completions and the man page.
use anyhow::{Context, Result};
use clap_complete::Shell;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Write completions for `shell` to `writer`.
pub fn write_completions<W: Write>(
    shell: Shell,
    cmd: &mut clap::Command,
    writer: &mut W,
) {
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, cmd, name, writer);
}

/// Render the man page of `cmd` into `output_dir`, or the current directory
/// when none is given, and return the path written.
///
/// # Errors
///
/// Returns an error if the directory or the page cannot be written.
pub fn generate_man_page(
    cmd: clap::Command,
    output_dir: Option<&Path>,
) -> Result<PathBuf> {
    let output_dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("open current directory")?,
    };
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;

    let path = output_dir.join(format!("{}.1", cmd.get_name()));
    let mut file = File::create(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    clap_mangen::Man::new(cmd)
        .render(&mut file)
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::info!("generated {}", path.display());
    Ok(path)
}
