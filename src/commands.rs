//! Subcommands of the `jm` binary.

pub mod generate;
