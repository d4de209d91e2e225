use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::resolver::InputFormat;

/// move-inspect CLI options.
#[derive(Debug, Parser)]
#[command(
    name = "move-inspect",
    version,
    about = "Print Move syntax trees and resolved scope trees"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Dump the syntax tree of Move files.
    Ast(AstArgs),

    /// Print the scope tree of a Move file or a serialized scope dump.
    Scope(ScopeArgs),
}

#[derive(Debug, Clone, ClapArgs)]
pub struct AstArgs {
    /// Files/directories to dump. Directories are searched for `.move` files.
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Skip anonymous (punctuation and keyword) nodes.
    #[arg(long)]
    pub named_only: bool,

    /// Do not print node text previews.
    #[arg(long)]
    pub no_text: bool,

    /// Longest text preview, in characters.
    #[arg(long, value_name = "N")]
    pub max_text_len: Option<usize>,

    /// Dump the tree even if it contains syntax errors.
    #[arg(long)]
    pub allow_errors: bool,

    /// Path to a move-inspect.toml config file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct ScopeArgs {
    /// Move source file, or a JSON/TOML scope dump.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// How to read PATH.
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    pub input_format: InputFormat,

    /// Hide bindings with these names (comma-separated). Adds to config.
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Depth assigned to the root scope.
    #[arg(long, default_value_t = 0)]
    pub start_depth: usize,

    /// Path to a move-inspect.toml config file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}
