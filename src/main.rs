use anyhow::Context;
use clap::Parser;
use move_inspect::cli::{Args, AstArgs, Command, ScopeArgs};
use move_inspect::config::{self, InspectConfig};
use move_inspect::parser;
use move_inspect::resolver::resolve_path;
use move_inspect::scope_printer::ScopePrinter;
use move_inspect::syntax::{SourceNode, SyntaxOptions, write_syntax_tree};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    move_inspect::telemetry::init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn run() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Command::Ast(ast) => ast_command(ast),
        Command::Scope(scope) => scope_command(scope),
    }
}

fn ast_command(args: AstArgs) -> anyhow::Result<ExitCode> {
    let start_dir = start_dir_for(args.paths.first().map(PathBuf::as_path))?;
    let cfg = load_config(args.config.as_deref(), &start_dir)?;

    let mut options = SyntaxOptions::from(&cfg.syntax);
    if args.named_only {
        options.named_only = true;
    }
    if args.no_text {
        options.show_text = false;
    }
    if let Some(max) = args.max_text_len {
        options.max_text_len = max;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for path in collect_move_files(&args.paths)? {
        #[cfg(feature = "telemetry")]
        tracing::debug!(path = %path.display(), "dumping syntax tree");

        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let tree = parser::parse_source(&source)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        if !args.allow_errors {
            parser::ensure_well_formed(&tree)
                .with_context(|| format!("failed to parse {}", path.display()))?;
        }

        writeln!(out, "AST for {}:", path.display())?;
        writeln!(out, "================")?;
        write_syntax_tree(SourceNode::new(tree.root_node(), &source), options, &mut out)?;
    }

    Ok(ExitCode::SUCCESS)
}

fn scope_command(args: ScopeArgs) -> anyhow::Result<ExitCode> {
    let start_dir = start_dir_for(Some(&args.path))?;
    let cfg = load_config(args.config.as_deref(), &start_dir)?;

    let scope = resolve_path(&args.path, args.input_format)
        .with_context(|| format!("failed to resolve {}", args.path.display()))?;

    #[cfg(feature = "telemetry")]
    tracing::info!(
        path = %args.path.display(),
        bindings = scope.binding_count(),
        "resolved scope tree"
    );

    let skip = cfg.scope.skip.into_iter().chain(args.skip);
    let printer = ScopePrinter::new().skipping(skip);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    printer.write_to(Some(&scope), args.start_depth, &mut out)?;

    Ok(ExitCode::SUCCESS)
}

fn load_config(explicit: Option<&Path>, start_dir: &Path) -> anyhow::Result<InspectConfig> {
    Ok(config::load_config(explicit, start_dir)?
        .map(|(_path, cfg)| cfg)
        .unwrap_or_default())
}

fn start_dir_for(path: Option<&Path>) -> anyhow::Result<PathBuf> {
    let Some(path) = path else {
        return Ok(std::env::current_dir()?);
    };
    if path.is_dir() {
        return Ok(path.to_path_buf());
    }
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(parent.to_path_buf()),
        _ => Ok(std::env::current_dir()?),
    }
}

fn collect_move_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for path in paths {
        collect_from_path(path, &mut out)?;
    }

    out.sort();
    out.dedup();
    Ok(out)
}

fn collect_from_path(path: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    let meta = std::fs::metadata(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    if meta.is_dir() {
        collect_from_dir(path, out)
    } else {
        out.push(path.to_path_buf());
        Ok(())
    }
}

fn collect_from_dir(dir: &Path, out: &mut Vec<PathBuf>) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            if should_skip_dir(&path) {
                continue;
            }
            collect_from_dir(&path, out)?;
            continue;
        }

        if path.extension().and_then(|e| e.to_str()) == Some("move") {
            out.push(path);
        }
    }

    Ok(())
}

fn should_skip_dir(path: &Path) -> bool {
    matches!(
        path.file_name().and_then(|n| n.to_str()),
        Some("build" | "target" | ".git")
    )
}
