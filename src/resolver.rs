//! Producers of [`ScopeNode`] trees.
//!
//! Resolution is not implemented by the printers. A resolver either derives
//! declaration-level scopes from Move source or loads a scope tree some other
//! semantic tool serialized.

mod dump;
mod move_decls;

pub use dump::{DumpFormat, ScopeDump};
pub use move_decls::{MoveScopeResolver, move_type};

use clap::ValueEnum;
use std::path::Path;

use crate::error::InspectResult;
use crate::inspect_bail;
use crate::scope::ScopeNode;

pub trait ScopeResolver {
    fn resolve(&self, source: &str) -> InspectResult<ScopeNode>;
}

/// How the `scope` command should interpret its input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InputFormat {
    /// Pick from the file extension.
    #[default]
    Auto,
    Move,
    Json,
    Toml,
}

/// Choose a resolver for `path`.
pub fn resolver_for(path: &Path, format: InputFormat) -> InspectResult<Box<dyn ScopeResolver>> {
    let format = match format {
        InputFormat::Auto => match path.extension().and_then(|e| e.to_str()) {
            Some("move") => InputFormat::Move,
            Some("json") => InputFormat::Json,
            Some("toml") => InputFormat::Toml,
            _ => {
                inspect_bail!(
                    "cannot infer input format for {}; pass --input-format",
                    path.display()
                );
            }
        },
        explicit => explicit,
    };

    let resolver: Box<dyn ScopeResolver> = match format {
        InputFormat::Move | InputFormat::Auto => Box::new(MoveScopeResolver::new()),
        InputFormat::Json => Box::new(ScopeDump::new(DumpFormat::Json)),
        InputFormat::Toml => Box::new(ScopeDump::new(DumpFormat::Toml)),
    };
    Ok(resolver)
}

/// Read `path` and resolve it with the resolver [`resolver_for`] picks.
pub fn resolve_path(path: &Path, format: InputFormat) -> InspectResult<ScopeNode> {
    let resolver = resolver_for(path, format)?;
    let source = std::fs::read_to_string(path)?;
    resolver.resolve(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_format_from_extension() {
        let json = resolver_for(Path::new("scope.json"), InputFormat::Auto).unwrap();
        let scope = json.resolve(r#"{"label": "pkg"}"#).unwrap();
        assert_eq!(scope.label.as_deref(), Some("pkg"));

        let toml = resolver_for(Path::new("scope.toml"), InputFormat::Auto).unwrap();
        let scope = toml.resolve("label = \"pkg\"\n").unwrap();
        assert_eq!(scope.label.as_deref(), Some("pkg"));
    }

    #[test]
    fn explicit_format_overrides_extension() {
        let resolver = resolver_for(Path::new("scope.txt"), InputFormat::Json).unwrap();
        assert!(resolver.resolve("{}").is_ok());
    }

    #[test]
    fn resolve_path_reports_missing_files_as_io() {
        let err = resolve_path(Path::new("does/not/exist.json"), InputFormat::Auto).unwrap_err();
        assert!(matches!(err, crate::error::InspectError::Io(_)));
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert!(resolver_for(Path::new("scope.txt"), InputFormat::Auto).is_err());
        assert!(resolver_for(Path::new("scope"), InputFormat::Auto).is_err());
    }
}
