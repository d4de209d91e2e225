use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::syntax::{DEFAULT_MAX_TEXT_LEN, SyntaxOptions};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InspectConfig {
    #[serde(default)]
    pub syntax: SyntaxConfig,

    #[serde(default)]
    pub scope: ScopeConfig,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SyntaxConfig {
    #[serde(default = "default_show_text")]
    pub show_text: bool,

    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,

    #[serde(default)]
    pub named_only: bool,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            show_text: default_show_text(),
            max_text_len: default_max_text_len(),
            named_only: false,
        }
    }
}

fn default_show_text() -> bool {
    true
}

fn default_max_text_len() -> usize {
    DEFAULT_MAX_TEXT_LEN
}

impl From<&SyntaxConfig> for SyntaxOptions {
    fn from(cfg: &SyntaxConfig) -> Self {
        Self {
            show_text: cfg.show_text,
            max_text_len: cfg.max_text_len,
            named_only: cfg.named_only,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScopeConfig {
    /// Binding names hidden from scope output.
    #[serde(default)]
    pub skip: Vec<String>,
}

pub const DEFAULT_CONFIG_FILE_NAME: &str = "move-inspect.toml";

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut cur = Some(start_dir);
    while let Some(dir) = cur {
        let candidate = dir.join(DEFAULT_CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        cur = dir.parent();
    }
    None
}

pub fn load_config_file(path: &Path) -> Result<InspectConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;
    let cfg: InspectConfig = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;
    Ok(cfg)
}

pub fn load_config(
    explicit_path: Option<&Path>,
    start_dir: &Path,
) -> Result<Option<(PathBuf, InspectConfig)>> {
    if let Some(p) = explicit_path {
        let cfg = load_config_file(p)?;
        return Ok(Some((p.to_path_buf(), cfg)));
    }

    let Some(p) = find_config_file(start_dir) else {
        return Ok(None);
    };
    let cfg = load_config_file(&p)?;
    Ok(Some((p, cfg)))
}
