use std::path::{Path, PathBuf};

pub const DEFAULT_TOOL: &str = "arduino-cli";
pub const DEFAULT_CATALOG_FILE: &str = "boards.json";

/// Where the catalog lives and which binary to drive. Every operation takes
/// this explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub tool: PathBuf,
    pub catalog_path: PathBuf,
}

impl Config {
    pub fn new(tool: impl Into<PathBuf>, catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            catalog_path: catalog_path.into(),
        }
    }

    pub fn tool(&self) -> &Path {
        &self.tool
    }

    pub fn catalog_path(&self) -> &Path {
        &self.catalog_path
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL, DEFAULT_CATALOG_FILE)
    }
}
