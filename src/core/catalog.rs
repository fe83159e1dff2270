use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::core::board::{filter_boards, parse_board_listing, BoardRecord};
use crate::core::command::ToolCommand;
use crate::core::config::Config;
use crate::core::error::BoardflowError;
use crate::core::run_captured;

/// Lists every board the tool knows and replaces the catalog document with
/// the result. Nothing is written when the listing fails.
pub fn refresh(config: &Config) -> Result<Vec<BoardRecord>, BoardflowError> {
    let stdout = run_captured(config, &ToolCommand::ListBoards)?;
    let boards = parse_board_listing(&stdout);
    save(config.catalog_path(), &boards)?;

    tracing::info!(
        boards = boards.len(),
        path = %config.catalog_path().display(),
        "catalog refreshed"
    );
    Ok(boards)
}

pub fn load(path: &Path) -> Result<Vec<BoardRecord>, BoardflowError> {
    let file = File::open(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            BoardflowError::CatalogNotFound {
                path: path.to_path_buf(),
            }
        } else {
            BoardflowError::io(path, e)
        }
    })?;

    let boards: Vec<BoardRecord> = serde_json::from_reader(BufReader::new(file))?;
    tracing::debug!(boards = boards.len(), path = %path.display(), "catalog loaded");
    Ok(boards)
}

/// Writes the document to a sibling temp file and renames it over `path`, so
/// readers see either the old catalog or the new one.
pub fn save(path: &Path, boards: &[BoardRecord]) -> Result<(), BoardflowError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| BoardflowError::io(dir, e))?;
    {
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut file, formatter);
        boards.serialize(&mut ser)?;
    }
    file.write_all(b"\n").map_err(|e| BoardflowError::io(path, e))?;
    file.persist(path).map_err(|e| BoardflowError::io(path, e.error))?;
    Ok(())
}

pub fn search(path: &Path, query: &str) -> Result<Vec<BoardRecord>, BoardflowError> {
    let boards = load(path)?;
    let matches: Vec<BoardRecord> = filter_boards(&boards, query).into_iter().cloned().collect();
    tracing::debug!(query, matches = matches.len(), "catalog searched");
    Ok(matches)
}
