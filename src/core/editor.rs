use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use crate::core::error::BoardflowError;
use crate::core::spawn_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Editor {
    pub name: &'static str,
    pub command: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledEditor {
    pub name: &'static str,
    pub command: &'static str,
    pub path: PathBuf,
}

pub const KNOWN_EDITORS: [Editor; 14] = [
    Editor {
        name: "Notepad",
        command: "notepad.exe",
    },
    Editor {
        name: "VS Code",
        command: "code",
    },
    Editor {
        name: "VSCodium",
        command: "codium",
    },
    Editor {
        name: "Neovim",
        command: "nvim",
    },
    Editor {
        name: "Vim",
        command: "vim",
    },
    Editor {
        name: "Nano",
        command: "nano",
    },
    Editor {
        name: "Micro",
        command: "micro",
    },
    Editor {
        name: "Emacs",
        command: "emacs",
    },
    Editor {
        name: "Sublime Text",
        command: "subl",
    },
    Editor {
        name: "Kate",
        command: "kate",
    },
    Editor {
        name: "Gedit",
        command: "gedit",
    },
    Editor {
        name: "Notepad++",
        command: "notepad++",
    },
    Editor {
        name: "Atom",
        command: "atom",
    },
    Editor {
        name: "Geany",
        command: "geany",
    },
];

/// Keeps the candidates `lookup` can resolve, in candidate order. Nothing is
/// launched here.
pub fn discover_editors<P>(candidates: &[Editor], lookup: P) -> Vec<InstalledEditor>
where
    P: Fn(&str) -> Option<PathBuf>,
{
    candidates
        .iter()
        .filter_map(|editor| {
            lookup(editor.command).map(|path| InstalledEditor {
                name: editor.name,
                command: editor.command,
                path,
            })
        })
        .collect()
}

pub fn installed_editors() -> Vec<InstalledEditor> {
    let found = discover_editors(&KNOWN_EDITORS, |command| which::which(command).ok());
    tracing::debug!(editors = found.len(), "editor discovery finished");
    found
}

/// Case-insensitive lookup by display name or command.
pub fn find_editor<'a>(
    editors: &'a [InstalledEditor],
    wanted: &str,
) -> Option<&'a InstalledEditor> {
    editors.iter().find(|editor| {
        editor.name.eq_ignore_ascii_case(wanted) || editor.command.eq_ignore_ascii_case(wanted)
    })
}

/// Creates `file` when missing, then blocks until the editor exits.
pub fn open_in_editor(editor: &InstalledEditor, file: &Path) -> Result<ExitStatus, BoardflowError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .map_err(|e| BoardflowError::io(file, e))?;

    tracing::info!(editor = editor.name, file = %file.display(), "opening editor");
    Command::new(&editor.path)
        .arg(file)
        .status()
        .map_err(|e| spawn_error(&editor.path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed_only(present: &'static [&'static str]) -> impl Fn(&str) -> Option<PathBuf> {
        move |command: &str| {
            present
                .iter()
                .any(|known| *known == command)
                .then(|| PathBuf::from("/usr/bin").join(command))
        }
    }

    #[test]
    fn discovery_keeps_table_order_and_drops_missing() {
        let found = discover_editors(&KNOWN_EDITORS, installed_only(&["vim", "code", "geany"]));
        let names: Vec<_> = found.iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["VS Code", "Vim", "Geany"]);
        assert_eq!(found[1].path, PathBuf::from("/usr/bin/vim"));
    }

    #[test]
    fn discovery_can_find_nothing() {
        assert!(discover_editors(&KNOWN_EDITORS, installed_only(&[])).is_empty());
    }

    #[test]
    fn find_editor_matches_name_or_command() {
        let found = discover_editors(&KNOWN_EDITORS, installed_only(&["nvim", "nano"]));
        assert_eq!(find_editor(&found, "neovim").map(|e| e.command), Some("nvim"));
        assert_eq!(find_editor(&found, "NANO").map(|e| e.name), Some("Nano"));
        assert!(find_editor(&found, "emacs").is_none());
    }

    #[cfg(unix)]
    #[test]
    fn open_creates_missing_file_before_launch() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Blink.ino");
        let editor = InstalledEditor {
            name: "True",
            command: "true",
            path: PathBuf::from("/bin/sh"),
        };

        // `sh <file>` runs the empty file and exits cleanly.
        let status = open_in_editor(&editor, &file).unwrap();
        assert!(status.success());
        assert!(file.exists());
    }
}
