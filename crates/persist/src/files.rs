//! On-disk layout for savegames.
//!
//! ```text
//! <root>/
//!   save/                 - player savegames
//!     autosave/           - rotating and named autosaves
//!   scenario/             - editor scenarios
//!   screenshot/           - screenshots
//! <data_dir>/opntitle.dat - intro world shown behind the menu
//! ```

use openrail_common::GameDate;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Number of rotating autosave slots.
pub const AUTOSAVE_SLOTS: u8 = 16;

pub const SAVE_EXTENSION: &str = "sav";
pub const INTRO_FILE: &str = "opntitle.dat";

/// A savegame found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveEntry {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

#[derive(Debug, Clone)]
pub struct SaveFiles {
    root: PathBuf,
    data_dir: PathBuf,
}

impl SaveFiles {
    /// Use `root` for personal files and `data_dir` for shipped data,
    /// creating the personal directories if needed.
    pub fn open(root: impl AsRef<Path>, data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let files = Self {
            root: root.as_ref().to_path_buf(),
            data_dir: data_dir.as_ref().to_path_buf(),
        };
        std::fs::create_dir_all(files.autosave_dir())?;
        std::fs::create_dir_all(files.scenario_dir())?;
        std::fs::create_dir_all(files.screenshot_dir())?;
        Ok(files)
    }

    pub fn save_dir(&self) -> PathBuf {
        self.root.join("save")
    }

    pub fn autosave_dir(&self) -> PathBuf {
        self.save_dir().join("autosave")
    }

    pub fn scenario_dir(&self) -> PathBuf {
        self.root.join("scenario")
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.root.join("screenshot")
    }

    pub fn intro_path(&self) -> PathBuf {
        self.data_dir.join(INTRO_FILE)
    }

    /// `autosave{slot}.sav`, wrapping at [`AUTOSAVE_SLOTS`].
    pub fn rotating_autosave_path(&self, slot: u8) -> PathBuf {
        self.autosave_dir()
            .join(format!("autosave{}.{SAVE_EXTENSION}", slot % AUTOSAVE_SLOTS))
    }

    /// `"{player}, {date}.sav"`, kept instead of rotated.
    pub fn named_autosave_path(&self, player: &str, date: GameDate) -> PathBuf {
        let player = sanitize(player);
        self.autosave_dir()
            .join(format!("{player}, {date}.{SAVE_EXTENSION}"))
    }

    /// Savegames in `dir`, newest first.
    pub fn list_saves(&self, dir: impl AsRef<Path>) -> std::io::Result<Vec<SaveEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SAVE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let modified = entry.metadata()?.modified()?;
            entries.push(SaveEntry {
                name: name.to_string(),
                path: path.clone(),
                modified,
            });
        }
        entries.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let files = SaveFiles::open(tmp.path(), tmp.path().join("data")).unwrap();
        assert!(files.autosave_dir().is_dir());
        assert!(files.scenario_dir().is_dir());
        assert!(files.screenshot_dir().is_dir());
        assert_eq!(files.intro_path(), tmp.path().join("data").join("opntitle.dat"));
    }

    #[test]
    fn autosave_names() {
        let tmp = tempfile::tempdir().unwrap();
        let files = SaveFiles::open(tmp.path(), tmp.path()).unwrap();
        assert_eq!(
            files.rotating_autosave_path(3).file_name().unwrap(),
            "autosave3.sav"
        );
        assert_eq!(
            files.rotating_autosave_path(17).file_name().unwrap(),
            "autosave1.sav"
        );
        let named = files.named_autosave_path("Rail/Co", GameDate::from_year(1950).unwrap());
        assert_eq!(named.file_name().unwrap(), "Rail_Co, 1950-01-01.sav");
    }

    #[test]
    fn list_saves_skips_other_files() {
        let tmp = tempfile::tempdir().unwrap();
        let files = SaveFiles::open(tmp.path(), tmp.path()).unwrap();
        std::fs::write(files.save_dir().join("one.sav"), b"x").unwrap();
        std::fs::write(files.save_dir().join("notes.txt"), b"x").unwrap();

        let saves = files.list_saves(files.save_dir()).unwrap();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].name, "one");
    }
}
