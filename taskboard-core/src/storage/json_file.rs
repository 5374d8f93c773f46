/// Flat JSON file persistence.
///
/// The whole document is rewritten on every mutation:
/// - write to a sibling `.tmp`, fsync, rename over the target, fsync the directory
/// - a missing file loads as an empty document
/// - a malformed file is logged and replaced by an empty document
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{Persistence, StorageError};
use crate::types::BoardData;

#[derive(Debug, Clone)]
pub struct JsonFilePersistence {
    path: PathBuf,
}

impl JsonFilePersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let tmp_path = path.with_extension("taskboard.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl Persistence for JsonFilePersistence {
    fn load(&self) -> Result<BoardData, StorageError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!(
                    target: "taskboard.storage",
                    "No data file at {}, starting empty",
                    self.path.display()
                );
                return Ok(BoardData::default());
            }
            Err(e) => return Err(e.into()),
        };

        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(BoardData::default());
        }

        Ok(serde_json::from_slice(&content).unwrap_or_else(|e| {
            log::warn!(
                target: "taskboard.storage",
                "Failed to parse data file {}: {}; starting empty",
                self.path.display(),
                e
            );
            BoardData::default()
        }))
    }

    fn save(&self, data: &BoardData) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(data)?;
        Self::atomic_write(&self.path, &json)?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Board;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let p = JsonFilePersistence::new(dir.path().join("absent.json"));
        assert_eq!(p.load().unwrap(), BoardData::default());
    }

    #[test]
    fn test_malformed_file_recovers_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ this is not json").unwrap();
        let p = JsonFilePersistence::new(&path);
        assert_eq!(p.load().unwrap(), BoardData::default());
    }

    #[test]
    fn test_non_utf8_file_recovers_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("binary.json");
        fs::write(&path, [0xff, 0xfe, b'{', 0x80]).unwrap();
        let p = JsonFilePersistence::new(&path);
        assert_eq!(p.load().unwrap(), BoardData::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let p = JsonFilePersistence::new(&path);
        let data = BoardData {
            boards: vec![Board {
                id: "b1".into(),
                title: "Plans".into(),
                position: 0,
            }],
            ..Default::default()
        };
        p.save(&data).unwrap();
        assert_eq!(p.load().unwrap(), data);
        assert!(!path.with_extension("taskboard.tmp").exists());

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("\"boards\""));
        assert!(on_disk.contains("Plans"));
    }

    #[test]
    fn test_describe() {
        let p = JsonFilePersistence::new("/tmp/x.json");
        assert_eq!(p.describe(), "file:/tmp/x.json");
    }
}
