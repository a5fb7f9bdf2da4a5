// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Backup of existing pose documents before regeneration.
//!
//! Documents are replaced wholesale on regeneration, never patched in
//! place. Ahead of a regenerating batch run, the existing documents are
//! copied into a timestamped backup directory and then removed, so the
//! output directory only ever contains documents from a single run.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PoseError, Result};

/// Back up all `*.json` documents in `poses_dir` and remove the originals.
///
/// The backup lands in `backup_root/poses_backup_<timestamp>/`. Returns the
/// backup directory and the number of files moved, or `None` when there was
/// nothing to back up.
///
/// # Errors
///
/// Returns an error if the directories cannot be read or created, or a file
/// cannot be copied. Originals are only removed after every copy succeeded.
pub fn backup_documents(poses_dir: &Path, backup_root: &Path) -> Result<Option<(PathBuf, usize)>> {
    if !poses_dir.is_dir() {
        return Ok(None);
    }

    let mut documents: Vec<PathBuf> = fs::read_dir(poses_dir)
        .map_err(|e| PoseError::IoMsg(format!("Cannot read {}: {e}", poses_dir.display())))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    documents.sort();

    if documents.is_empty() {
        return Ok(None);
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let backup_dir = backup_root.join(format!("poses_backup_{timestamp}"));
    fs::create_dir_all(&backup_dir).map_err(|e| {
        PoseError::IoMsg(format!(
            "Failed to create backup directory {}: {e}",
            backup_dir.display()
        ))
    })?;

    for document in &documents {
        let name = document
            .file_name()
            .ok_or_else(|| PoseError::IoMsg(format!("Bad file name: {}", document.display())))?;
        fs::copy(document, backup_dir.join(name)).map_err(|e| {
            PoseError::IoMsg(format!("Failed to back up {}: {e}", document.display()))
        })?;
    }

    for document in &documents {
        fs::remove_file(document).map_err(|e| {
            PoseError::IoMsg(format!("Failed to remove {}: {e}", document.display()))
        })?;
    }

    Ok(Some((backup_dir, documents.len())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_moves_documents() {
        let dir = tempfile::tempdir().unwrap();
        let poses = dir.path().join("poses");
        let backups = dir.path().join("backups");
        fs::create_dir(&poses).unwrap();
        fs::write(poses.join("a.json"), b"{}").unwrap();
        fs::write(poses.join("b.json"), b"{}").unwrap();
        fs::write(poses.join("keep.txt"), b"x").unwrap();

        let (backup_dir, count) = backup_documents(&poses, &backups).unwrap().unwrap();

        assert_eq!(count, 2);
        assert!(backup_dir.join("a.json").is_file());
        assert!(backup_dir.join("b.json").is_file());
        assert!(!poses.join("a.json").exists());
        assert!(!poses.join("b.json").exists());
        // Non-document files stay put.
        assert!(poses.join("keep.txt").is_file());
    }

    #[test]
    fn test_backup_nothing_to_do() {
        let dir = tempfile::tempdir().unwrap();
        let poses = dir.path().join("poses");
        fs::create_dir(&poses).unwrap();

        assert!(backup_documents(&poses, dir.path()).unwrap().is_none());
        assert!(backup_documents(dir.path().join("missing").as_path(), dir.path())
            .unwrap()
            .is_none());
    }
}
