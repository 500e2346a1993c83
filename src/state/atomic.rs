//! 原子写入：同目录临时文件写完并 fsync 后再 rename 覆盖目标文件
//!
//! 读者在任意时刻只能看到旧的完整文件或新的完整文件。

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::StateError;

/// 目标文件所在目录；裸文件名时为当前目录
fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// 第一阶段：在目标目录中写好临时文件。返回的临时文件被 drop 时自动删除，目标文件不受影响。
pub(crate) fn stage(path: &Path, data: &[u8]) -> Result<NamedTempFile, StateError> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir).map_err(|source| StateError::CreateDir {
        path: dir.clone(),
        source,
    })?;

    let write_err = |source| StateError::WriteTemp {
        dir: dir.clone(),
        source,
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".state-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(write_err)?;
    temp.write_all(data).map_err(write_err)?;
    temp.as_file().sync_all().map_err(write_err)?;
    Ok(temp)
}

/// 第二阶段：rename 覆盖目标文件
pub(crate) fn commit(temp: NamedTempFile, path: &Path) -> Result<(), StateError> {
    temp.persist(path).map_err(|e| StateError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

pub(crate) fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StateError> {
    let temp = stage(path, data)?;
    commit(temp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leftover_temp_files(dir: &Path) -> usize {
        std::fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count()
    }

    #[test]
    fn test_write_atomic_creates_parent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/state.json");

        write_atomic(&path, b"{\"sent\": {}}").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"sent\": {}}");
        assert_eq!(leftover_temp_files(path.parent().unwrap()), 0);
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn test_interrupted_before_rename_keeps_previous() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "previous").unwrap();

        let staged = stage(&path, b"half of the new snapshot").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
        drop(staged);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous");
        assert_eq!(leftover_temp_files(dir.path()), 0);
    }

    #[test]
    fn test_stage_fails_when_parent_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = stage(&blocker.join("state.json"), b"{}").unwrap_err();
        assert!(matches!(err, StateError::CreateDir { .. }));
    }
}
