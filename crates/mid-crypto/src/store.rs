//! # Snapshot Store
//!
//! JSON snapshots on the local filesystem. Writes go to `<path>.tmp`, are
//! synced, then renamed over the target, so a reader never observes a
//! partially written snapshot and a crash mid-write leaves the previous
//! snapshot intact.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use mid_core::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A directory holding JSON snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// A store rooted at `root`. Nothing is created until the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a snapshot given its path relative to the root.
    pub fn path_of(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    /// Serialize `value` and atomically replace the snapshot.
    pub fn write<T: Serialize>(
        &self,
        relative: impl AsRef<Path>,
        value: &T,
    ) -> Result<PathBuf, StorageError> {
        let path = self.path_of(relative);
        write_json_atomic(&path, value)?;
        Ok(path)
    }

    /// Read a snapshot if present. `Ok(None)` when the file does not exist.
    pub fn read_optional<T: DeserializeOwned>(
        &self,
        relative: impl AsRef<Path>,
    ) -> Result<Option<T>, StorageError> {
        let path = self.path_of(relative);
        if !path.exists() {
            return Ok(None);
        }
        read_json(&path).map(Some)
    }
}

/// Write `value` as pretty JSON to `path` via a synced temp file and rename.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = serde_json::to_vec_pretty(value)?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    let written = write_synced(&tmp_path, &bytes).and_then(|()| fs::rename(&tmp_path, path));
    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(&tmp_path) {
            tracing::debug!(path = %tmp_path.display(), error = %cleanup, "temp snapshot not removed");
        }
        return Err(e.into());
    }
    sync_parent(path)?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    Ok(())
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

/// Make the rename itself durable.
#[cfg(unix)]
fn sync_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::File::open(parent)?.sync_all(),
        _ => fs::File::open(".")?.sync_all(),
    }
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let sample = Sample {
            name: "alpha".into(),
            count: 3,
        };
        let path = store.write("nested/sample.json", &sample).unwrap();
        assert!(path.ends_with("nested/sample.json"));
        let back: Sample = read_json(&path).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn overwrite_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        for count in 0..3 {
            store
                .write(
                    "s.json",
                    &Sample {
                        name: "x".into(),
                        count,
                    },
                )
                .unwrap();
        }
        let back: Sample = read_json(&store.path_of("s.json")).unwrap();
        assert_eq!(back.count, 2);
        assert!(!dir.path().join("s.json.tmp").exists());
    }

    #[test]
    fn read_optional_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let value: Option<Sample> = store.read_optional("absent.json").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn read_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SnapshotStore::new(dir.path());
        let result: Result<Sample, _> = read_json(&store.path_of("absent.json"));
        assert!(matches!(result, Err(StorageError::Io(_))));
    }

    #[test]
    fn read_corrupt_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), b"{not json").unwrap();
        let store = SnapshotStore::new(dir.path());
        let result: Result<Option<Sample>, _> = store.read_optional("bad.json");
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("occupied.json");
        fs::create_dir_all(target.join("child")).unwrap();

        let sample = Sample {
            name: "x".into(),
            count: 1,
        };
        assert!(matches!(
            write_json_atomic(&target, &sample),
            Err(StorageError::Io(_))
        ));
        assert!(!dir.path().join("occupied.json.tmp").exists());
        assert!(target.is_dir());
    }
}
