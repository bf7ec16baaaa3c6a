//! Filesystem blob store: each key maps to a file under a root directory,
//! `/`-separated key segments becoming subdirectories.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use egonet_core::errors::{EgoNetError, EgoNetResult};
use egonet_core::traits::IBlobStorage;

use crate::to_io_err;

const BLOB_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "tmp";

pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> EgoNetResult<Self> {
        let root = root.into();
        if root.as_os_str().is_empty() {
            return Err(EgoNetError::invalid(
                "refusing to use an empty storage location",
            ));
        }
        fs::create_dir_all(&root).map_err(|e| to_io_err(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to its file, rejecting segments that could escape the root.
    fn path_for(&self, key: &str) -> EgoNetResult<PathBuf> {
        let mut path = self.root.clone();
        let mut segments = key.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segment.is_empty() || segment == "." || segment == ".." || segment.contains('\\') {
                return Err(EgoNetError::invalid(format!("invalid storage key: {key:?}")));
            }
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}.{BLOB_EXTENSION}"));
            }
        }
        Ok(path)
    }
}

impl IBlobStorage for FileStorage {
    fn get(&self, key: &str) -> EgoNetResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(to_io_err(&path, e)),
        }
    }

    /// Writes go to a sibling temp file and are renamed into place, so readers
    /// never observe a half-written blob.
    fn put(&self, key: &str, blob: &[u8]) -> EgoNetResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| to_io_err(parent, e))?;
        }
        let mut temp = path.clone().into_os_string();
        temp.push(".");
        temp.push(TEMP_EXTENSION);
        let temp = PathBuf::from(temp);
        fs::write(&temp, blob).map_err(|e| to_io_err(&temp, e))?;
        fs::rename(&temp, &path).map_err(|e| to_io_err(&path, e))?;
        tracing::trace!(key, bytes = blob.len(), "blob written");
        Ok(())
    }

    fn delete(&self, key: &str) -> EgoNetResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(to_io_err(&path, e)),
        }
    }

    fn contains(&self, key: &str) -> EgoNetResult<bool> {
        Ok(self.path_for(key)?.is_file())
    }
}
