use std::{
    fs::{self, DirEntry},
    path::Path,
};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::debug;

use super::{Kind, Metadata};
use crate::err::{Error, Result};

#[derive(Clone, Debug)]
pub struct FilesystemObject {
    pub name: String,
    pub kind: Kind,
    pub metadata: Metadata,
}

impl FilesystemObject {
    /// `None` for entries that are neither files nor directories, including
    /// dangling symlinks and entries that cannot be stat'ed
    fn from_entry(entry: DirEntry) -> Option<FilesystemObject> {
        // Follows symlinks, like the directory listing a user would expect
        let metadata = match fs::metadata(entry.path()) {
            Ok(metadata) => metadata,
            Err(err) => {
                debug!(path = %entry.path().display(), %err, "skipping unreadable entry");
                return None;
            }
        };
        let kind = if metadata.is_dir() {
            Kind::Directory
        } else if metadata.is_file() {
            Kind::File
        } else {
            return None;
        };
        Some(FilesystemObject {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
            metadata: Metadata {
                size: Some(metadata.len()).filter(|_| kind == Kind::File),
                last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                storage_class: None,
            },
        })
    }
}

/// Lists the immediate entries of the directory, sorted by name.
/// Entries which are neither files nor directories are skipped.
pub fn list_dir(path: &str) -> Result<Vec<FilesystemObject>> {
    let handle_error = |e| Error::from_io(e, path);
    let mut objects = Vec::new();
    for entry in fs::read_dir(path).map_err(handle_error)? {
        let entry = entry.map_err(handle_error)?;
        if let Some(object) = FilesystemObject::from_entry(entry) {
            objects.push(object);
        }
    }
    objects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(objects)
}

pub fn read_file(path: &str) -> Result<Bytes> {
    fs::read(path)
        .map(Bytes::from)
        .map_err(|e| Error::from_io(e, path))
}

/// Writes whole buffer to the file, creating or truncating it
pub fn write_file(path: &str, content: &[u8]) -> Result<()> {
    fs::write(path, content).map_err(|e| Error::from_io(e, path))
}

pub fn create_dir(path: &str) -> Result<()> {
    if path.is_empty() || Path::new(path).is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| Error::from_io(e, path))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn lists_sorted_entries_with_kinds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), b"hello").unwrap();
        fs::write(dir.path().join("a.txt"), b"").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let objects = list_dir(dir.path().to_str().unwrap()).unwrap();
        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        assert_eq!(objects[1].kind, Kind::File);
        assert_eq!(objects[1].metadata.size, Some(5));
        assert_eq!(objects[2].kind, Kind::Directory);
        assert_eq!(objects[2].metadata.size, None);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("broken")).unwrap();

        let objects = list_dir(dir.path().to_str().unwrap()).unwrap();
        let names: Vec<&str> = objects.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt"]);
    }

    #[test]
    fn listing_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = list_dir(missing.to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn write_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.bin");
        let path = path.to_str().unwrap();
        write_file(path, b"long content").unwrap();
        write_file(path, b"short").unwrap();
        assert_eq!(read_file(path).unwrap(), Bytes::from_static(b"short"));
    }

    #[test]
    fn create_dir_builds_nested_path() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        create_dir(nested.to_str().unwrap()).unwrap();
        assert!(nested.is_dir());
        create_dir(nested.to_str().unwrap()).unwrap();
    }
}
