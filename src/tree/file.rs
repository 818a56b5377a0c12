use std::{
    cell::{OnceCell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use bytes::Bytes;
use tracing::debug;

use super::{Directory, FileSystemObject};
use crate::{
    err::Result,
    providers::{filesystem, object_store::Bucket, Backend, Kind, Metadata},
    utils::{last_segment, object_key},
};

/// Leaf node. Content is fetched on the first [`File::read`] and kept for
/// the lifetime of the node.
pub struct File {
    path: String,
    backend: Backend,
    parent: Option<Weak<Directory>>,
    name: OnceCell<String>,
    metadata: Metadata,
    content: RefCell<Option<Bytes>>,
}

impl File {
    fn build(
        path: &str,
        backend: Backend,
        parent: Option<&Rc<Directory>>,
        metadata: Metadata,
        content: Option<Bytes>,
    ) -> Rc<File> {
        let path = match backend {
            Backend::Local => path,
            Backend::ObjectStore(_) => object_key(path),
        };
        Rc::new(File {
            path: path.trim_end_matches('/').to_owned(),
            backend,
            parent: parent.map(Rc::downgrade),
            name: OnceCell::new(),
            metadata,
            content: RefCell::new(content),
        })
    }

    /// Standalone file node, not attached to any directory
    pub fn new(path: &str, backend: Backend) -> Rc<File> {
        File::build(path, backend, None, Metadata::default(), None)
    }

    pub fn local(path: &str) -> Rc<File> {
        File::new(path, Backend::Local)
    }

    pub fn in_bucket(bucket: Rc<Bucket>, key: &str) -> Rc<File> {
        File::new(key, Backend::ObjectStore(bucket))
    }

    /// File found by listing `parent`, bound to the parent's backend
    pub(crate) fn listed(parent: &Rc<Directory>, path: &str, metadata: Metadata) -> Rc<File> {
        File::build(path, parent.backend().clone(), Some(parent), metadata, None)
    }

    /// File whose content is already in memory, e.g. the product of a
    /// conversion. Reading it never touches the backend.
    pub(crate) fn materialized(
        parent: &Rc<Directory>,
        path: &str,
        metadata: Metadata,
        content: Bytes,
    ) -> Rc<File> {
        File::build(
            path,
            parent.backend().clone(),
            Some(parent),
            metadata,
            Some(content),
        )
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Whether the content is already held in memory
    pub fn is_loaded(&self) -> bool {
        self.content.borrow().is_some()
    }

    pub fn read(&self) -> Result<Bytes> {
        if let Some(content) = self.content.borrow().as_ref() {
            return Ok(content.clone());
        }
        let content = match &self.backend {
            Backend::Local => filesystem::read_file(&self.path)?,
            Backend::ObjectStore(bucket) => bucket.download(&self.path)?,
        };
        debug!(path = %self.path, bytes = content.len(), "read file");
        *self.content.borrow_mut() = Some(content.clone());
        Ok(content)
    }

    /// Standalone copy of the file on another backend. The content is read
    /// here and held by the copy until it is saved.
    pub fn convert(&self, to: &Backend, path: &str) -> Result<Rc<File>> {
        let content = self.read()?;
        Ok(File::build(
            path,
            to.clone(),
            None,
            self.metadata.clone(),
            Some(content),
        ))
    }

    /// Writes the content to `path`, or back to where it was read from
    pub fn save(&self, path: Option<&str>) -> Result<()> {
        let content = self.read()?;
        let target = path.unwrap_or(&self.path);
        match &self.backend {
            Backend::Local => filesystem::write_file(target, &content)?,
            Backend::ObjectStore(bucket) => bucket.upload(object_key(target), content)?,
        }
        debug!(path = target, backend = self.backend.name(), "saved file");
        Ok(())
    }
}

impl FileSystemObject for File {
    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        self.name.get_or_init(|| last_segment(&self.path).to_owned())
    }

    fn exists(&self) -> bool {
        self.backend.exists(&self.path, Kind::File)
    }

    fn parent(&self) -> Option<Rc<Directory>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    fn backend(&self) -> &Backend {
        &self.backend
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "File: {}", self.path)
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path)
            .field("backend", &self.backend)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, rc::Rc};

    use bytes::Bytes;

    use super::*;
    use crate::{
        err::Error,
        providers::{
            memory::MemoryStore,
            object_store::{ListPage, ListRequest, ObjectStoreClient, ObjectSummary},
            s3::S3Error,
        },
    };

    fn offline() -> Error {
        Error::Store(S3Error::new("Request Error", "connection refused"))
    }

    struct OfflineStore;

    impl ObjectStoreClient for OfflineStore {
        fn list_objects(&self, _: &str, _: ListRequest<'_>) -> Result<ListPage> {
            Err(offline())
        }

        fn head_object(&self, _: &str, _: &str) -> Result<ObjectSummary> {
            Err(offline())
        }

        fn get_object(&self, _: &str, _: &str) -> Result<Bytes> {
            Err(offline())
        }

        fn put_object(&self, _: &str, _: &str, _: Bytes) -> Result<()> {
            Err(offline())
        }
    }

    #[test]
    fn local_read_is_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"first").unwrap();

        let file = File::local(path.to_str().unwrap());
        assert!(!file.is_loaded());
        assert_eq!(file.read().unwrap(), Bytes::from_static(b"first"));

        fs::write(&path, b"second").unwrap();
        assert_eq!(file.read().unwrap(), Bytes::from_static(b"first"));
        assert_eq!(file.name(), "notes.txt");
    }

    #[test]
    fn reading_missing_local_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let file = File::local(dir.path().join("gone.txt").to_str().unwrap());
        assert!(!file.exists());
        assert!(matches!(file.read(), Err(Error::NotFound(_))));
    }

    #[test]
    fn save_writes_to_new_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.bin");
        let copy = dir.path().join("b.bin");
        fs::write(&source, [0u8, 1, 2, 255]).unwrap();

        let file = File::local(source.to_str().unwrap());
        file.save(Some(copy.to_str().unwrap())).unwrap();
        assert_eq!(fs::read(&copy).unwrap(), vec![0u8, 1, 2, 255]);
    }

    #[test]
    fn save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.bin");
        fs::write(&source, b"x").unwrap();
        let file = File::local(source.to_str().unwrap());
        let target = dir.path().join("missing/a.bin");
        assert!(file.save(Some(target.to_str().unwrap())).is_err());
    }

    #[test]
    fn bucket_file_round_trips_through_store() {
        let store = MemoryStore::new();
        store.insert("docs/readme.md", Bytes::from_static(b"# hi"));
        let bucket = Rc::new(Bucket::new("b", Box::new(store)));

        let file = File::in_bucket(Rc::clone(&bucket), "/docs/readme.md");
        assert_eq!(file.path(), "docs/readme.md");
        assert!(file.exists());
        file.save(Some("/backup/readme.md")).unwrap();

        let copy = File::in_bucket(bucket, "backup/readme.md");
        assert_eq!(copy.read().unwrap(), Bytes::from_static(b"# hi"));
    }

    #[test]
    fn missing_object_is_not_found() {
        let bucket = Rc::new(Bucket::new("b", Box::new(MemoryStore::new())));
        let file = File::in_bucket(bucket, "nope.txt");
        assert!(!file.exists());
        assert!(matches!(file.read(), Err(Error::NotFound(k)) if k == "nope.txt"));
    }

    #[test]
    fn exists_swallows_transport_errors() {
        let bucket = Rc::new(Bucket::new("b", Box::new(OfflineStore)));
        let file = File::in_bucket(Rc::clone(&bucket), "a.txt");
        assert!(!file.exists());
        assert!(matches!(file.read(), Err(Error::Store(_))));

        let dir = Directory::in_bucket(bucket, "photos");
        assert!(!dir.exists());
    }

    #[test]
    fn convert_copies_content_to_other_backend() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("report.csv");
        fs::write(&source, b"a,b\n1,2\n").unwrap();
        let bucket = Rc::new(Bucket::new("b", Box::new(MemoryStore::new())));

        let file = File::local(source.to_str().unwrap());
        let copy = file
            .convert(&Backend::ObjectStore(Rc::clone(&bucket)), "/reports/report.csv")
            .unwrap();
        assert_eq!(copy.path(), "reports/report.csv");
        assert!(copy.is_loaded());
        assert!(copy.parent().is_none());
        assert!(!copy.exists());

        copy.save(None).unwrap();
        assert_eq!(
            bucket.download("reports/report.csv").unwrap(),
            Bytes::from_static(b"a,b\n1,2\n")
        );
    }

    #[test]
    fn display_names_kind_and_path() {
        let file = File::local("/tmp/x.jpg");
        assert_eq!(file.to_string(), "File: /tmp/x.jpg");
        assert_eq!(
            crate::tree::describe(&[file]),
            vec![String::from("File: /tmp/x.jpg")]
        );
    }
}
