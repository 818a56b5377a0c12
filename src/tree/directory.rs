use std::{
    cell::{Cell, OnceCell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use tracing::{debug, info};

use super::{Entries, File, FileSystemObject, ObjectList};
use crate::{
    err::Result,
    providers::{filesystem, object_store::Bucket, Backend, Kind},
    utils::{dir_path, join_path, last_segment, object_key},
};

/// Composite node. `files` and `folders` mean nothing until the first
/// listing sets `cached`; after that they are a fixed snapshot.
pub struct Directory {
    path: String,
    backend: Backend,
    parent: Option<Weak<Directory>>,
    name: OnceCell<String>,
    files: RefCell<ObjectList<File>>,
    folders: RefCell<ObjectList<Directory>>,
    cached: Cell<bool>,
}

impl Directory {
    fn build(path: &str, backend: Backend, parent: Option<&Rc<Directory>>) -> Rc<Directory> {
        let path = match backend {
            Backend::Local => dir_path(path),
            Backend::ObjectStore(_) => dir_path(object_key(path)),
        };
        Rc::new(Directory {
            path,
            backend,
            parent: parent.map(Rc::downgrade),
            name: OnceCell::new(),
            files: RefCell::new(ObjectList::new()),
            folders: RefCell::new(ObjectList::new()),
            cached: Cell::new(false),
        })
    }

    /// Root directory of a tree on the given backend
    pub fn new(path: &str, backend: Backend) -> Rc<Directory> {
        Directory::build(path, backend, None)
    }

    pub fn local(path: &str) -> Rc<Directory> {
        Directory::new(path, Backend::Local)
    }

    /// Directory for a key prefix. The empty prefix (or "/") is the bucket root.
    pub fn in_bucket(bucket: Rc<Bucket>, prefix: &str) -> Rc<Directory> {
        Directory::new(prefix, Backend::ObjectStore(bucket))
    }

    /// Path children are placed under. The bucket root has no leading
    /// separator, so its children are plain keys.
    fn base(&self) -> &str {
        match self.backend {
            Backend::ObjectStore(_) if self.path == "/" => "",
            _ => &self.path,
        }
    }

    /// Key prefix used to list the directory in an object store
    pub(crate) fn prefix(&self) -> &str {
        object_key(&self.path)
    }

    pub(crate) fn child(self: &Rc<Self>, name: &str) -> Rc<Directory> {
        Directory::build(
            &format!("{}{}", self.base(), name),
            self.backend.clone(),
            Some(self),
        )
    }

    pub(crate) fn child_file_path(&self, name: &str) -> String {
        format!("{}{}", self.base(), name)
    }

    /// Replaces the children with a complete snapshot
    pub(crate) fn fill(&self, files: ObjectList<File>, folders: ObjectList<Directory>) {
        *self.files.borrow_mut() = files;
        *self.folders.borrow_mut() = folders;
        self.cached.set(true);
    }

    pub fn is_cached(&self) -> bool {
        self.cached.get()
    }

    /// Drops the cached children, the next listing asks the backend again
    pub fn invalidate(&self) {
        *self.files.borrow_mut() = ObjectList::new();
        *self.folders.borrow_mut() = ObjectList::new();
        self.cached.set(false);
    }

    /// Lists the immediate children of the directory
    fn get_objects(self: &Rc<Self>) -> Result<()> {
        let mut files = ObjectList::new();
        let mut folders = ObjectList::new();
        match &self.backend {
            Backend::Local => {
                for object in filesystem::list_dir(&self.path)? {
                    match object.kind {
                        Kind::File => files.push(File::listed(
                            self,
                            &self.child_file_path(&object.name),
                            object.metadata,
                        )),
                        Kind::Directory => folders.push(self.child(&object.name)),
                    }
                }
            }
            Backend::ObjectStore(bucket) => {
                let prefix = self.prefix();
                let listing = bucket.list(prefix, Some("/"))?;
                for object in listing.objects {
                    // Folder marker of this very directory
                    if object.key == prefix {
                        continue;
                    }
                    files.push(File::listed(self, &object.key, object.metadata));
                }
                for common_prefix in listing.common_prefixes {
                    folders.push(Directory::build(
                        &common_prefix,
                        self.backend.clone(),
                        Some(self),
                    ));
                }
            }
        }
        debug!(
            path = %self.path,
            files = files.len(),
            folders = folders.len(),
            "listed directory"
        );
        self.fill(files, folders);
        Ok(())
    }

    /// Files and folders of this directory. Only the first call reaches the
    /// backend, later calls return the same nodes.
    pub fn ls(self: &Rc<Self>) -> Result<Entries> {
        if !self.cached.get() {
            self.get_objects()?;
        }
        Ok(Entries {
            files: self.files.borrow().clone(),
            folders: self.folders.borrow().clone(),
        })
    }

    pub fn ls_files(self: &Rc<Self>) -> Result<ObjectList<File>> {
        Ok(self.ls()?.files)
    }

    pub fn ls_folders(self: &Rc<Self>) -> Result<ObjectList<Directory>> {
        Ok(self.ls()?.folders)
    }

    /// Child directory bound to this one. Relative paths are joined to this
    /// directory, a leading '/' makes the path absolute. Nothing is listed.
    pub fn cd(self: &Rc<Self>, path: &str) -> Rc<Directory> {
        let path = if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("{}{}", self.base(), path)
        };
        Directory::build(&path, self.backend.clone(), Some(self))
    }

    /// Writes the whole subtree under `path` (or back to this directory's own
    /// path), folders first. Nothing is rolled back when a write fails.
    pub fn save(self: &Rc<Self>, path: Option<&str>) -> Result<()> {
        let base = path.unwrap_or_else(|| self.base());
        if self.backend.is_local() {
            filesystem::create_dir(base)?;
        }
        for folder in self.ls_folders()?.iter() {
            folder.save(Some(&join_path(base, folder.name())))?;
        }
        for file in self.ls_files()?.iter() {
            file.save(Some(&join_path(base, file.name())))?;
        }
        Ok(())
    }

    /// Copies the tree into nodes of another backend rooted at `path`.
    ///
    /// Every file is read, so the whole tree ends up in memory. The result
    /// is fully cached and exists only in memory until it is saved.
    pub fn convert(self: &Rc<Self>, to: &Backend, path: &str) -> Result<Rc<Directory>> {
        let root = Directory::new(path, to.clone());
        self.convert_into(&root)?;
        info!(
            from = %self.path,
            to = %root.path,
            backend = to.name(),
            "converted directory tree"
        );
        Ok(root)
    }

    fn convert_into(self: &Rc<Self>, target: &Rc<Directory>) -> Result<()> {
        let entries = self.ls()?;
        let mut folders = ObjectList::new();
        for folder in entries.folders.iter() {
            let converted = target.child(folder.name());
            folder.convert_into(&converted)?;
            folders.push(converted);
        }
        let mut files = ObjectList::new();
        for file in entries.files.iter() {
            files.push(File::materialized(
                target,
                &target.child_file_path(file.name()),
                file.metadata().clone(),
                file.read()?,
            ));
        }
        target.fill(files, folders);
        Ok(())
    }
}

impl FileSystemObject for Directory {
    fn path(&self) -> &str {
        &self.path
    }

    fn name(&self) -> &str {
        self.name.get_or_init(|| last_segment(&self.path).to_owned())
    }

    fn exists(&self) -> bool {
        self.backend.exists(&self.path, Kind::Directory)
    }

    fn parent(&self) -> Option<Rc<Directory>> {
        self.parent.as_ref().and_then(Weak::upgrade)
    }

    fn backend(&self) -> &Backend {
        &self.backend
    }
}

impl fmt::Display for Directory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Directory: {}", self.path)
    }
}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Directory")
            .field("path", &self.path)
            .field("backend", &self.backend)
            .field("cached", &self.cached.get())
            .finish()
    }
}
