//! Directory trees that look the same whichever backend holds the data.
//!
//! Nodes are reference counted. A directory owns its listed children through
//! its [`ObjectList`]s, children point back at their parent with a `Weak`
//! reference. Listing is lazy and cached per node: the first [`Directory::ls`]
//! asks the backend, later calls return the same snapshot until
//! [`Directory::invalidate`] or [`Directory::cache_all`] replaces it.
mod directory;
mod file;
mod list;
mod reconstruct;
mod search;

use std::{any::Any, fmt, rc::Rc};

pub use directory::Directory;
pub use file::File;
pub use list::{Entries, ObjectList};
pub use search::NameMask;

use crate::providers::Backend;

/// Capabilities shared by directories and files
pub trait FileSystemObject: Any + fmt::Display {
    /// Normalized path. Directories end with '/', the root is "/"
    fn path(&self) -> &str;

    /// Last non-empty path segment, "" for the root
    fn name(&self) -> &str;

    /// Asks the backend whether the object is there. Backend failures are
    /// reported as `false`.
    fn exists(&self) -> bool;

    fn parent(&self) -> Option<Rc<Directory>>;

    fn backend(&self) -> &Backend;
}

/// Textual form of every node, `"<Kind>: <path>"`
pub fn describe<T: FileSystemObject>(objects: &[Rc<T>]) -> Vec<String> {
    objects.iter().map(|o| o.to_string()).collect()
}
