use std::rc::Rc;

use tracing::debug;

use super::{Directory, File, FileSystemObject, ObjectList};
use crate::{
    err::{Error, Result},
    providers::{object_store::ObjectSummary, Backend},
};

impl Directory {
    /// Fetches every object under the directory in one recursive listing and
    /// rebuilds the whole subtree from it. Previous children are replaced,
    /// every rebuilt directory is cached.
    pub fn cache_all(self: &Rc<Self>) -> Result<()> {
        let bucket = match self.backend() {
            Backend::Local => {
                return Err(Error::NotImplemented(
                    "recursive listing of a local directory",
                ))
            }
            Backend::ObjectStore(bucket) => Rc::clone(bucket),
        };
        let listing = bucket.list(self.prefix(), None)?;
        let count = listing.objects.len();
        self.sort_objects(listing.objects);
        debug!(path = %self.path(), objects = count, "rebuilt tree from flat listing");
        Ok(())
    }

    /// Groups keys by their first segment below this directory's prefix.
    /// Single segment keys are files of this directory, the rest is handed
    /// down to the child folder named by the first segment.
    fn sort_objects(self: &Rc<Self>, objects: Vec<ObjectSummary>) {
        let parent_name = self.parent().map(|parent| parent.name().to_owned());
        let prefix = self.prefix().to_owned();
        let mut files = ObjectList::new();
        // Keeps the order in which folders were first seen
        let mut groups: Vec<(String, Vec<ObjectSummary>)> = Vec::new();

        for object in objects {
            let relative = match object.key.strip_prefix(prefix.as_str()) {
                Some(relative) => relative,
                None => continue,
            };
            let is_marker = relative.ends_with('/');
            let mut segments = relative.split('/').filter(|s| !s.is_empty());
            let first = match segments.next() {
                Some(first) => first.to_owned(),
                // marker of this very directory
                None => continue,
            };
            let nested = segments.next().is_some();

            if !nested && !is_marker {
                files.push(File::listed(self, &object.key, object.metadata));
                continue;
            }
            // A key echoing the parent's name stays at this level
            if parent_name.as_deref() == Some(first.as_str()) {
                if !is_marker {
                    files.push(File::listed(self, &object.key, object.metadata));
                }
                continue;
            }
            match groups.iter_mut().find(|(name, _)| *name == first) {
                Some((_, group)) => group.push(object),
                None => groups.push((first, vec![object])),
            }
        }

        let mut folders = ObjectList::new();
        for (name, group) in groups {
            let child = self.child(&name);
            child.sort_objects(group);
            folders.push(child);
        }
        self.fill(files, folders);
    }
}
