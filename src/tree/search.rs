use std::rc::Rc;

use super::{Directory, Entries, FileSystemObject};
use crate::err::Result;

/// Name filter used by searches. A mask containing `*` matches every name
/// which contains the mask with the stars removed, any other mask has to
/// equal the name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NameMask {
    Contains(String),
    Exact(String),
}

impl NameMask {
    pub fn new(mask: &str) -> NameMask {
        if mask.contains('*') {
            NameMask::Contains(mask.replace('*', ""))
        } else {
            NameMask::Exact(mask.to_owned())
        }
    }

    /// Empty names (the root) never match
    pub fn matches(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        match self {
            NameMask::Contains(part) => name.contains(part.as_str()),
            NameMask::Exact(exact) => name == exact,
        }
    }
}

impl From<&str> for NameMask {
    fn from(mask: &str) -> Self {
        NameMask::new(mask)
    }
}

impl Directory {
    /// Files and folders of this directory whose names match the mask
    pub fn find(self: &Rc<Self>, mask: &str) -> Result<Entries> {
        let mask = NameMask::new(mask);
        let entries = self.ls()?;
        Ok(Entries {
            files: entries
                .files
                .iter()
                .filter(|f| mask.matches(f.name()))
                .cloned()
                .collect(),
            folders: entries
                .folders
                .iter()
                .filter(|f| mask.matches(f.name()))
                .cloned()
                .collect(),
        })
    }

    /// Matches from the whole subtree. Each folder's results come before the
    /// matches of the level that contains it.
    pub fn find_all(self: &Rc<Self>, mask: &str) -> Result<Entries> {
        let mut found = Entries::default();
        for folder in self.ls_folders()?.iter() {
            found.extend(folder.find_all(mask)?);
        }
        found.extend(self.find(mask)?);
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use bytes::Bytes;

    use super::NameMask;
    use crate::{
        providers::{memory::MemoryStore, object_store::Bucket},
        tree::{Directory, FileSystemObject},
    };

    fn bucket_root(keys: &[&str]) -> Rc<Directory> {
        let store = MemoryStore::new();
        for key in keys {
            store.insert(key, Bytes::from_static(b"data"));
        }
        Directory::in_bucket(Rc::new(Bucket::new("photos", Box::new(store))), "")
    }

    #[test]
    fn star_mask_matches_substring() {
        let mask = NameMask::new("*.jpg");
        assert_eq!(mask, NameMask::Contains(String::from(".jpg")));
        assert!(mask.matches("x.jpg"));
        assert!(mask.matches("x.jpg.bak"));
        assert!(!mask.matches("x.png"));
        assert!(!mask.matches(""));
    }

    #[test]
    fn plain_mask_requires_equality() {
        let mask = NameMask::from("notes.txt");
        assert!(mask.matches("notes.txt"));
        assert!(!mask.matches("old-notes.txt"));
    }

    #[test]
    fn lone_star_matches_every_named_node() {
        let mask = NameMask::new("*");
        assert!(mask.matches("anything"));
        assert!(!mask.matches(""));
    }

    // Folders are matched against folder names. An older implementation
    // filtered the folder results out of the file list; that is not kept.
    #[test]
    fn find_matches_folders_against_folder_names() {
        let root = bucket_root(&["jpg-archive/a.txt", "x.jpg", "notes.txt"]);
        let found = root.find("*jpg*").unwrap();
        assert_eq!(found.files.names(), vec!["x.jpg"]);
        assert_eq!(found.folders.names(), vec!["jpg-archive"]);

        let found = root.find("notes.txt").unwrap();
        assert_eq!(found.files.names(), vec!["notes.txt"]);
        assert!(found.folders.is_empty());
    }

    #[test]
    fn find_is_shallow() {
        let root = bucket_root(&["x.jpg", "sub/y.jpg"]);
        let found = root.find("*.jpg").unwrap();
        assert_eq!(found.files.names(), vec!["x.jpg"]);
    }

    #[test]
    fn find_all_searches_every_level() {
        let root = bucket_root(&["x.jpg", "sub/y.jpg", "sub/deeper/z.jpg", "sub/readme.md"]);
        let found = root.find_all("*.jpg").unwrap();
        let paths: Vec<&str> = found.files.iter().map(|f| f.path()).collect();
        assert_eq!(paths, vec!["sub/deeper/z.jpg", "sub/y.jpg", "x.jpg"]);
        assert!(found.folders.is_empty());
    }

    #[test]
    fn find_all_collects_folders_from_subtrees() {
        let root = bucket_root(&["a/b/jpgs/1.jpg", "a/jpgs/2.jpg", "jpgs/3.jpg"]);
        let found = root.find_all("jpgs").unwrap();
        let paths: Vec<&str> = found.folders.iter().map(|f| f.path()).collect();
        assert_eq!(paths, vec!["a/b/jpgs/", "a/jpgs/", "jpgs/"]);
        assert!(found.files.is_empty());
    }
}
