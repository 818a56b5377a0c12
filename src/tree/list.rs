use std::{any::Any, fmt, rc::Rc, slice};

use super::{Directory, File, FileSystemObject};
use crate::err::{Error, Result};

/// Ordered collection of tree nodes of one kind.
///
/// Typed insertion goes through [`ObjectList::push`]. Values of unknown type
/// are checked by [`ObjectList::try_append`] and [`ObjectList::try_extend`],
/// which reject anything but `Rc<T>`.
pub struct ObjectList<T> {
    items: Vec<Rc<T>>,
}

impl<T: FileSystemObject> ObjectList<T> {
    pub fn new() -> ObjectList<T> {
        ObjectList { items: Vec::new() }
    }

    pub fn push(&mut self, item: Rc<T>) {
        self.items.push(item);
    }

    fn validate(value: Rc<dyn Any>) -> Result<Rc<T>> {
        value.downcast::<T>().map_err(|_| {
            let expected = std::any::type_name::<T>()
                .rsplit("::")
                .next()
                .unwrap_or("node");
            Error::Validation(format!(
                "unknown object type, expected an instance of {}",
                expected
            ))
        })
    }

    pub fn try_append(&mut self, value: Rc<dyn Any>) -> Result<()> {
        self.items.push(Self::validate(value)?);
        Ok(())
    }

    /// Appends every value, or none of them if any fails validation
    pub fn try_extend<I>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = Rc<dyn Any>>,
    {
        let validated = values
            .into_iter()
            .map(Self::validate)
            .collect::<Result<Vec<_>>>()?;
        self.items.extend(validated);
        Ok(())
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Rc<T>> {
        self.items.iter().find(|item| item.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.name()).collect()
    }
}

impl<T> ObjectList<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&Rc<T>> {
        self.items.get(i)
    }

    pub fn iter(&self) -> slice::Iter<'_, Rc<T>> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Rc<T>] {
        &self.items
    }
}

impl<T> Default for ObjectList<T> {
    fn default() -> Self {
        ObjectList { items: Vec::new() }
    }
}

impl<T> Clone for ObjectList<T> {
    fn clone(&self) -> Self {
        ObjectList {
            items: self.items.clone(),
        }
    }
}

impl<T> Extend<Rc<T>> for ObjectList<T> {
    fn extend<I: IntoIterator<Item = Rc<T>>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> FromIterator<Rc<T>> for ObjectList<T> {
    fn from_iter<I: IntoIterator<Item = Rc<T>>>(iter: I) -> Self {
        ObjectList {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> IntoIterator for ObjectList<T> {
    type Item = Rc<T>;
    type IntoIter = std::vec::IntoIter<Rc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ObjectList<T> {
    type Item = &'a Rc<T>;
    type IntoIter = slice::Iter<'a, Rc<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<T: fmt::Display> fmt::Debug for ObjectList<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list()
            .entries(self.items.iter().map(|item| item.to_string()))
            .finish()
    }
}

/// Files and folders of one directory, or of a search across a subtree
#[derive(Clone, Debug, Default)]
pub struct Entries {
    pub files: ObjectList<File>,
    pub folders: ObjectList<Directory>,
}

impl Entries {
    pub fn extend(&mut self, other: Entries) {
        self.files.extend(other.files);
        self.folders.extend(other.folders);
    }
}
