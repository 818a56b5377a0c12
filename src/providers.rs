pub mod filesystem;
pub mod memory;
pub mod object_store;
pub mod s3;

use std::{fmt, path::Path, rc::Rc};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::utils::object_key;

use self::object_store::Bucket;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    File,
    Directory,
}

/// What the listing that produced a file node knew about it
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
    pub storage_class: Option<String>,
}

/// Storage system a tree is bound to. Chosen when the root node is built and
/// handed down to every child, so one client serves the whole tree.
#[derive(Clone)]
pub enum Backend {
    Local,
    ObjectStore(Rc<Bucket>),
}

impl Backend {
    pub fn in_bucket(bucket: Bucket) -> Backend {
        Backend::ObjectStore(Rc::new(bucket))
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Backend::Local)
    }

    pub fn name(&self) -> &str {
        match self {
            Backend::Local => "local",
            Backend::ObjectStore(bucket) => bucket.name(),
        }
    }

    /// Existence probe shared by directories and files.
    ///
    /// Never fails: any backend error is reported as non-existence.
    pub(crate) fn exists(&self, path: &str, kind: Kind) -> bool {
        match self {
            Backend::Local => Path::new(path).exists(),
            Backend::ObjectStore(bucket) => {
                let key = object_key(path);
                let probe = match kind {
                    Kind::Directory => bucket.has_prefix(key),
                    Kind::File => bucket.head(key).map(|_| true),
                };
                probe.unwrap_or_else(|err| {
                    debug!(bucket = bucket.name(), key, %err, "existence probe failed");
                    false
                })
            }
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Backend::Local => write!(f, "Local"),
            Backend::ObjectStore(bucket) => write!(f, "ObjectStore({})", bucket.name()),
        }
    }
}
