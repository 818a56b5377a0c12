//! Uniform directory trees over the local filesystem and S3-compatible
//! buckets.
//!
//! A tree is rooted at a [`Directory`] bound to a [`Backend`]. Listing is
//! lazy and cached per node, a bucket can be rebuilt into a full hierarchy
//! from one flat listing with [`Directory::cache_all`], and any tree can be
//! converted into the node types of another backend and saved there.
//!
//! ```no_run
//! use std::rc::Rc;
//! use verstree::{Backend, Bucket, Directory, MemoryStore};
//!
//! # fn main() -> verstree::Result<()> {
//! let photos = Directory::local("/home/me/photos");
//! let bucket = Rc::new(Bucket::new("backup", Box::new(MemoryStore::new())));
//! let copy = photos.convert(&Backend::ObjectStore(bucket), "photos")?;
//! copy.save(None)?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod err;
pub mod location;
pub mod providers;
pub mod tree;
pub mod utils;

pub use config::{StoreConfig, StoreKind};
pub use err::{Error, Result};
pub use location::Location;
pub use providers::{
    memory::MemoryStore,
    object_store::{Bucket, ObjectStoreClient},
    s3::S3Provider,
    Backend, Metadata,
};
pub use tree::{describe, Directory, Entries, File, FileSystemObject, NameMask, ObjectList};
