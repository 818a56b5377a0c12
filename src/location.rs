//! Textual addresses of trees: `s3://bucket/prefix`, `file:///path` or a
//! bare local path.
use std::{fmt, rc::Rc, str::FromStr};

use crate::{
    config::StoreConfig,
    err::{Error, Result},
    providers::{object_store::Bucket, s3::S3Provider, Backend},
    tree::{Directory, File},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    Local(String),
    Bucket { bucket: String, prefix: String },
}

impl Location {
    /// Path of the location inside its backend, a key prefix for buckets
    pub fn path(&self) -> &str {
        match self {
            Location::Local(path) => path,
            Location::Bucket { prefix, .. } => prefix,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Location::Local(_))
    }

    /// Backend serving the location. A new S3 client is built for buckets.
    pub fn backend(&self, config: &StoreConfig) -> Result<Backend> {
        match self {
            Location::Local(_) => Ok(Backend::Local),
            Location::Bucket { bucket, .. } => {
                let provider = S3Provider::new(config)?;
                Ok(Backend::ObjectStore(Rc::new(Bucket::new(
                    bucket,
                    Box::new(provider),
                ))))
            }
        }
    }

    pub fn open_dir(&self, config: &StoreConfig) -> Result<Rc<Directory>> {
        Ok(Directory::new(self.path(), self.backend(config)?))
    }

    pub fn open_file(&self, config: &StoreConfig) -> Result<Rc<File>> {
        Ok(File::new(self.path(), self.backend(config)?))
    }
}

impl FromStr for Location {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if let Some(rest) = s.strip_prefix("s3://") {
            let (bucket, prefix) = rest.split_once('/').unwrap_or((rest, ""));
            if bucket.is_empty() {
                return Err(Error::InvalidArgument(format!("missing bucket name in {}", s)));
            }
            return Ok(Location::Bucket {
                bucket: bucket.to_owned(),
                prefix: prefix.to_owned(),
            });
        }
        if let Some(path) = s.strip_prefix("file://") {
            return Ok(Location::Local(path.to_owned()));
        }
        match s.split_once("://") {
            Some((scheme, _)) => Err(Error::InvalidArgument(format!(
                "unsupported backend: {}",
                scheme
            ))),
            None => Ok(Location::Local(s.to_owned())),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Location::Local(path) => write!(f, "{}", path),
            Location::Bucket { bucket, prefix } => write!(f, "s3://{}/{}", bucket, prefix),
        }
    }
}
