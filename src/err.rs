//! Module that defines tree errors
use std::io;

use thiserror::Error;

use crate::providers::s3::S3Error;

/// Errors returned by tree operations and the backends behind them
#[derive(Debug, Error)]
pub enum Error {
    /// File or object is absent on read
    #[error("not found: {0}")]
    NotFound(String),

    /// Operation is not supported by the node's backend
    #[error("operation not supported: {0}")]
    NotImplemented(&'static str),

    /// Unrecognised backend, store kind or malformed location
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Value inserted into an object list is not a node of the list's type
    #[error("validation error: {0}")]
    Validation(String),

    /// Local filesystem read or write failure
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Object store request failure
    #[error("object store error: {0}")]
    Store(S3Error),
}

impl Error {
    /// Maps given io::Error to an Error, turning missing files into NotFound
    ///
    /// * `err` - io::Error to map
    /// * `path` - path of the file which caused the error
    pub fn from_io(err: io::Error, path: &str) -> Error {
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_owned()),
            _ => Error::Io {
                path: path.to_owned(),
                source: err,
            },
        }
    }
}

impl From<S3Error> for Error {
    fn from(err: S3Error) -> Self {
        match err.code() {
            "NoSuchKey" => Error::NotFound(err.resource().unwrap_or_default().to_owned()),
            _ => Error::Store(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use std::io;

    use super::Error;
    use crate::providers::s3::S3Error;

    #[test]
    fn missing_file_maps_to_not_found() {
        let err = Error::from_io(io::Error::from(io::ErrorKind::NotFound), "/tmp/missing");
        assert!(matches!(err, Error::NotFound(p) if p == "/tmp/missing"));
    }

    #[test]
    fn other_io_errors_keep_their_path() {
        let err = Error::from_io(
            io::Error::from(io::ErrorKind::PermissionDenied),
            "/root/secret",
        );
        match err {
            Error::Io { path, source } => {
                assert_eq!(path, "/root/secret");
                assert_eq!(source.kind(), io::ErrorKind::PermissionDenied);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn no_such_key_becomes_not_found() {
        let err: Error = S3Error::new("NoSuchKey", "The specified key does not exist.")
            .with_resource("photos/cat.jpg")
            .into();
        assert!(matches!(err, Error::NotFound(k) if k == "photos/cat.jpg"));

        let err: Error = S3Error::new("AccessDenied", "Access Denied").into();
        assert!(matches!(err, Error::Store(e) if e.code() == "AccessDenied"));
    }
}
