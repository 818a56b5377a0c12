//! Contract between the tree and a flat key-addressed object store.
//!
//! A [`Bucket`] couples a store client with the bucket name every request is
//! made against, and turns the paginated listing API into whole results.

use std::rc::Rc;

use bytes::Bytes;
use tracing::{debug, warn};

use super::Metadata;
use crate::err::Result;

/// One object returned by a listing or a head request
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    pub metadata: Metadata,
}

impl ObjectSummary {
    pub fn new(key: &str) -> ObjectSummary {
        ObjectSummary {
            key: key.to_owned(),
            metadata: Metadata::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ListRequest<'a> {
    pub prefix: &'a str,
    /// With a delimiter only one level is listed, deeper keys are rolled up
    /// into common prefixes
    pub delimiter: Option<&'a str>,
    pub continuation_token: Option<&'a str>,
    pub max_keys: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
    /// Present when more pages follow
    pub next_continuation_token: Option<String>,
}

/// Blocking object store API. Implementations map store failures onto
/// [`crate::Error`], reporting missing keys as `Error::NotFound`.
pub trait ObjectStoreClient {
    fn list_objects(&self, bucket: &str, request: ListRequest<'_>) -> Result<ListPage>;
    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectSummary>;
    fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes>;
    fn put_object(&self, bucket: &str, key: &str, content: Bytes) -> Result<()>;
}

/// Lets several buckets, or a bucket and its owner, share one client
impl<C: ObjectStoreClient + ?Sized> ObjectStoreClient for Rc<C> {
    fn list_objects(&self, bucket: &str, request: ListRequest<'_>) -> Result<ListPage> {
        (**self).list_objects(bucket, request)
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectSummary> {
        (**self).head_object(bucket, key)
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        (**self).get_object(bucket, key)
    }

    fn put_object(&self, bucket: &str, key: &str, content: Bytes) -> Result<()> {
        (**self).put_object(bucket, key, content)
    }
}

/// Complete listing gathered from every page
#[derive(Clone, Debug, Default)]
pub struct Listing {
    pub objects: Vec<ObjectSummary>,
    pub common_prefixes: Vec<String>,
}

pub struct Bucket {
    name: String,
    client: Box<dyn ObjectStoreClient>,
}

impl Bucket {
    pub fn new(name: &str, client: Box<dyn ObjectStoreClient>) -> Bucket {
        Bucket {
            name: name.to_owned(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lists everything under the prefix, following continuation tokens
    pub fn list(&self, prefix: &str, delimiter: Option<&str>) -> Result<Listing> {
        let mut listing = Listing::default();
        let mut token: Option<String> = None;
        let mut pages = 0;
        loop {
            let page = self.client.list_objects(
                &self.name,
                ListRequest {
                    prefix,
                    delimiter,
                    continuation_token: token.as_deref(),
                    max_keys: None,
                },
            )?;
            pages += 1;
            listing.objects.extend(page.objects);
            listing.common_prefixes.extend(page.common_prefixes);
            match page.next_continuation_token {
                // A store repeating the token would never finish
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    warn!(
                        bucket = %self.name,
                        prefix,
                        token = %next,
                        "continuation token repeated, stopping"
                    );
                    break;
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }
        debug!(
            bucket = %self.name,
            prefix,
            pages,
            objects = listing.objects.len(),
            prefixes = listing.common_prefixes.len(),
            "listed objects"
        );
        Ok(listing)
    }

    /// Whether at least one key starts with the prefix
    pub fn has_prefix(&self, prefix: &str) -> Result<bool> {
        let page = self.client.list_objects(
            &self.name,
            ListRequest {
                prefix,
                max_keys: Some(1),
                ..Default::default()
            },
        )?;
        Ok(!page.objects.is_empty() || !page.common_prefixes.is_empty())
    }

    pub fn head(&self, key: &str) -> Result<ObjectSummary> {
        self.client.head_object(&self.name, key)
    }

    pub fn download(&self, key: &str) -> Result<Bytes> {
        self.client.get_object(&self.name, key)
    }

    pub fn upload(&self, key: &str, content: Bytes) -> Result<()> {
        self.client.put_object(&self.name, key, content)
    }
}
