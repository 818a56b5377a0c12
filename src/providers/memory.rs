//! `BTreeMap`-backed object store for tests and embedding. Listing follows
//! S3 semantics: keys in lexicographic order, delimiter roll-up into common
//! prefixes and paginated responses.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
};

use bytes::Bytes;
use chrono::Utc;

use super::{
    object_store::{ListPage, ListRequest, ObjectStoreClient, ObjectSummary},
    Metadata,
};
use crate::err::{Error, Result};

const DEFAULT_PAGE_SIZE: usize = 1000;

enum Entry {
    Object(ObjectSummary),
    Prefix(String),
}

pub struct MemoryStore {
    objects: RefCell<BTreeMap<String, (Bytes, Metadata)>>,
    page_size: usize,
    list_requests: Cell<usize>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> MemoryStore {
        MemoryStore {
            objects: RefCell::new(BTreeMap::new()),
            page_size: page_size.max(1),
            list_requests: Cell::new(0),
        }
    }

    pub fn insert(&self, key: &str, content: Bytes) {
        let metadata = Metadata {
            size: Some(content.len() as u64),
            last_modified: Some(Utc::now()),
            storage_class: Some(String::from("STANDARD")),
        };
        self.objects
            .borrow_mut()
            .insert(key.to_owned(), (content, metadata));
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.borrow().keys().cloned().collect()
    }

    /// Number of listing requests served so far
    pub fn list_requests(&self) -> usize {
        self.list_requests.get()
    }

    fn entries(&self, prefix: &str, delimiter: Option<&str>) -> Vec<Entry> {
        let objects = self.objects.borrow();
        let mut entries = Vec::new();
        for (key, (_, metadata)) in objects.range(prefix.to_owned()..) {
            let rest = match key.strip_prefix(prefix) {
                Some(rest) => rest,
                None => break,
            };
            let rolled_up = delimiter
                .and_then(|d| rest.find(d).map(|i| i + d.len()))
                .map(|end| format!("{}{}", prefix, &rest[..end]));
            match rolled_up {
                Some(common) => {
                    let seen = matches!(entries.last(), Some(Entry::Prefix(last)) if *last == common);
                    if !seen {
                        entries.push(Entry::Prefix(common));
                    }
                }
                None => entries.push(Entry::Object(ObjectSummary {
                    key: key.clone(),
                    metadata: metadata.clone(),
                })),
            }
        }
        entries
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

impl ObjectStoreClient for MemoryStore {
    fn list_objects(&self, _bucket: &str, request: ListRequest<'_>) -> Result<ListPage> {
        self.list_requests.set(self.list_requests.get() + 1);
        let start = match request.continuation_token {
            None => 0,
            Some(token) => token.parse::<usize>().map_err(|_| {
                Error::InvalidArgument(format!("invalid continuation token: {}", token))
            })?,
        };
        let limit = request.max_keys.unwrap_or(self.page_size).min(self.page_size);
        let entries = self.entries(request.prefix, request.delimiter);
        let total = entries.len();
        let end = (start + limit).min(total);

        let mut page = ListPage::default();
        for entry in entries.into_iter().skip(start).take(end.saturating_sub(start)) {
            match entry {
                Entry::Object(object) => page.objects.push(object),
                Entry::Prefix(prefix) => page.common_prefixes.push(prefix),
            }
        }
        if end < total {
            page.next_continuation_token = Some(end.to_string());
        }
        Ok(page)
    }

    fn head_object(&self, _bucket: &str, key: &str) -> Result<ObjectSummary> {
        self.objects
            .borrow()
            .get(key)
            .map(|(_, metadata)| ObjectSummary {
                key: key.to_owned(),
                metadata: metadata.clone(),
            })
            .ok_or_else(|| Error::NotFound(key.to_owned()))
    }

    fn get_object(&self, _bucket: &str, key: &str) -> Result<Bytes> {
        self.objects
            .borrow()
            .get(key)
            .map(|(content, _)| content.clone())
            .ok_or_else(|| Error::NotFound(key.to_owned()))
    }

    fn put_object(&self, _bucket: &str, key: &str, content: Bytes) -> Result<()> {
        self.insert(key, content);
        Ok(())
    }
}
