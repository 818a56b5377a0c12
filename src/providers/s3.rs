extern crate quick_xml;
extern crate serde;

use std::error::Error as StdError;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use rusoto_core::{
    credential::{ChainProvider, StaticProvider},
    ByteStream, HttpClient, Region, RusotoError,
};
use rusoto_s3::{
    GetObjectError, GetObjectRequest, HeadObjectRequest, ListObjectsV2Request, PutObjectRequest,
    S3Client, S3,
};
use serde::Deserialize;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, warn};

use super::{
    object_store::{ListPage, ListRequest, ObjectStoreClient, ObjectSummary},
    Metadata,
};
use crate::{
    config::{StoreConfig, StoreKind},
    err::{Error, Result},
};

#[derive(Debug, Clone, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct S3Error {
    #[serde(rename = "Code", default)]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Resource", default)]
    resource: Option<String>,
}

impl S3Error {
    pub fn new(code: &str, message: &str) -> S3Error {
        S3Error {
            code: code.to_owned(),
            message: message.to_owned(),
            resource: None,
        }
    }

    /// Sets the key the error refers to, unless the store already named one
    pub fn with_resource(mut self, resource: &str) -> S3Error {
        if self.resource.is_none() {
            self.resource = Some(resource.to_owned());
        }
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn resource(&self) -> Option<&str> {
        self.resource.as_deref()
    }

    /// Parses the XML error document S3 sends with failed requests
    fn from_response(status: u16, body: &str) -> S3Error {
        quick_xml::de::from_str(body).unwrap_or_else(|_| S3Error {
            code: format!("HTTP {}", status),
            message: if body.is_empty() {
                String::from("Request failed without an error body")
            } else {
                body.to_owned()
            },
            resource: None,
        })
    }
}

/// Resolves the region (and endpoint) requests are signed for and sent to
pub fn resolve_region(config: &StoreConfig) -> Result<Region> {
    let name = config.region.as_deref().unwrap_or("us-east-1");
    if config.use_accelerate_endpoint {
        // rusoto addresses buckets path-style, which the accelerate endpoint rejects
        warn!("transfer acceleration is not supported by this client, using the regular endpoint");
    }
    match (config.kind, &config.endpoint_url) {
        (_, Some(endpoint)) => Ok(Region::Custom {
            name: name.to_owned(),
            endpoint: endpoint.to_owned(),
        }),
        (StoreKind::Ibm, None) => Err(Error::InvalidArgument(String::from(
            "IBM Cloud Object Storage needs an endpoint_url",
        ))),
        (StoreKind::Aws, None) => name
            .parse::<Region>()
            .map_err(|e| Error::InvalidArgument(format!("{}: {}", name, e))),
    }
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    let value = value?;
    DateTime::parse_from_rfc3339(&value)
        .or_else(|_| DateTime::parse_from_rfc2822(&value))
        .map(|t| t.with_timezone(&Utc))
        .ok()
}

/// Blocking S3 client. Every request runs to completion on a private
/// current-thread runtime before the call returns.
pub struct S3Provider {
    s3_client: S3Client,
    runtime: Runtime,
}

impl S3Provider {
    fn handle_error(err: RusotoError<impl StdError>) -> S3Error {
        match err {
            RusotoError::Unknown(buf) => {
                S3Error::from_response(buf.status.as_u16(), buf.body_as_str())
            }
            RusotoError::Service(err) => S3Error::new("Service Error", &err.to_string()),
            RusotoError::HttpDispatch(err) => S3Error::new("Request Error", &err.to_string()),
            RusotoError::Credentials(err) => S3Error::new("Credentials Error", &err.to_string()),
            RusotoError::Validation(msg) => S3Error::new("Validation Error", &msg),
            RusotoError::ParseError(msg) => S3Error::new("ParsingError", &msg),
            _ => S3Error::new("Unknown Error", "Unknown error occured"),
        }
    }

    /// Maps a failed request on `key` to an Error. HEAD responses carry no
    /// body, so a bare 404 is the only sign of a missing key there.
    fn key_error(err: RusotoError<impl StdError>, key: &str) -> Error {
        if let RusotoError::Unknown(buf) = &err {
            if buf.status.as_u16() == 404 && buf.body.is_empty() {
                return Error::NotFound(key.to_owned());
            }
        }
        Error::from(Self::handle_error(err).with_resource(key))
    }

    fn client_error(err: impl StdError) -> Error {
        Error::Store(S3Error::new("Client Error", &err.to_string()))
    }

    pub fn new(config: &StoreConfig) -> Result<S3Provider> {
        let region = resolve_region(config)?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(Self::client_error)?;
        let s3_client = {
            let _guard = runtime.enter();
            let dispatcher = HttpClient::new().map_err(Self::client_error)?;
            match config.credentials() {
                Some((key, secret)) => S3Client::new_with(
                    dispatcher,
                    StaticProvider::new_minimal(key.to_owned(), secret.to_owned()),
                    region,
                ),
                None => S3Client::new_with(dispatcher, ChainProvider::new(), region),
            }
        };
        Ok(S3Provider { s3_client, runtime })
    }

    async fn download_object(&self, request: GetObjectRequest) -> Result<Bytes> {
        let key = request.key.clone();
        let output = self.s3_client.get_object(request).await.map_err(|e| match e {
            RusotoError::Service(GetObjectError::NoSuchKey(_)) => Error::NotFound(key.clone()),
            e => Self::key_error(e, &key),
        })?;
        let body = match output.body {
            Some(body) => body,
            None => return Ok(Bytes::new()),
        };
        let content: Vec<u8> = body
            .map_ok(|chunk| chunk.to_vec())
            .try_concat()
            .await
            .map_err(|e| Error::from_io(e, &key))?;
        Ok(Bytes::from(content))
    }
}

impl ObjectStoreClient for S3Provider {
    fn list_objects(&self, bucket: &str, request: ListRequest<'_>) -> Result<ListPage> {
        let mut list_request = ListObjectsV2Request::default();
        list_request.bucket = bucket.to_owned();
        list_request.prefix = Some(request.prefix.to_owned()).filter(|p| !p.is_empty());
        list_request.delimiter = request.delimiter.map(str::to_owned);
        list_request.continuation_token = request.continuation_token.map(str::to_owned);
        list_request.max_keys = request.max_keys.map(|n| n as i64);

        let output = self
            .runtime
            .block_on(self.s3_client.list_objects_v2(list_request))
            .map_err(|e| Error::from(Self::handle_error(e).with_resource(request.prefix)))?;

        let objects = output
            .contents
            .unwrap_or_default()
            .into_iter()
            .filter_map(|object| {
                Some(ObjectSummary {
                    key: object.key?,
                    metadata: Metadata {
                        size: object.size.map(|s| s as u64),
                        last_modified: parse_timestamp(object.last_modified),
                        storage_class: object.storage_class,
                    },
                })
            })
            .collect();
        let common_prefixes = output
            .common_prefixes
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.prefix)
            .collect();
        let next_continuation_token = match output.is_truncated {
            Some(true) => output.next_continuation_token,
            _ => None,
        };
        Ok(ListPage {
            objects,
            common_prefixes,
            next_continuation_token,
        })
    }

    fn head_object(&self, bucket: &str, key: &str) -> Result<ObjectSummary> {
        let mut request = HeadObjectRequest::default();
        request.bucket = bucket.to_owned();
        request.key = key.to_owned();
        let output = self
            .runtime
            .block_on(self.s3_client.head_object(request))
            .map_err(|e| Self::key_error(e, key))?;
        Ok(ObjectSummary {
            key: key.to_owned(),
            metadata: Metadata {
                size: output.content_length.map(|s| s as u64),
                last_modified: parse_timestamp(output.last_modified),
                storage_class: output.storage_class,
            },
        })
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let mut request = GetObjectRequest::default();
        request.bucket = bucket.to_owned();
        request.key = key.to_owned();
        let content = self.runtime.block_on(self.download_object(request))?;
        debug!(bucket, key, bytes = content.len(), "downloaded object");
        Ok(content)
    }

    fn put_object(&self, bucket: &str, key: &str, content: Bytes) -> Result<()> {
        let mut request = PutObjectRequest::default();
        request.bucket = bucket.to_owned();
        request.key = key.to_owned();
        request.content_length = Some(content.len() as i64);
        request.body = Some(ByteStream::from(content.to_vec()));

        self.runtime
            .block_on(self.s3_client.put_object(request))
            .map_err(|e| Self::key_error(e, key))?;
        debug!(bucket, key, bytes = content.len(), "uploaded object");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusoto_s3::ListObjectsV2Error;

    use super::*;

    #[test]
    fn parses_xml_error_body() {
        let body = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
            <Error><Code>NoSuchBucket</Code>\
            <Message>The specified bucket does not exist</Message>\
            <Resource>/test-bucket</Resource>\
            <RequestId>4442587FB7D0A2F9</RequestId></Error>";
        let err = S3Error::from_response(404, body);
        assert_eq!(err.code(), "NoSuchBucket");
        assert_eq!(err.message(), "The specified bucket does not exist");
        assert_eq!(err.resource(), Some("/test-bucket"));
    }

    #[test]
    fn unparsable_body_falls_back_to_status() {
        let err = S3Error::from_response(503, "");
        assert_eq!(err.code(), "HTTP 503");
    }

    #[test]
    fn validation_errors_keep_their_message() {
        let err = S3Provider::handle_error(RusotoError::<ListObjectsV2Error>::Validation(
            String::from("bucket name must not be empty"),
        ));
        assert_eq!(err.code(), "Validation Error");
        assert_eq!(err.message(), "bucket name must not be empty");
    }

    #[test]
    fn aws_region_defaults_to_us_east_1() {
        let region = resolve_region(&StoreConfig::default()).unwrap();
        assert_eq!(region, Region::UsEast1);

        let config = StoreConfig {
            region: Some(String::from("eu-central-1")),
            ..Default::default()
        };
        assert_eq!(resolve_region(&config).unwrap(), Region::EuCentral1);
    }

    #[test]
    fn endpoint_url_selects_custom_region() {
        let config = StoreConfig {
            kind: StoreKind::Ibm,
            region: Some(String::from("eu-de")),
            endpoint_url: Some(String::from("https://s3.eu-de.example.cloud")),
            ..Default::default()
        };
        assert_eq!(
            resolve_region(&config).unwrap(),
            Region::Custom {
                name: String::from("eu-de"),
                endpoint: String::from("https://s3.eu-de.example.cloud"),
            }
        );
    }

    #[test]
    fn ibm_without_endpoint_is_rejected() {
        let config = StoreConfig {
            kind: StoreKind::Ibm,
            ..Default::default()
        };
        assert!(matches!(
            resolve_region(&config),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn unknown_aws_region_is_rejected() {
        let config = StoreConfig {
            region: Some(String::from("mars-north-1")),
            ..Default::default()
        };
        assert!(matches!(
            resolve_region(&config),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn timestamps_accept_both_s3_formats() {
        let listed = parse_timestamp(Some(String::from("2021-04-25T16:12:37.000Z"))).unwrap();
        let headed = parse_timestamp(Some(String::from("Sun, 25 Apr 2021 16:12:37 GMT"))).unwrap();
        assert_eq!(listed, headed);
        assert!(parse_timestamp(Some(String::from("yesterday"))).is_none());
        assert!(parse_timestamp(None).is_none());
    }
}
