//! Blob store credentials

use std::fmt;
use std::str::FromStr;

use crate::error::{ArchiveError, Result};

/// Object storage credentials given as a single `key/secret/bucket` string
///
/// The key is the first segment and the bucket the last; everything in
/// between is the secret, which may itself contain `/`.
#[derive(Clone, PartialEq, Eq)]
pub struct BucketCredentials {
    pub key: String,
    pub secret: String,
    pub bucket: String,
}

impl BucketCredentials {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = || {
            ArchiveError::validation("Bucket credentials must have the form key/secret/bucket")
        };

        let (key, rest) = raw.split_once('/').ok_or_else(invalid)?;
        let (secret, bucket) = rest.rsplit_once('/').ok_or_else(invalid)?;
        if key.is_empty() || secret.is_empty() || bucket.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            key: key.to_string(),
            secret: secret.to_string(),
            bucket: bucket.to_string(),
        })
    }
}

impl FromStr for BucketCredentials {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for BucketCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BucketCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .field("bucket", &self.bucket)
            .finish()
    }
}
