use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::hash::ContentHash;
use super::key::ObjectKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Result of a completed write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub key: ObjectKey,
    pub size: u64,
    pub checksum: ContentHash,
}

/// Keyed object storage for uploaded files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`.
    async fn put(&self, key: &ObjectKey, data: &[u8]) -> Result<StoredObject, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(key, reader, data.len() as u64).await
    }

    /// Store data from an async reader under `key`, failing with
    /// `SizeLimitExceeded` once more than `limit` bytes have been read.
    /// A failed write leaves nothing behind.
    async fn put_stream(
        &self,
        key: &ObjectKey,
        reader: BoxReader,
        limit: u64,
    ) -> Result<StoredObject, StorageError>;

    /// Retrieve all bytes of an object.
    async fn get(&self, key: &ObjectKey) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(key).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve an object as a streaming async reader.
    async fn get_stream(&self, key: &ObjectKey) -> Result<BoxReader, StorageError>;

    async fn exists(&self, key: &ObjectKey) -> Result<bool, StorageError>;

    /// Delete an object.
    ///
    /// Returns `true` if the object was deleted, `false` if it did not exist.
    async fn delete(&self, key: &ObjectKey) -> Result<bool, StorageError>;

    /// Get the size of an object in bytes.
    async fn size(&self, key: &ObjectKey) -> Result<u64, StorageError>;
}
