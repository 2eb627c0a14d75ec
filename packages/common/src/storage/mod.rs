mod error;
mod hash;
mod key;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use hash::ContentHash;
pub use key::ObjectKey;
pub use traits::{BoxReader, ObjectStore, StoredObject};
