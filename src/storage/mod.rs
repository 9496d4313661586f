//! On-disk code queue: the codes file, the optional cursor index, and the
//! serialized store that owns both.

pub mod code_store;
pub mod codes;
pub mod error;
pub mod metadata;
pub mod persistence;

pub use code_store::{CodeStore, ConsumeMode, StorePaths, StoreSnapshot};
pub use codes::{parse_codes, validate_code};
pub use error::{INVALID_CODE_MESSAGE, StorageError, StorageResult};
pub use metadata::{IndexFile, compute_checksum};
pub use persistence::{atomic_write, ensure_private_dir};
