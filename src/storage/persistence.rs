//! File helpers shared by the code store.
//!
//! Every write goes through `atomic_write` so that editors and other
//! processes watching the files never observe a half-written state.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::error::{StorageError, StorageResult};

/// Path of the temporary sibling used by `atomic_write`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `<path>.tmp`, then rename it over `path`.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> StorageResult<()> {
    let temp_path = temp_path_for(path);

    fs::write(&temp_path, bytes).map_err(|source| StorageError::FileWrite {
        path: temp_path.clone(),
        source,
    })?;

    fs::rename(&temp_path, path).map_err(|source| {
        let _ = fs::remove_file(&temp_path);
        StorageError::FileWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}

/// Create `dir` (and parents) readable only by the owner.
pub fn ensure_private_dir(dir: &Path) -> StorageResult<()> {
    let create_err = |source| StorageError::CreateDir {
        path: dir.to_path_buf(),
        source,
    };

    if !dir.exists() {
        fs::create_dir_all(dir).map_err(create_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(dir, fs::Permissions::from_mode(0o700)).map_err(create_err)?;
        }
    }

    Ok(())
}

/// Read a UTF-8 text file. A missing file is `Ok(None)`.
///
/// Bytes that are not valid UTF-8 are reported as a read error, so callers
/// never rewrite a file they could not decode.
pub fn read_text(path: &Path) -> StorageResult<Option<String>> {
    let read_err = |source| StorageError::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(read_err(e)),
    };

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| read_err(io::Error::new(io::ErrorKind::InvalidData, e)))
}
