//! Whole-file load and save of a `RecordStore`.
//!
//! Load reads the file fully and decodes it line by line; a missing file is
//! a fresh start, not an error. Save rewrites the file in one shot.

use crate::core::codec::{DecodeOptions, Diagnostic, Encoding};
use crate::core::error::GradebookError;
use crate::core::store::RecordStore;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Builds a fresh store from `path`.
pub fn load_store(
    path: &Path,
    encoding: Encoding,
    opts: DecodeOptions,
) -> Result<(RecordStore, Vec<Diagnostic>), GradebookError> {
    let mut store = RecordStore::new();
    let diagnostics = load_into(&mut store, path, encoding, opts)?;
    Ok((store, diagnostics))
}

/// Replaces the contents of `store` with the file at `path` and moves its
/// id counter past the loaded ids. When the file is absent the store is
/// left as it was.
pub fn load_into(
    store: &mut RecordStore,
    path: &Path,
    encoding: Encoding,
    opts: DecodeOptions,
) -> Result<Vec<Diagnostic>, GradebookError> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(vec![Diagnostic::StartingFresh {
                path: path.display().to_string(),
            }]);
        }
        Err(e) => return Err(GradebookError::IoError(e)),
    };
    let text = String::from_utf8_lossy(&bytes);
    let decoded = encoding.deserialize(&text, opts);

    store.advance_id_counter_past(&decoded.records);
    store.replace_all(decoded.records)?;
    Ok(decoded.diagnostics)
}

pub fn save_store(store: &RecordStore, path: &Path, encoding: Encoding) -> Result<(), GradebookError> {
    let text = encoding.serialize(store.all())?;
    fs::write(path, text).map_err(GradebookError::IoError)
}
