use std::path::Path;

use tracing::info;

use docvqa_core::error::{DocvqaError, Result};

use crate::dataset::list_supported;

/// Copy up to `limit` supported documents from `source` into `destination`,
/// in file-name order. Returns the number of files copied.
pub fn prepare_dataset(source: &Path, destination: &Path, limit: usize) -> Result<usize> {
    if !source.exists() {
        return Err(DocvqaError::NotFound(format!(
            "Source path does not exist: {}",
            source.display()
        )));
    }

    std::fs::create_dir_all(destination)?;

    let mut copied = 0;
    for document in list_supported(source)?.into_iter().take(limit) {
        let Some(name) = document.file_name() else {
            continue;
        };
        std::fs::copy(&document, destination.join(name))?;
        copied += 1;
    }

    info!(copied, destination = %destination.display(), "Dataset slice prepared");
    Ok(copied)
}
