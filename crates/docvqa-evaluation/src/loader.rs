use std::io::{BufRead, BufReader};
use std::path::Path;

use docvqa_core::document::ExtractionResult;
use docvqa_core::error::{DocvqaError, Result};

/// Load the JSONL artifact written by the local result store.
pub fn load_results(path: &Path) -> Result<Vec<ExtractionResult>> {
    if !path.exists() {
        return Err(DocvqaError::NotFound(format!(
            "Results file not found: {}",
            path.display()
        )));
    }

    let reader = BufReader::new(std::fs::File::open(path)?);
    let mut results = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let result: ExtractionResult = serde_json::from_str(&line).map_err(|e| {
            DocvqaError::Evaluation(format!("{} line {}: {e}", path.display(), index + 1))
        })?;
        results.push(result);
    }

    tracing::debug!(path = %path.display(), count = results.len(), "Loaded results");
    Ok(results)
}
