use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use docvqa_core::document::{DocumentDescriptor, JsonMap};
use docvqa_core::error::{DocvqaError, Result};
use docvqa_core::source::{DocumentSource, DocumentStream};

pub const DEFAULT_MANIFEST: &str = "manifest.jsonl";

/// File extensions picked up when a dataset directory has no manifest.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["pdf", "png", "jpg", "jpeg", "tiff"];

#[derive(Debug, Deserialize)]
struct ManifestEntry {
    #[serde(default)]
    id: Option<String>,
    document_path: PathBuf,
    #[serde(default)]
    questions: Option<Vec<String>>,
    #[serde(default)]
    metadata: Option<JsonMap>,
}

/// A dataset rooted at a directory.
///
/// When `manifest.jsonl` exists it is read lazily in declaration order;
/// otherwise the supported files of the directory are yielded sorted by name.
#[derive(Debug, Clone)]
pub struct DatasetDirectory {
    root: PathBuf,
    limit: Option<usize>,
}

impl DatasetDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DocumentSource for DatasetDirectory {
    fn documents(&self) -> Result<DocumentStream> {
        if !self.root.exists() {
            return Err(DocvqaError::NotFound(format!(
                "Dataset path does not exist: {}",
                self.root.display()
            )));
        }

        let manifest_path = self.root.join(DEFAULT_MANIFEST);
        let stream: DocumentStream = if manifest_path.exists() {
            debug!(manifest = %manifest_path.display(), "Reading dataset manifest");
            let file = File::open(&manifest_path)?;
            Box::new(ManifestEntries {
                root: self.root.clone(),
                manifest_path,
                lines: BufReader::new(file).lines(),
                line_no: 0,
                exhausted: false,
            })
        } else {
            let files = list_supported(&self.root)?;
            debug!(root = %self.root.display(), files = files.len(), "Listing dataset directory");
            Box::new(
                files
                    .into_iter()
                    .map(|path| -> Result<DocumentDescriptor> {
                        Ok(DocumentDescriptor::new(file_stem(&path), path))
                    }),
            )
        };

        Ok(match self.limit {
            Some(limit) => Box::new(stream.take(limit)),
            None => stream,
        })
    }
}

struct ManifestEntries {
    root: PathBuf,
    manifest_path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_no: usize,
    exhausted: bool,
}

impl ManifestEntries {
    fn parse_entry(&self, line: &str) -> Result<DocumentDescriptor> {
        let entry: ManifestEntry = serde_json::from_str(line).map_err(|e| {
            DocvqaError::Dataset(format!(
                "{} line {}: {e}",
                self.manifest_path.display(),
                self.line_no
            ))
        })?;

        let document_path = self.root.join(&entry.document_path);
        let doc_id = entry
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| file_stem(&document_path));

        Ok(DocumentDescriptor {
            doc_id,
            document_path,
            questions: entry.questions,
            metadata: entry.metadata.unwrap_or_default(),
        })
    }
}

impl Iterator for ManifestEntries {
    type Item = Result<DocumentDescriptor>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    self.exhausted = true;
                    return Some(Err(e.into()));
                }
            };
            self.line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            return Some(self.parse_entry(&line));
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(crate) fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Supported files directly under `dir`, sorted by path.
pub(crate) fn list_supported(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_supported(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collect(source: &DatasetDirectory) -> Vec<Result<DocumentDescriptor>> {
        source.documents().unwrap().collect()
    }

    #[test]
    fn test_reads_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sample_document.txt"), "sample").unwrap();
        let entry = json!({
            "id": "doc-1",
            "document_path": "sample_document.txt",
            "questions": ["What is inside?"],
            "metadata": {"split": "test"},
        });
        std::fs::write(dir.path().join(DEFAULT_MANIFEST), format!("{entry}\n")).unwrap();

        let docs: Vec<_> = collect(&DatasetDirectory::new(dir.path()))
            .into_iter()
            .map(|d| d.unwrap())
            .collect();

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].doc_id, "doc-1");
        assert_eq!(docs[0].document_path, dir.path().join("sample_document.txt"));
        assert_eq!(docs[0].questions, Some(vec!["What is inside?".to_string()]));
        assert_eq!(docs[0].metadata["split"], json!("test"));
    }

    #[test]
    fn test_manifest_id_falls_back_to_stem() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = "\n{\"document_path\": \"scans/invoice_7.png\"}\n\n{\"id\": \"\", \"document_path\": \"b.pdf\"}\n";
        std::fs::write(dir.path().join(DEFAULT_MANIFEST), manifest).unwrap();

        let ids: Vec<String> = collect(&DatasetDirectory::new(dir.path()))
            .into_iter()
            .map(|d| d.unwrap().doc_id)
            .collect();

        assert_eq!(ids, vec!["invoice_7", "b"]);
    }

    #[test]
    fn test_malformed_manifest_line_is_yielded_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = "{\"id\": \"a\", \"document_path\": \"a.pdf\"}\nnot json\n{\"id\": \"c\", \"document_path\": \"c.pdf\"}\n";
        std::fs::write(dir.path().join(DEFAULT_MANIFEST), manifest).unwrap();

        let items = collect(&DatasetDirectory::new(dir.path()));
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(DocvqaError::Dataset(_))));
        assert_eq!(items[2].as_ref().unwrap().doc_id, "c");
    }

    #[test]
    fn test_directory_listing_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.PNG", "a.pdf", "notes.txt", "c.tiff"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let ids: Vec<String> = collect(&DatasetDirectory::new(dir.path()))
            .into_iter()
            .map(|d| d.unwrap().doc_id)
            .collect();

        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_limit_caps_documents() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["1.pdf", "2.pdf", "3.pdf"] {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        let source = DatasetDirectory::new(dir.path()).with_limit(Some(2));
        let ids: Vec<String> = collect(&source).into_iter().map(|d| d.unwrap().doc_id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = DatasetDirectory::new(dir.path().join("absent"));
        assert!(matches!(source.documents(), Err(DocvqaError::NotFound(_))));
    }
}
