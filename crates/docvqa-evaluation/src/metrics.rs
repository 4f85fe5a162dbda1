use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use docvqa_core::document::ExtractionResult;
use docvqa_core::error::DocvqaError;

/// Aggregate metrics for a single extractor provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMetrics {
    pub provider: String,
    pub documents: usize,
    pub avg_field_count: f64,
    pub avg_answer_count: f64,
    pub avg_table_count: f64,
    pub avg_summary_word_count: f64,
    /// Share of documents whose summary is missing or blank.
    pub empty_summary_rate: f64,
}

impl ProviderMetrics {
    fn empty(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            documents: 0,
            avg_field_count: 0.0,
            avg_answer_count: 0.0,
            avg_table_count: 0.0,
            avg_summary_word_count: 0.0,
            empty_summary_rate: 0.0,
        }
    }
}

/// Comparison across several labelled runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Sorted by provider name.
    pub providers: Vec<ProviderMetrics>,
    pub union_documents: usize,
    pub shared_documents: usize,
    pub provider_document_counts: BTreeMap<String, usize>,
}

/// A `provider=path` pair naming one run's JSONL results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSpec {
    pub provider: String,
    pub path: PathBuf,
}

impl FromStr for RunSpec {
    type Err = DocvqaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, path) = s.split_once('=').ok_or_else(|| {
            DocvqaError::Config(
                "Run definition must match provider=path/to/results.jsonl".to_string(),
            )
        })?;
        let provider = provider.trim();
        if provider.is_empty() {
            return Err(DocvqaError::Config(
                "Provider label cannot be empty".to_string(),
            ));
        }
        Ok(Self {
            provider: provider.to_string(),
            path: PathBuf::from(path.trim()),
        })
    }
}

fn list_len(content: &serde_json::Map<String, Value>, key: &str) -> usize {
    content
        .get(key)
        .and_then(Value::as_array)
        .map_or(0, Vec::len)
}

fn mean(total: usize, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

pub fn compute_provider_metrics(provider: &str, results: &[ExtractionResult]) -> ProviderMetrics {
    let documents = results.len();
    if documents == 0 {
        return ProviderMetrics::empty(provider);
    }

    let mut fields = 0;
    let mut answers = 0;
    let mut tables = 0;
    let mut summary_words = 0;
    let mut empty_summaries = 0;

    for result in results {
        let content = &result.content;
        fields += list_len(content, "fields");
        answers += list_len(content, "answers");
        tables += list_len(content, "tables");

        // Non-string summaries count as empty.
        let summary = content.get("summary").and_then(Value::as_str).unwrap_or("");
        summary_words += summary.split_whitespace().count();
        if summary.trim().is_empty() {
            empty_summaries += 1;
        }
    }

    ProviderMetrics {
        provider: provider.to_string(),
        documents,
        avg_field_count: mean(fields, documents),
        avg_answer_count: mean(answers, documents),
        avg_table_count: mean(tables, documents),
        avg_summary_word_count: mean(summary_words, documents),
        empty_summary_rate: mean(empty_summaries, documents),
    }
}

/// Compute per-provider metrics and document coverage across runs.
pub fn compare_runs(runs: &BTreeMap<String, Vec<ExtractionResult>>) -> EvaluationReport {
    let mut providers = Vec::with_capacity(runs.len());
    let mut document_sets: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

    for (provider, results) in runs {
        providers.push(compute_provider_metrics(provider, results));
        document_sets.insert(
            provider.as_str(),
            results.iter().map(|r| r.doc_id.as_str()).collect(),
        );
    }
    providers.sort_by(|a, b| a.provider.cmp(&b.provider));

    let union_documents = document_sets
        .values()
        .flat_map(|ids| ids.iter().copied())
        .collect::<BTreeSet<_>>()
        .len();

    let shared_documents = document_sets
        .values()
        .map(|ids| ids.iter().copied().collect::<BTreeSet<_>>())
        .reduce(|acc, ids| acc.intersection(&ids).copied().collect())
        .map_or(0, |shared| shared.len());

    let provider_document_counts = document_sets
        .iter()
        .map(|(provider, ids)| (provider.to_string(), ids.len()))
        .collect();

    EvaluationReport {
        providers,
        union_documents,
        shared_documents,
        provider_document_counts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(doc_id: &str, content: Value) -> ExtractionResult {
        match content {
            Value::Object(map) => ExtractionResult::new(doc_id, map),
            _ => panic!("content must be an object"),
        }
    }

    fn sample() -> Vec<ExtractionResult> {
        vec![
            result(
                "doc-1",
                json!({
                    "summary": "Invoice total is 123",
                    "fields": [{"name": "total", "value": "123"}],
                    "answers": ["123"],
                    "tables": []
                }),
            ),
            result(
                "doc-2",
                json!({"summary": "", "fields": [], "answers": [], "tables": [{"rows": []}]}),
            ),
        ]
    }

    #[test]
    fn test_provider_metrics() {
        let metrics = compute_provider_metrics("provider-a", &sample());
        assert_eq!(metrics.documents, 2);
        assert!((metrics.avg_field_count - 0.5).abs() < 1e-9);
        assert!((metrics.avg_answer_count - 0.5).abs() < 1e-9);
        assert!((metrics.avg_table_count - 0.5).abs() < 1e-9);
        assert!((metrics.avg_summary_word_count - 2.0).abs() < 1e-9);
        assert!((metrics.empty_summary_rate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_whitespace_and_missing_summaries_are_empty() {
        let results = vec![
            result("doc-1", json!({"summary": "   \n\t"})),
            result("doc-2", json!({})),
            result("doc-3", json!({"summary": "present"})),
            result("doc-4", json!({"summary": 42})),
        ];
        let metrics = compute_provider_metrics("p", &results);
        assert!((metrics.empty_summary_rate - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_no_results_is_all_zero() {
        assert_eq!(compute_provider_metrics("p", &[]), ProviderMetrics::empty("p"));
    }

    #[test]
    fn test_compare_runs_coverage() {
        let mut runs = BTreeMap::new();
        runs.insert("provider-b".to_string(), vec![result("doc-1", json!({"summary": "x"}))]);
        runs.insert("provider-a".to_string(), sample());

        let report = compare_runs(&runs);
        assert_eq!(report.union_documents, 2);
        assert_eq!(report.shared_documents, 1);
        assert_eq!(report.provider_document_counts["provider-a"], 2);
        assert_eq!(report.provider_document_counts["provider-b"], 1);
        let names: Vec<&str> = report.providers.iter().map(|p| p.provider.as_str()).collect();
        assert_eq!(names, vec!["provider-a", "provider-b"]);
    }

    #[test]
    fn test_compare_no_runs() {
        let report = compare_runs(&BTreeMap::new());
        assert_eq!(report.union_documents, 0);
        assert_eq!(report.shared_documents, 0);
        assert!(report.providers.is_empty());
    }

    #[test]
    fn test_run_spec_parsing() {
        let spec: RunSpec = "llm = artifacts/results/run-1.jsonl".parse().unwrap();
        assert_eq!(spec.provider, "llm");
        assert_eq!(spec.path, PathBuf::from("artifacts/results/run-1.jsonl"));

        let with_equals: RunSpec = "ai=dir/a=b.jsonl".parse().unwrap();
        assert_eq!(with_equals.path, PathBuf::from("dir/a=b.jsonl"));

        assert!("no-separator".parse::<RunSpec>().is_err());
        assert!(" =path.jsonl".parse::<RunSpec>().is_err());
    }
}
