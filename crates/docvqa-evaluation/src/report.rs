use std::fmt::Write;

use crate::metrics::EvaluationReport;

/// Plain-text rendering printed by `docvqa evaluate`.
pub fn render_report(report: &EvaluationReport) -> String {
    let mut out = String::from("Provider Metrics:\n");
    for m in &report.providers {
        let _ = writeln!(
            out,
            "- {}: docs={}, avg_fields={:.2}, avg_answers={:.2}, avg_tables={:.2}, \
             avg_summary_words={:.2}, empty_summary_rate={:.2}%",
            m.provider,
            m.documents,
            m.avg_field_count,
            m.avg_answer_count,
            m.avg_table_count,
            m.avg_summary_word_count,
            m.empty_summary_rate * 100.0,
        );
    }

    let _ = writeln!(
        out,
        "\nDocument Coverage: union={} shared={}",
        report.union_documents, report.shared_documents
    );
    for (provider, count) in &report.provider_document_counts {
        let _ = writeln!(out, "  - {provider}: {count}");
    }
    out
}
