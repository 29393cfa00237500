use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::pipeline::{
    normalize::InputDiagnostics,
    select::{SelectionNotes, SelectionOutcome},
    RunContext,
};

pub mod markdown;

/// 被覆表の 1 行。目標外ラベルは `target` が `None` になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoverageRow {
    pub label: String,
    pub target: Option<usize>,
    pub before: usize,
    pub after: usize,
    pub remaining: usize,
}

/// 受理候補の 1 行。提示順は `rank` の昇順。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionRow {
    pub rank: usize,
    pub text: String,
    pub labels: Vec<String>,
    pub credited: Vec<String>,
    pub usage_count: u64,
    pub score: f64,
}

/// gap が残ったラベルの 1 行。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnmetRow {
    pub label: String,
    pub remaining: usize,
}

/// 1 回の実行の全報告内容。JSON と Markdown の両方がこの値から描画される。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurationReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub coverage: Vec<CoverageRow>,
    pub selections: Vec<SelectionRow>,
    pub unmet: Vec<UnmetRow>,
    pub notes: SelectionNotes,
    pub diagnostics: InputDiagnostics,
}

/// 選定結果から報告内容を組み立てる。選定結果は変更しない。
#[must_use]
pub fn build_report(outcome: &SelectionOutcome, generated_at: DateTime<Utc>) -> CurationReport {
    // after 側のラベル集合は before 側を必ず含むので、after から列挙する
    let coverage = outcome
        .coverage_after
        .labels()
        .map(|(label, after)| CoverageRow {
            label: label.to_string(),
            target: after.target,
            before: outcome.coverage_before.current(label),
            after: after.current,
            remaining: after.gap(),
        })
        .collect();

    let selections = outcome
        .accepted
        .iter()
        .map(|accepted| SelectionRow {
            rank: accepted.rank,
            text: accepted.candidate.text.clone(),
            labels: accepted.candidate.labels.clone(),
            credited: accepted.credited.clone(),
            usage_count: accepted.candidate.usage_count,
            score: accepted.candidate.score,
        })
        .collect();

    let unmet = outcome
        .coverage_after
        .open_gaps()
        .map(|(label, remaining)| UnmetRow {
            label: label.to_string(),
            remaining,
        })
        .collect();

    CurationReport {
        run_id: outcome.run_id,
        generated_at,
        coverage,
        selections,
        unmet,
        notes: outcome.notes,
        diagnostics: outcome.diagnostics,
    }
}

/// 書き出されたレポートの所在と内容。
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub report: CurationReport,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}

#[async_trait]
pub(crate) trait ReportStage: Send + Sync {
    async fn report(&self, run: &RunContext, outcome: SelectionOutcome)
        -> Result<ReportArtifacts>;
}

/// レポートを JSON と Markdown の 2 形式でファイルに書き出すステージ。
pub(crate) struct FileReportStage {
    report_dir: PathBuf,
}

impl FileReportStage {
    pub(crate) fn new(report_dir: PathBuf) -> Self {
        Self { report_dir }
    }
}

#[async_trait]
impl ReportStage for FileReportStage {
    async fn report(
        &self,
        run: &RunContext,
        outcome: SelectionOutcome,
    ) -> Result<ReportArtifacts> {
        let report = build_report(&outcome, Utc::now());

        tokio::fs::create_dir_all(&self.report_dir)
            .await
            .with_context(|| {
                format!(
                    "failed to create report directory: {}",
                    self.report_dir.display()
                )
            })?;

        let json_path = self.report_dir.join("curation_report.json");
        let json_contents =
            serde_json::to_string_pretty(&report).context("failed to serialize report as JSON")?;
        tokio::fs::write(&json_path, json_contents)
            .await
            .with_context(|| format!("failed to write report file: {}", json_path.display()))?;

        let markdown_path = self.report_dir.join("curation_report.md");
        tokio::fs::write(&markdown_path, markdown::render(&report))
            .await
            .with_context(|| {
                format!("failed to write report file: {}", markdown_path.display())
            })?;

        info!(
            run_id = %run.run_id,
            json = %json_path.display(),
            markdown = %markdown_path.display(),
            "wrote curation report"
        );

        Ok(ReportArtifacts {
            report,
            json_path,
            markdown_path,
        })
    }
}
