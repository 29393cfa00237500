use std::sync::Arc;

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::{
    catalog::ValidationPolicy,
    clients::comment_hub::CommentHubConfig,
    clients::CommentHubClient,
    config::{Config, SourceKind},
    plan::CurationPlan,
    util::retry::RetryConfig,
};

pub(crate) mod load;
pub(crate) mod normalize;
pub mod report;
pub mod select;

use load::{CommentHubLoadStage, FileLoadStage, LoadStage};
use normalize::{CatalogNormalizeStage, NormalizeStage};
pub use normalize::InputDiagnostics;
use report::{FileReportStage, ReportArtifacts, ReportStage};
use select::{GreedyCoverageSelectStage, SelectStage};

/// 1 回のキュレーション実行を識別するコンテキスト。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunContext {
    pub run_id: Uuid,
}

impl RunContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) struct CurationOrchestrator {
    stages: CurationStages,
}

struct CurationStages {
    load: Arc<dyn LoadStage>,
    normalize: Arc<dyn NormalizeStage>,
    select: Arc<dyn SelectStage>,
    report: Arc<dyn ReportStage>,
}

pub(crate) struct CurationBuilder {
    load: Option<Arc<dyn LoadStage>>,
    normalize: Option<Arc<dyn NormalizeStage>>,
    select: Option<Arc<dyn SelectStage>>,
    report: Option<Arc<dyn ReportStage>>,
}

impl CurationOrchestrator {
    /// 設定とキュレーション計画から全ステージを組み立てる。
    ///
    /// # Errors
    /// 入力ソースの設定が不完全な場合、またはHTTPクライアントの構築に
    /// 失敗した場合はエラーを返します。
    pub(crate) fn new(config: &Config, plan: &CurationPlan) -> Result<Self> {
        let load_stage: Arc<dyn LoadStage> = match config.source() {
            SourceKind::File => {
                let catalog_path = config
                    .catalog_path()
                    .context("catalog path is required for the file source")?
                    .clone();
                let pool_path = config
                    .pool_path()
                    .context("pool path is required for the file source")?
                    .clone();
                Arc::new(FileLoadStage::new(catalog_path, pool_path))
            }
            SourceKind::Service => {
                let base_url = config
                    .comment_hub_base_url()
                    .context("comment-hub base URL is required for the service source")?
                    .to_string();
                let client = CommentHubClient::new(CommentHubConfig {
                    base_url,
                    connect_timeout: config.comment_hub_connect_timeout(),
                    total_timeout: config.comment_hub_total_timeout(),
                    service_token: config.comment_hub_service_token().map(ToString::to_string),
                    page_limit: config.comment_hub_page_limit().get(),
                })
                .context("failed to create comment-hub client")?;
                let retry_config = RetryConfig {
                    max_attempts: config.http_max_retries(),
                    base_delay_ms: config.http_backoff_base_ms(),
                    max_delay_ms: config.http_backoff_cap_ms(),
                };
                Arc::new(CommentHubLoadStage::new(Arc::new(client), retry_config))
            }
        };

        let policy = ValidationPolicy::from_strict(config.strict_validation());

        Ok(CurationBuilder::new()
            .with_load_stage(load_stage)
            .with_normalize_stage(Arc::new(CatalogNormalizeStage::new(plan, policy)))
            .with_select_stage(Arc::new(GreedyCoverageSelectStage::new(plan)))
            .with_report_stage(Arc::new(FileReportStage::new(config.report_dir().clone())))
            .build())
    }

    #[cfg(test)]
    pub(crate) fn builder() -> CurationBuilder {
        CurationBuilder::new()
    }

    pub(crate) async fn execute(&self, run: &RunContext) -> Result<ReportArtifacts> {
        tracing::debug!(run_id = %run.run_id, "curation pipeline started");

        let raw = self.stages.load.load(run).await?;
        let normalized = self.stages.normalize.normalize(run, raw).await?;
        let outcome = self.stages.select.select(run, normalized).await?;
        let artifacts = self.stages.report.report(run, outcome).await?;

        tracing::debug!(
            run_id = %run.run_id,
            accepted = artifacts.report.selections.len(),
            unmet_labels = artifacts.report.unmet.len(),
            "curation pipeline completed"
        );
        Ok(artifacts)
    }
}

impl CurationBuilder {
    pub(crate) fn new() -> Self {
        Self {
            load: None,
            normalize: None,
            select: None,
            report: None,
        }
    }

    pub(crate) fn with_load_stage(mut self, stage: Arc<dyn LoadStage>) -> Self {
        self.load = Some(stage);
        self
    }

    pub(crate) fn with_normalize_stage(mut self, stage: Arc<dyn NormalizeStage>) -> Self {
        self.normalize = Some(stage);
        self
    }

    pub(crate) fn with_select_stage(mut self, stage: Arc<dyn SelectStage>) -> Self {
        self.select = Some(stage);
        self
    }

    pub(crate) fn with_report_stage(mut self, stage: Arc<dyn ReportStage>) -> Self {
        self.report = Some(stage);
        self
    }

    pub(crate) fn build(self) -> CurationOrchestrator {
        let stages = CurationStages {
            load: self
                .load
                .unwrap_or_else(|| panic!("load stage must be configured before build")),
            normalize: self
                .normalize
                .unwrap_or_else(|| panic!("normalize stage must be configured before build")),
            select: self
                .select
                .unwrap_or_else(|| panic!("select stage must be configured before build")),
            report: self
                .report
                .unwrap_or_else(|| panic!("report stage must be configured before build")),
        };

        CurationOrchestrator { stages }
    }
}
