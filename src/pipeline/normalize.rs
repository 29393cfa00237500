use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    catalog::{load_candidates, load_pool, LoadedCatalog, LoadedPool, ValidationPolicy},
    pipeline::{load::RawBundle, RunContext},
    plan::CurationPlan,
};

/// 入力検証の集計。レポートの診断セクションにそのまま載る。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct InputDiagnostics {
    /// 取り込んだ候補レコード数（検証前）
    pub catalog_records: usize,
    /// 検証で除外された候補数
    pub catalog_skipped: usize,
    /// 未知ラベル警告の件数
    pub unknown_label_warnings: usize,
    /// 既存プールのエントリ数
    pub pool_entries: usize,
}

/// 検証・正規化済みの入力束。
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NormalizedBundle {
    pub(crate) run_id: Uuid,
    pub(crate) catalog: LoadedCatalog,
    pub(crate) pool: LoadedPool,
    pub(crate) diagnostics: InputDiagnostics,
}

#[async_trait]
pub(crate) trait NormalizeStage: Send + Sync {
    async fn normalize(&self, run: &RunContext, bundle: RawBundle) -> Result<NormalizedBundle>;
}

/// 生レコードを検証し、候補カタログと既存プールを正規化するステージ。
pub(crate) struct CatalogNormalizeStage {
    known_labels: Vec<String>,
    policy: ValidationPolicy,
}

impl CatalogNormalizeStage {
    pub(crate) fn new(plan: &CurationPlan, policy: ValidationPolicy) -> Self {
        Self {
            known_labels: plan.known_labels.clone(),
            policy,
        }
    }
}

#[async_trait]
impl NormalizeStage for CatalogNormalizeStage {
    async fn normalize(&self, run: &RunContext, bundle: RawBundle) -> Result<NormalizedBundle> {
        let catalog_records = bundle.candidates.len();

        let catalog = load_candidates(bundle.candidates, &self.known_labels, self.policy)
            .context("candidate catalog failed validation")?;
        let pool = load_pool(bundle.pool);

        let diagnostics = InputDiagnostics {
            catalog_records,
            catalog_skipped: catalog.skipped.len(),
            unknown_label_warnings: catalog.warnings.len(),
            pool_entries: pool.entries.len(),
        };

        if diagnostics.catalog_skipped > 0 {
            warn!(
                run_id = %run.run_id,
                skipped = diagnostics.catalog_skipped,
                "candidates were excluded during validation"
            );
        }

        info!(
            run_id = %run.run_id,
            candidates = catalog.candidates.len(),
            skipped = diagnostics.catalog_skipped,
            unknown_labels = diagnostics.unknown_label_warnings,
            pool_entries = diagnostics.pool_entries,
            "normalized catalog and pool"
        );

        Ok(NormalizedBundle {
            run_id: bundle.run_id,
            catalog,
            pool,
            diagnostics,
        })
    }
}
