use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{
    config::Config,
    observability::Telemetry,
    pipeline::{report::ReportArtifacts, CurationOrchestrator, RunContext},
    plan::CurationPlan,
};

/// アプリケーションの共有コンポーネント。
pub struct ComponentRegistry {
    config: Arc<Config>,
    telemetry: Telemetry,
    plan: CurationPlan,
    pipeline: Arc<CurationOrchestrator>,
}

impl ComponentRegistry {
    /// 構成情報と依存をまとめて初期化し、アプリケーションの共有レジストリを構築する。
    ///
    /// # Errors
    /// Telemetry の初期化、キュレーション計画の読み込み、またはパイプライン
    /// の構築が失敗した場合はエラーを返す。
    pub fn build(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let telemetry = Telemetry::new()?;
        let plan = CurationPlan::load_from_path(config.plan_path())
            .context("failed to load curation plan")?;
        let pipeline = Arc::new(CurationOrchestrator::new(&config, &plan)?);

        Ok(Self {
            config,
            telemetry,
            plan,
            pipeline,
        })
    }

    #[must_use]
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    #[must_use]
    pub fn plan(&self) -> &CurationPlan {
        &self.plan
    }

    #[must_use]
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    /// 1 回のキュレーション実行を行い、レポートの所在を返す。
    ///
    /// # Errors
    /// いずれかのステージが失敗した場合はエラーを返す。
    pub async fn run_curation(&self, run: &RunContext) -> Result<ReportArtifacts> {
        self.telemetry.record_run_started(run.run_id);

        match self.pipeline.execute(run).await {
            Ok(artifacts) => {
                self.telemetry.record_run_completed(
                    run.run_id,
                    artifacts.report.selections.len(),
                    artifacts.report.unmet.len(),
                );
                Ok(artifacts)
            }
            Err(error) => {
                self.telemetry.record_run_failed(run.run_id, &error);
                Err(error)
            }
        }
    }
}
