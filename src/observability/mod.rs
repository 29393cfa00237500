pub(crate) mod tracing;

use anyhow::Result;
use uuid::Uuid;

/// Telemetry（トレーシング）を管理する構造体。
#[derive(Debug, Clone, Copy)]
pub struct Telemetry;

#[allow(clippy::unused_self)]
impl Telemetry {
    /// 新しいTelemetryインスタンスを作成し、トレーシングを初期化する。
    ///
    /// # Errors
    /// サブスクライバの初期化に失敗した場合はエラーを返す。
    pub fn new() -> Result<Self> {
        tracing::init()?;
        Ok(Self)
    }

    /// キュレーション実行の開始を記録する。
    pub fn record_run_started(&self, run_id: Uuid) {
        ::tracing::info!(%run_id, "curation run started");
    }

    /// キュレーション実行の完了を記録する。
    pub fn record_run_completed(&self, run_id: Uuid, accepted: usize, unmet_labels: usize) {
        ::tracing::info!(%run_id, accepted, unmet_labels, "curation run completed");
    }

    /// キュレーション実行の失敗を記録する。
    pub fn record_run_failed(&self, run_id: Uuid, error: &anyhow::Error) {
        ::tracing::error!(%run_id, error = ?error, "curation run failed");
    }
}
