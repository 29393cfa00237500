use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    catalog::{RawCandidateRecord, RawPoolRecord},
    clients::CommentHubClient,
    pipeline::RunContext,
    util::retry::{is_retryable_error, RetryConfig},
};

/// 取り込み直後の生レコード束。検証前の状態を保持する。
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RawBundle {
    pub(crate) run_id: Uuid,
    pub(crate) candidates: Vec<RawCandidateRecord>,
    pub(crate) pool: Vec<RawPoolRecord>,
}

#[async_trait]
pub(crate) trait LoadStage: Send + Sync {
    async fn load(&self, run: &RunContext) -> Result<RawBundle>;
}

/// ローカルJSONファイルから候補カタログと既存プールを読み込むステージ。
pub(crate) struct FileLoadStage {
    catalog_path: PathBuf,
    pool_path: PathBuf,
}

impl FileLoadStage {
    pub(crate) fn new(catalog_path: PathBuf, pool_path: PathBuf) -> Self {
        Self {
            catalog_path,
            pool_path,
        }
    }
}

/// JSONファイルをレコード配列として読み込む。
async fn read_records<T: DeserializeOwned>(path: &Path, what: &str) -> Result<Vec<T>> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read {what} file: {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {what} file: {}", path.display()))
}

#[async_trait]
impl LoadStage for FileLoadStage {
    async fn load(&self, run: &RunContext) -> Result<RawBundle> {
        info!(
            run_id = %run.run_id,
            catalog = %self.catalog_path.display(),
            pool = %self.pool_path.display(),
            "loading catalog and pool from files"
        );

        let candidates: Vec<RawCandidateRecord> =
            read_records(&self.catalog_path, "candidate catalog").await?;
        let pool: Vec<RawPoolRecord> = read_records(&self.pool_path, "pool").await?;

        info!(
            run_id = %run.run_id,
            candidates = candidates.len(),
            pool_entries = pool.len(),
            "loaded catalog and pool from files"
        );

        Ok(RawBundle {
            run_id: run.run_id,
            candidates,
            pool,
        })
    }
}

/// comment-hubから候補カタログと既存プールを取得するステージ。
pub(crate) struct CommentHubLoadStage {
    client: Arc<CommentHubClient>,
    retry_config: RetryConfig,
}

impl CommentHubLoadStage {
    pub(crate) fn new(client: Arc<CommentHubClient>, retry_config: RetryConfig) -> Self {
        Self {
            client,
            retry_config,
        }
    }

    /// 再試行付きで comment-hub への呼び出しを実行する。
    async fn fetch_with_retry<T, F, Fut>(&self, what: &str, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(output) => {
                    if attempt > 0 {
                        info!(what, attempt, "fetch succeeded after retry");
                    }
                    return Ok(output);
                }
                Err(err) => {
                    attempt += 1;

                    if !self.retry_config.can_retry(attempt) {
                        warn!(
                            what,
                            attempt,
                            max_attempts = self.retry_config.max_attempts,
                            "fetch failed after all retries"
                        );
                        return Err(err);
                    }

                    // reqwest::Errorでない場合は再試行不可
                    let is_retryable = err
                        .downcast_ref::<reqwest::Error>()
                        .is_some_and(is_retryable_error);

                    if !is_retryable {
                        warn!(what, ?err, "error is not retryable");
                        return Err(err);
                    }

                    let delay = self.retry_config.delay_for_attempt(attempt);
                    warn!(
                        what,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "fetch failed, retrying after delay"
                    );

                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl LoadStage for CommentHubLoadStage {
    async fn load(&self, run: &RunContext) -> Result<RawBundle> {
        info!(run_id = %run.run_id, "loading catalog and pool from comment-hub");

        // 到達不能なら取得前に打ち切る
        self.fetch_with_retry("health", || self.client.ping())
            .await
            .context("comment-hub is not reachable")?;

        let candidates = self
            .fetch_with_retry("candidates", || self.client.fetch_candidates())
            .await
            .context("failed to fetch candidate catalog from comment-hub")?;

        let pool = self
            .fetch_with_retry("pool", || self.client.fetch_pool())
            .await
            .context("failed to fetch pool from comment-hub")?;

        info!(
            run_id = %run.run_id,
            candidates = candidates.len(),
            pool_entries = pool.len(),
            "loaded catalog and pool from comment-hub"
        );

        Ok(RawBundle {
            run_id: run.run_id,
            candidates,
            pool,
        })
    }
}
