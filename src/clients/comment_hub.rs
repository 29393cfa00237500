/// comment-hubからの候補カタログ／既存プール取得クライアント。
///
/// ページング、タイムアウト、サービストークン認証をサポートします。
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    catalog::{RawCandidateRecord, RawPoolRecord},
    schema::{
        comment_hub::{CANDIDATES_PAGE_SCHEMA, POOL_PAGE_SCHEMA},
        validate_json,
    },
};

/// comment-hubのページング付き応答。
#[derive(Debug, Deserialize)]
struct PageResponse<T> {
    data: Vec<T>,
    next_cursor: Option<String>,
}

/// comment-hubクライアントの設定。
#[derive(Debug, Clone)]
pub(crate) struct CommentHubConfig {
    pub(crate) base_url: String,
    pub(crate) connect_timeout: Duration,
    pub(crate) total_timeout: Duration,
    pub(crate) service_token: Option<String>,
    pub(crate) page_limit: usize,
}

/// comment-hubとの通信を管理するクライアント。
#[derive(Debug, Clone)]
pub(crate) struct CommentHubClient {
    client: Client,
    base_url: Url,
    service_token: Option<String>,
    page_limit: usize,
}

impl CommentHubClient {
    /// 新しいcomment-hubクライアントを作成する。
    ///
    /// # Errors
    /// URLのパースまたはHTTPクライアントの構築に失敗した場合はエラーを返します。
    pub(crate) fn new(config: CommentHubConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.total_timeout)
            .build()
            .context("failed to build comment-hub HTTP client")?;

        let base_url = Url::parse(&config.base_url).context("invalid comment-hub base URL")?;

        Ok(Self {
            client,
            base_url,
            service_token: config.service_token,
            page_limit: config.page_limit,
        })
    }

    /// 候補カタログを全件取得する。ページングは自動で辿る。
    ///
    /// # Errors
    /// HTTPリクエスト、スキーマ検証、またはパースに失敗した場合はエラーを返します。
    pub(crate) async fn fetch_candidates(&self) -> Result<Vec<RawCandidateRecord>> {
        self.fetch_all("v1/comments/candidates", &CANDIDATES_PAGE_SCHEMA)
            .await
    }

    /// 既存プールを全件取得する。ページングは自動で辿る。
    ///
    /// # Errors
    /// HTTPリクエスト、スキーマ検証、またはパースに失敗した場合はエラーを返します。
    pub(crate) async fn fetch_pool(&self) -> Result<Vec<RawPoolRecord>> {
        self.fetch_all("v1/comments/pool", &POOL_PAGE_SCHEMA).await
    }

    /// ヘルスチェックエンドポイントを呼び出す。
    ///
    /// # Errors
    /// リクエストが失敗した場合、またはサーバーがエラー状態を返した場合はエラーを返します。
    pub(crate) async fn ping(&self) -> Result<()> {
        let url = self
            .base_url
            .join("v1/health")
            .context("failed to build health URL")?;

        let mut request = self.client.get(url);
        if let Some(token) = &self.service_token {
            request = request.header("X-Service-Token", token);
        }

        request
            .send()
            .await
            .context("comment-hub health request failed")?
            .error_for_status()
            .context("comment-hub health endpoint returned error status")?;

        Ok(())
    }

    async fn fetch_all<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        schema: &Value,
    ) -> Result<Vec<T>> {
        let mut all_records = Vec::new();
        let mut cursor: Option<String> = None;
        let mut page_count = 0;

        loop {
            page_count += 1;
            debug!(endpoint, page = page_count, cursor = ?cursor, "fetching comment-hub page");

            let page = self.fetch_page::<T>(endpoint, schema, cursor.as_deref()).await?;
            let records_count = page.data.len();

            all_records.extend(page.data);

            debug!(
                endpoint,
                page = page_count,
                records = records_count,
                total = all_records.len(),
                "fetched comment-hub page"
            );

            if page.next_cursor.is_none() {
                break;
            }

            cursor = page.next_cursor;
        }

        Ok(all_records)
    }

    /// 単一ページを取得し、JSON Schemaで検証してからデシリアライズする。
    async fn fetch_page<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        schema: &Value,
        cursor: Option<&str>,
    ) -> Result<PageResponse<T>> {
        let mut url = self
            .base_url
            .join(endpoint)
            .context("failed to build comment-hub URL")?;

        // クエリパラメータを構築
        {
            let mut query_pairs = url.query_pairs_mut();
            query_pairs.append_pair("limit", &self.page_limit.to_string());

            if let Some(c) = cursor {
                query_pairs.append_pair("cursor", c);
            }
        }

        let mut request = self.client.get(url);
        if let Some(token) = &self.service_token {
            request = request.header("X-Service-Token", token);
        }

        let response = request
            .send()
            .await
            .context("comment-hub page request failed")?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            anyhow::bail!("comment-hub returned error status {status}: {error_body}");
        }

        // レスポンスをJSONとして取得
        let response_json: Value = response
            .json()
            .await
            .context("failed to deserialize comment-hub response as JSON")?;

        // JSON Schemaで検証
        let validation = validate_json(schema, &response_json);
        if !validation.valid {
            warn!(
                endpoint,
                error_count = validation.errors.len(),
                first_error = %validation.errors.first().map_or("unknown", String::as_str),
                "comment-hub response failed JSON Schema validation"
            );
            anyhow::bail!(
                "comment-hub response validation failed for {endpoint}: {} errors",
                validation.errors.len()
            );
        }

        // 検証済みのJSONを構造体にデシリアライズ
        serde_json::from_value(response_json)
            .context("failed to deserialize validated comment-hub page")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: String) -> CommentHubConfig {
        CommentHubConfig {
            base_url,
            connect_timeout: Duration::from_secs(3),
            total_timeout: Duration::from_secs(30),
            service_token: None,
            page_limit: 200,
        }
    }

    #[tokio::test]
    async fn ping_succeeds_for_ok_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client = CommentHubClient::new(test_config(server.uri())).expect("client should build");

        client.ping().await.expect("ping should succeed");
    }

    #[tokio::test]
    async fn fetch_candidates_returns_single_page() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "data": [
                {
                    "text": "日差しが戻ります",
                    "patterns": ["sunny"],
                    "usage_count": 12,
                    "score": 0.84
                }
            ],
            "next_cursor": null
        });

        Mock::given(method("GET"))
            .and(path("/v1/comments/candidates"))
            .and(query_param("limit", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = CommentHubClient::new(test_config(server.uri())).expect("client should build");
        let records = client
            .fetch_candidates()
            .await
            .expect("fetch should succeed");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "日差しが戻ります");
        assert_eq!(records[0].patterns, vec!["sunny"]);
        assert_eq!(records[0].usage_count, 12);
    }

    #[tokio::test]
    async fn fetch_candidates_paginates_multiple_pages() {
        let server = MockServer::start().await;

        // First page
        let body1 = serde_json::json!({
            "data": [{"text": "雲が広がります", "patterns": ["cloudy"], "usage_count": 3, "score": 0.6}],
            "next_cursor": "cursor-2"
        });

        Mock::given(method("GET"))
            .and(path("/v1/comments/candidates"))
            .and(query_param_is_missing("cursor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body1))
            .mount(&server)
            .await;

        // Second page
        let body2 = serde_json::json!({
            "data": [{"text": "所により雷雨", "patterns": ["stormy"], "usage_count": 1, "score": 0.9}],
            "next_cursor": null
        });

        Mock::given(method("GET"))
            .and(path("/v1/comments/candidates"))
            .and(query_param("cursor", "cursor-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body2))
            .mount(&server)
            .await;

        let client = CommentHubClient::new(test_config(server.uri())).expect("client should build");
        let records = client
            .fetch_candidates()
            .await
            .expect("fetch should succeed");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text, "雲が広がります");
        assert_eq!(records[1].text, "所により雷雨");
    }

    #[tokio::test]
    async fn fetch_candidates_sends_service_token() {
        let server = MockServer::start().await;

        let body = serde_json::json!({ "data": [], "next_cursor": null });

        Mock::given(method("GET"))
            .and(path("/v1/comments/candidates"))
            .and(header("X-Service-Token", "test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let mut config = test_config(server.uri());
        config.service_token = Some("test-token".to_string());

        let client = CommentHubClient::new(config).expect("client should build");
        let records = client
            .fetch_candidates()
            .await
            .expect("fetch should succeed");

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn fetch_pool_returns_entries() {
        let server = MockServer::start().await;

        let body = serde_json::json!({
            "data": [
                { "text": "傘が手放せません", "patterns": ["rainy"] }
            ],
            "next_cursor": null
        });

        Mock::given(method("GET"))
            .and(path("/v1/comments/pool"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = CommentHubClient::new(test_config(server.uri())).expect("client should build");
        let records = client.fetch_pool().await.expect("fetch should succeed");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text, "傘が手放せません");
    }

    #[tokio::test]
    async fn fetch_candidates_rejects_contract_violation() {
        let server = MockServer::start().await;

        // data が無い応答は契約違反
        let body = serde_json::json!({ "next_cursor": null });

        Mock::given(method("GET"))
            .and(path("/v1/comments/candidates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = CommentHubClient::new(test_config(server.uri())).expect("client should build");
        let error = client
            .fetch_candidates()
            .await
            .expect_err("contract violation should fail");

        assert!(error.to_string().contains("validation failed"));
    }

    #[tokio::test]
    async fn fetch_candidates_surfaces_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/comments/candidates"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = CommentHubClient::new(test_config(server.uri())).expect("client should build");
        let error = client
            .fetch_candidates()
            .await
            .expect_err("error status should fail");

        assert!(error.to_string().contains("503"));
    }
}
