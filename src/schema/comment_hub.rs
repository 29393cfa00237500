use std::sync::LazyLock;

use serde_json::{Value, json};

/// comment-hub 候補カタログページ応答のスキーマ。
///
/// 構造のみを検査する。値域（負の usage_count など）はレコード単位の
/// 所見としてローダー側で扱うため、ここでは制約しない。1 レコードの
/// 値不正でページ全体の取得を失敗させないための分担。
pub(crate) static CANDIDATES_PAGE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "CommentHubCandidatesPage",
        "type": "object",
        "required": ["data"],
        "properties": {
            "data": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["text", "score"],
                    "properties": {
                        "text": { "type": "string" },
                        "patterns": {
                            "type": "array",
                            "items": { "type": "string" }
                        },
                        "usage_count": { "type": "integer" },
                        "score": { "type": "number" }
                    }
                }
            },
            "next_cursor": { "type": ["string", "null"] }
        }
    })
});

/// comment-hub 既存プールページ応答のスキーマ。
pub(crate) static POOL_PAGE_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "CommentHubPoolPage",
        "type": "object",
        "required": ["data"],
        "properties": {
            "data": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["text"],
                    "properties": {
                        "text": { "type": "string" },
                        "patterns": {
                            "type": "array",
                            "items": { "type": "string" }
                        }
                    }
                }
            },
            "next_cursor": { "type": ["string", "null"] }
        }
    })
});
