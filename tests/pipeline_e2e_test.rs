/// ファイル入力から報告ファイル出力までの一気通貫テスト。
///
/// 環境変数から構成を組み立て、一時ディレクトリ上のカタログ／プール／
/// 計画ファイルを読み込ませて、報告ファイルの中身まで検証する。
use std::fs;
use std::path::PathBuf;

use curation_worker::{app::ComponentRegistry, config::Config, pipeline::RunContext};
use tempfile::TempDir;

struct Fixture {
    // 一時ディレクトリはテスト終了まで生かしておく
    _temp: TempDir,
    catalog_path: PathBuf,
    pool_path: PathBuf,
    plan_path: PathBuf,
    report_dir: PathBuf,
}

fn write_fixture(catalog: &serde_json::Value, pool: &serde_json::Value, plan: &str) -> Fixture {
    let temp = TempDir::new().expect("temp dir");
    let catalog_path = temp.path().join("catalog.json");
    let pool_path = temp.path().join("pool.json");
    let plan_path = temp.path().join("plan.yaml");
    let report_dir = temp.path().join("reports");

    fs::write(
        &catalog_path,
        serde_json::to_string_pretty(catalog).expect("encode catalog"),
    )
    .expect("write catalog");
    fs::write(
        &pool_path,
        serde_json::to_string_pretty(pool).expect("encode pool"),
    )
    .expect("write pool");
    fs::write(&plan_path, plan).expect("write plan");

    Fixture {
        _temp: temp,
        catalog_path,
        pool_path,
        plan_path,
        report_dir,
    }
}

fn build_registry(fixture: &Fixture, strict: bool) -> anyhow::Result<ComponentRegistry> {
    temp_env::with_vars(
        [
            ("CURATION_SOURCE", Some("file")),
            ("CURATION_CATALOG_PATH", fixture.catalog_path.to_str()),
            ("CURATION_POOL_PATH", fixture.pool_path.to_str()),
            ("CURATION_PLAN_PATH", fixture.plan_path.to_str()),
            ("CURATION_REPORT_DIR", fixture.report_dir.to_str()),
            (
                "CURATION_STRICT_VALIDATION",
                Some(if strict { "true" } else { "false" }),
            ),
        ],
        || {
            let config = Config::from_env()?;
            ComponentRegistry::build(config)
        },
    )
}

fn broken_record_fixture() -> Fixture {
    let catalog = serde_json::json!([
        {"text": "朝は晴れるでしょう", "patterns": ["sunny"], "usage_count": 4, "score": 0.6},
        {"text": "壊れたレコード", "patterns": ["rainy"], "usage_count": -3, "score": 0.5}
    ]);
    let pool = serde_json::json!([]);
    let plan = concat!(
        "targets:\n",
        "  sunny: 1\n",
        "  rainy: 1\n",
        "max_total_additions: 5\n",
        "known_labels:\n",
        "  - sunny\n",
        "  - rainy\n",
    );
    write_fixture(&catalog, &pool, plan)
}

#[tokio::test]
async fn test_file_source_run_writes_json_and_markdown_reports() {
    let catalog = serde_json::json!([
        {"text": "朝は青空が広がるでしょう", "patterns": ["sunny"], "usage_count": 5, "score": 0.9},
        {"text": "昼過ぎから本降りの雨になりそうです", "patterns": ["rainy"], "usage_count": 3, "score": 0.8},
        {"text": "既存の晴れコメント", "patterns": ["sunny"], "usage_count": 9, "score": 0.99},
        {"text": "夕方は風が強まる見込みです", "patterns": ["wind"], "usage_count": 2, "score": 0.7},
        {"text": "今日も良い一日をお過ごしください", "patterns": [], "usage_count": 1, "score": 0.95}
    ]);
    let pool = serde_json::json!([
        {"text": "既存の晴れコメント", "patterns": ["sunny"]}
    ]);
    let plan = concat!(
        "targets:\n",
        "  sunny: 2\n",
        "  rainy: 1\n",
        "max_total_additions: 3\n",
        "allow_generic_fill: true\n",
        "known_labels:\n",
        "  - sunny\n",
        "  - rainy\n",
    );
    let fixture = write_fixture(&catalog, &pool, plan);

    let registry = build_registry(&fixture, false).expect("registry should build");
    let run = RunContext::new();
    let artifacts = registry.run_curation(&run).await.expect("curation run");

    assert_eq!(
        artifacts.json_path,
        fixture.report_dir.join("curation_report.json")
    );
    let report: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(&artifacts.json_path).expect("read json report"),
    )
    .expect("parse json report");

    assert_eq!(report["run_id"], serde_json::json!(run.run_id));
    let selections = report["selections"].as_array().expect("selections array");
    assert_eq!(selections.len(), 3);
    assert_eq!(selections[0]["text"], "朝は青空が広がるでしょう");
    assert_eq!(selections[0]["credited"], serde_json::json!(["sunny"]));
    assert_eq!(selections[1]["credited"], serde_json::json!(["rainy"]));
    assert_eq!(selections[2]["text"], "今日も良い一日をお過ごしください");
    assert!(selections[2]["credited"]
        .as_array()
        .expect("credited array")
        .is_empty());

    assert_eq!(
        report["coverage"],
        serde_json::json!([
            {"label": "rainy", "target": 1, "before": 0, "after": 1, "remaining": 0},
            {"label": "sunny", "target": 2, "before": 1, "after": 2, "remaining": 0}
        ])
    );
    assert!(report["unmet"].as_array().expect("unmet array").is_empty());

    assert_eq!(report["notes"]["already_in_pool"], 1);
    assert_eq!(report["notes"]["skipped_no_credit"], 1);
    assert_eq!(report["notes"]["generic_fill_count"], 1);
    assert_eq!(report["notes"]["budget_exhausted"], false);
    assert_eq!(report["diagnostics"]["catalog_records"], 5);
    assert_eq!(report["diagnostics"]["catalog_skipped"], 0);
    assert_eq!(report["diagnostics"]["unknown_label_warnings"], 1);
    assert_eq!(report["diagnostics"]["pool_entries"], 1);

    let markdown = fs::read_to_string(&artifacts.markdown_path).expect("read markdown report");
    assert!(markdown.contains("# Pool curation report"));
    assert!(markdown.contains("朝は青空が広がるでしょう"));
    assert!(markdown.contains("All coverage targets were met."));
}

#[tokio::test]
async fn test_strict_validation_aborts_run_before_reporting() {
    let fixture = broken_record_fixture();

    let registry = build_registry(&fixture, true).expect("registry should build");
    let run = RunContext::new();
    let error = registry
        .run_curation(&run)
        .await
        .expect_err("strict run should fail");

    let rendered = format!("{error:#}");
    assert!(
        rendered.contains("candidate catalog failed validation"),
        "unexpected error: {rendered}"
    );
    assert!(
        rendered.contains("usage count is negative"),
        "unexpected error: {rendered}"
    );
    assert!(!fixture.report_dir.join("curation_report.json").exists());
}

#[tokio::test]
async fn test_lenient_validation_skips_bad_records_and_reports() {
    let fixture = broken_record_fixture();

    let registry = build_registry(&fixture, false).expect("registry should build");
    let run = RunContext::new();
    let artifacts = registry.run_curation(&run).await.expect("lenient run");

    let report = &artifacts.report;
    assert_eq!(report.diagnostics.catalog_records, 2);
    assert_eq!(report.diagnostics.catalog_skipped, 1);
    assert_eq!(report.selections.len(), 1);
    assert_eq!(report.selections[0].text, "朝は晴れるでしょう");
    assert_eq!(report.unmet.len(), 1);
    assert_eq!(report.unmet[0].label, "rainy");
    assert_eq!(report.unmet[0].remaining, 1);
}
