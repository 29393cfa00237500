//! 計測・評価用のユーティリティ群。
use std::collections::BTreeMap;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::catalog::{RawCandidateRecord, RawPoolRecord};

const TIMES: [&str; 4] = ["朝", "昼過ぎ", "夕方", "夜"];
const AREAS: [&str; 4] = ["山沿い", "沿岸部", "平野部", "内陸部"];
const SKIES: [&str; 4] = ["青空", "晴れ間", "秋晴れ", "強い日差し"];
const RAINS: [&str; 4] = ["小雨", "本降りの雨", "にわか雨", "冷たい雨"];
const GREETINGS: [&str; 4] = [
    "おはようございます",
    "こんにちは",
    "お疲れさまです",
    "今日も一日",
];

/// ラベル集合と文面テンプレートの対。空のラベル集合は汎用コメントを表す。
const TEMPLATES: [(&[&str], &str); 11] = [
    (&["sunny"], "{time}は{sky}が広がり、お出かけ日和です"),
    (&["cloudy"], "{time}は雲が多く、すっきりしない空模様です"),
    (&["rainy"], "{time}から{rain}が降り出すでしょう"),
    (
        &["stormy", "rainy"],
        "{area}では雷を伴う激しい雨に注意してください",
    ),
    (&["snow"], "{area}では雪が積もるおそれがあります"),
    (&["wind"], "{time}にかけて{area}で風が強まる見込みです"),
    (&["cold"], "{time}は冷え込みが強まります。暖かくしてお過ごしください"),
    (&["hot"], "{time}は気温が上がります。こまめな水分補給を"),
    (&["fog"], "{time}は{area}で霧が発生しやすいでしょう"),
    (
        &["sunny", "wind"],
        "{sky}が広がる一方、{area}では風が冷たく感じられそうです",
    ),
    (&[], "{greeting}。今日も良い一日をお過ごしください"),
];

fn fill_template(template: &str, rng: &mut StdRng) -> String {
    let mut text = template.to_string();
    for (key, options) in [
        ("time", TIMES.as_ref()),
        ("area", AREAS.as_ref()),
        ("sky", SKIES.as_ref()),
        ("rain", RAINS.as_ref()),
        ("greeting", GREETINGS.as_ref()),
    ] {
        let choice = options[rng.random_range(0..options.len())];
        text = text.replace(&format!("{{{key}}}"), choice);
    }
    text
}

/// 合成候補カタログを生成する。
///
/// シード固定の乱数で生成するため、同じ `count` に対して常に同じ列を
/// 返す。本文末尾の連番で一意性を保証している。
#[must_use]
pub fn synthetic_catalog(count: usize) -> Vec<RawCandidateRecord> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut records = Vec::with_capacity(count);

    for idx in 0..count {
        let (labels, template) = TEMPLATES[rng.random_range(0..TEMPLATES.len())];
        let text = format!("{}（{idx}）", fill_template(template, &mut rng));

        records.push(RawCandidateRecord {
            text,
            patterns: labels.iter().map(ToString::to_string).collect(),
            usage_count: rng.random_range(0..50),
            score: rng.random_range(0.0..1.0),
        });
    }

    records
}

/// 合成既存プールを生成する。カタログとは別シードなので本文は重複しない。
#[must_use]
pub fn synthetic_pool(count: usize) -> Vec<RawPoolRecord> {
    let mut rng = StdRng::seed_from_u64(43);
    let mut records = Vec::with_capacity(count);

    for idx in 0..count {
        let (labels, template) = TEMPLATES[rng.random_range(0..TEMPLATES.len())];
        let text = format!("{}〔{idx}〕", fill_template(template, &mut rng));

        records.push(RawPoolRecord {
            text,
            patterns: labels.iter().map(ToString::to_string).collect(),
        });
    }

    records
}

/// 計測で使う標準的な目標セット。
#[must_use]
pub fn synthetic_targets() -> BTreeMap<String, usize> {
    [
        ("sunny", 30),
        ("cloudy", 25),
        ("rainy", 25),
        ("stormy", 10),
        ("snow", 10),
        ("wind", 15),
        ("cold", 12),
        ("hot", 12),
        ("fog", 8),
    ]
    .into_iter()
    .map(|(label, target)| (label.to_string(), target))
    .collect()
}
