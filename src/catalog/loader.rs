use std::collections::HashMap;

use thiserror::Error;
use tracing::warn;

use super::types::{Candidate, PoolEntry, RawCandidateRecord, RawPoolRecord};

/// 不正レコード検出時の振る舞い。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    /// 不正レコードを除外して警告し、残りを読み込む（既定）。
    SkipAndWarn,
    /// 最初の不正レコードで読み込みを中断する。
    Abort,
}

impl ValidationPolicy {
    #[must_use]
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Abort } else { Self::SkipAndWarn }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidReason {
    #[error("text is empty")]
    EmptyText,
    #[error("usage count is negative: {0}")]
    NegativeUsage(i64),
    #[error("score is not finite: {0}")]
    NonFiniteScore(f64),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("invalid candidate at record {ordinal}: {reason}")]
    InvalidCandidate {
        ordinal: usize,
        reason: InvalidReason,
    },
    #[error("duplicate candidate at record {ordinal} (first kept at record {kept_ordinal}): {text:?}")]
    DuplicateCandidate {
        text: String,
        kept_ordinal: usize,
        ordinal: usize,
    },
}

/// 読み込みは続行できたが人の確認が必要な所見。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogWarning {
    #[error("unknown pattern label {label:?} at record {ordinal}")]
    UnknownLabel { ordinal: usize, label: String },
}

/// カタログ読み込みの結果。除外済みレコードと警告も保持する。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadedCatalog {
    pub candidates: Vec<Candidate>,
    pub skipped: Vec<CatalogError>,
    pub warnings: Vec<CatalogWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoadedPool {
    pub entries: Vec<PoolEntry>,
}

/// 生レコード列を検証して候補カタログを構築する。
///
/// テキストは前後空白を除いた形に正規化し、正規化後の完全一致で重複を
/// 判定する。先に受理したレコードが勝ち、後続は除外される。`ordinal` は
/// 元の並び位置のまま保持する。
///
/// # Errors
/// [`ValidationPolicy::Abort`] の場合のみ、最初の所見を [`CatalogError`]
/// として返す。`SkipAndWarn` では所見は `skipped` に積まれ、エラーには
/// ならない。
pub fn load_candidates(
    records: Vec<RawCandidateRecord>,
    known_labels: &[String],
    policy: ValidationPolicy,
) -> Result<LoadedCatalog, CatalogError> {
    let mut candidates = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    let mut warnings = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::with_capacity(records.len());

    for (ordinal, record) in records.into_iter().enumerate() {
        let candidate = match validate_candidate(record, ordinal) {
            Ok(candidate) => candidate,
            Err(error) => {
                reject(error, policy, &mut skipped)?;
                continue;
            }
        };

        if let Some(&kept_ordinal) = seen.get(candidate.text.as_str()) {
            let error = CatalogError::DuplicateCandidate {
                text: candidate.text,
                kept_ordinal,
                ordinal,
            };
            reject(error, policy, &mut skipped)?;
            continue;
        }

        collect_unknown_labels(&candidate.labels, known_labels, ordinal, &mut warnings);
        seen.insert(candidate.text.clone(), ordinal);
        candidates.push(candidate);
    }

    Ok(LoadedCatalog {
        candidates,
        skipped,
        warnings,
    })
}

/// 既存プールのレコードを正規化する。プールは正とみなし、検証は行わない。
#[must_use]
pub fn load_pool(records: Vec<RawPoolRecord>) -> LoadedPool {
    let entries = records
        .into_iter()
        .map(|record| PoolEntry {
            text: record.text.trim().to_string(),
            labels: normalize_labels(&record.patterns),
        })
        .collect();

    LoadedPool { entries }
}

fn validate_candidate(
    record: RawCandidateRecord,
    ordinal: usize,
) -> Result<Candidate, CatalogError> {
    let RawCandidateRecord {
        text,
        patterns,
        usage_count,
        score,
    } = record;

    let text = text.trim();
    if text.is_empty() {
        return Err(CatalogError::InvalidCandidate {
            ordinal,
            reason: InvalidReason::EmptyText,
        });
    }

    let usage_count = u64::try_from(usage_count).map_err(|_| CatalogError::InvalidCandidate {
        ordinal,
        reason: InvalidReason::NegativeUsage(usage_count),
    })?;

    if !score.is_finite() {
        return Err(CatalogError::InvalidCandidate {
            ordinal,
            reason: InvalidReason::NonFiniteScore(score),
        });
    }

    Ok(Candidate {
        text: text.to_string(),
        labels: normalize_labels(&patterns),
        usage_count,
        score,
        ordinal,
    })
}

fn reject(
    error: CatalogError,
    policy: ValidationPolicy,
    skipped: &mut Vec<CatalogError>,
) -> Result<(), CatalogError> {
    match policy {
        ValidationPolicy::Abort => Err(error),
        ValidationPolicy::SkipAndWarn => {
            warn!(%error, "candidate record skipped");
            skipped.push(error);
            Ok(())
        }
    }
}

/// ラベル集合の正規化。空白を除き、空ラベルを捨て、初出順を保って重複を畳む。
fn normalize_labels(patterns: &[String]) -> Vec<String> {
    let mut labels: Vec<String> = Vec::with_capacity(patterns.len());
    for raw in patterns {
        let label = raw.trim();
        if label.is_empty() {
            continue;
        }
        if labels.iter().any(|existing| existing.as_str() == label) {
            continue;
        }
        labels.push(label.to_string());
    }
    labels
}

fn collect_unknown_labels(
    labels: &[String],
    known_labels: &[String],
    ordinal: usize,
    warnings: &mut Vec<CatalogWarning>,
) {
    // 既知ラベルが未設定のときはチェック自体を無効にする。
    if known_labels.is_empty() {
        return;
    }
    for label in labels {
        if !known_labels.contains(label) {
            warn!(ordinal, %label, "unknown pattern label");
            warnings.push(CatalogWarning::UnknownLabel {
                ordinal,
                label: label.clone(),
            });
        }
    }
}
