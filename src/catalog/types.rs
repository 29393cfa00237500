use serde::{Deserialize, Serialize};

/// カタログの生レコード。ファイルと comment-hub の双方で同じ形を使う。
///
/// `usage_count` は検証前なので符号付きで受け取る。負値は
/// [`super::loader`] が `InvalidCandidate` として弾く。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawCandidateRecord {
    pub text: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub usage_count: i64,
    pub score: f64,
}

/// 既存プールの生レコード。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawPoolRecord {
    pub text: String,
    #[serde(default)]
    pub patterns: Vec<String>,
}

/// 検証済みの候補コメント。
///
/// `ordinal` はカタログ内の元の並び位置。スコアと使用回数が同点のときの
/// 最終タイブレークに使うため、選定結果からも元レコードを辿れる。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub text: String,
    pub labels: Vec<String>,
    pub usage_count: u64,
    pub score: f64,
    pub ordinal: usize,
}

impl Candidate {
    /// ラベルを一つも持たない候補は汎用フィラー扱いになる。
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.labels.is_empty()
    }
}

/// 既存プールの 1 エントリ。選定中は読み取り専用。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolEntry {
    pub text: String,
    pub labels: Vec<String>,
}
