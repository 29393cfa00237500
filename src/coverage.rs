use std::collections::BTreeMap;

use serde::Serialize;

use crate::catalog::PoolEntry;

/// 1 ラベル分の被覆状況。`target` が `None` のラベルは目標対象外で、
/// 報告のためだけに追跡される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct LabelCoverage {
    pub target: Option<usize>,
    pub current: usize,
}

impl LabelCoverage {
    /// 残り必要数。`max(0, target - current)` を返す。
    #[must_use]
    pub fn gap(&self) -> usize {
        self.target
            .map_or(0, |target| target.saturating_sub(self.current))
    }
}

/// ラベルごとの被覆状況。`BTreeMap` なので列挙順は常に辞書順になり、
/// 報告とログが決定的になる。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CoverageState {
    entries: BTreeMap<String, LabelCoverage>,
}

impl CoverageState {
    /// 既存プールと目標値から初期状態を作る。
    ///
    /// プールの各エントリはタグ集合の全ラベルを 1 ずつ加算する。複数ラベル
    /// を持つエントリは複数カテゴリの被覆に同時に寄与する。
    #[must_use]
    pub fn from_pool(pool: &[PoolEntry], targets: &BTreeMap<String, usize>) -> Self {
        let mut entries: BTreeMap<String, LabelCoverage> = targets
            .iter()
            .map(|(label, target)| {
                (
                    label.clone(),
                    LabelCoverage {
                        target: Some(*target),
                        current: 0,
                    },
                )
            })
            .collect();

        for entry in pool {
            for label in &entry.labels {
                entries.entry(label.clone()).or_default().current += 1;
            }
        }

        Self { entries }
    }

    /// 候補 1 件の受理を反映する。タグ集合の全ラベルを加算する。
    pub fn apply_labels(&mut self, labels: &[String]) {
        for label in labels {
            self.entries.entry(label.clone()).or_default().current += 1;
        }
    }

    #[must_use]
    pub fn current(&self, label: &str) -> usize {
        self.entries.get(label).map_or(0, |entry| entry.current)
    }

    /// 残り必要数。未知のラベルは gap 0 として扱う。
    #[must_use]
    pub fn gap(&self, label: &str) -> usize {
        self.entries.get(label).map_or(0, LabelCoverage::gap)
    }

    /// gap が正のラベルを辞書順で返す。
    pub fn open_gaps(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries
            .iter()
            .filter(|(_, coverage)| coverage.gap() > 0)
            .map(|(label, coverage)| (label.as_str(), coverage.gap()))
    }

    #[must_use]
    pub fn has_open_gap(&self) -> bool {
        self.open_gaps().next().is_some()
    }

    /// 全ラベルを辞書順で返す。報告の被覆表はこの列挙から作る。
    pub fn labels(&self) -> impl Iterator<Item = (&str, &LabelCoverage)> {
        self.entries
            .iter()
            .map(|(label, coverage)| (label.as_str(), coverage))
    }
}
