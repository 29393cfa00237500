use serde::Serialize;
use uuid::Uuid;

use crate::{
    catalog::Candidate, coverage::CoverageState, pipeline::normalize::InputDiagnostics,
    plan::CurationPlan,
};

/// 1 回の実行で許される追加量の上限。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionBudget {
    /// 実行全体での追加数上限
    pub max_total_additions: usize,
    /// 1 ラベルの gap に計上できる追加数の上限。`None` は無制限。
    pub max_per_category: Option<usize>,
    /// ラベルなし候補を残余予算の穴埋めに使うか
    pub allow_generic_fill: bool,
}

impl From<&CurationPlan> for SelectionBudget {
    fn from(plan: &CurationPlan) -> Self {
        Self {
            max_total_additions: plan.max_total_additions,
            max_per_category: plan.max_per_category,
            allow_generic_fill: plan.allow_generic_fill,
        }
    }
}

/// 受理された候補。`rank` は受理順で、そのまま提示順になる。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedCandidate {
    pub rank: usize,
    pub candidate: Candidate,
    /// gap に計上されたラベル。被覆はタグ集合の全ラベルに反映されるが、
    /// カテゴリ上限の消費はここに挙がったラベルだけが対象になる。
    pub credited: Vec<String>,
}

/// 選定の付帯情報。エラーではなく報告対象の状態を運ぶ。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SelectionNotes {
    /// gap が残ったまま総予算で打ち切られた
    pub budget_exhausted: bool,
    /// 穴埋めに使われたラベルなし候補の数
    pub generic_fill_count: usize,
    /// 既存プールと本文一致で除外された候補の数
    pub already_in_pool: usize,
    /// 計上可能なラベルが無くスキップされた候補の数
    pub skipped_no_credit: usize,
}

/// 選定の全結果。同じ入力に対して常に同じ値になる。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionOutcome {
    pub run_id: Uuid,
    pub accepted: Vec<AcceptedCandidate>,
    pub coverage_before: CoverageState,
    pub coverage_after: CoverageState,
    pub notes: SelectionNotes,
    pub diagnostics: InputDiagnostics,
}

impl SelectionOutcome {
    /// 入力検証の診断を付け替える。
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: InputDiagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }
}
