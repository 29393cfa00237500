use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    catalog::{Candidate, LoadedCatalog, LoadedPool},
    coverage::CoverageState,
    pipeline::{normalize::NormalizedBundle, RunContext},
    plan::CurationPlan,
};

pub(crate) mod budget;
pub mod ranking;
pub mod types;

use budget::BudgetLedger;
use ranking::rank_candidates;
pub use types::{AcceptedCandidate, SelectionBudget, SelectionNotes, SelectionOutcome};

/// 候補を貪欲に選定し、カテゴリ被覆の gap を埋める。
///
/// 入力が同じなら結果も常に同じになる純関数。既存プールと本文が一致する
/// 候補は前段で除外し、残りを順位付けして 2 段階で走査する。第 1 段は
/// ラベル付き候補で gap を埋め、第 2 段（`allow_generic_fill` 有効時のみ）
/// はラベルなし候補で残余予算を埋める。
#[must_use]
pub fn select_candidates(
    run_id: Uuid,
    catalog: &LoadedCatalog,
    pool: &LoadedPool,
    targets: &BTreeMap<String, usize>,
    budget: SelectionBudget,
) -> SelectionOutcome {
    let coverage_before = CoverageState::from_pool(&pool.entries, targets);
    let mut coverage = coverage_before.clone();
    let mut ledger = BudgetLedger::new(budget);
    let mut notes = SelectionNotes::default();
    let mut accepted: Vec<AcceptedCandidate> = Vec::new();

    // 既存プールと本文一致する候補は選定対象から外す
    let pool_texts: HashSet<&str> = pool
        .entries
        .iter()
        .map(|entry| entry.text.as_str())
        .collect();

    let mut fresh: Vec<&Candidate> = Vec::with_capacity(catalog.candidates.len());
    for candidate in &catalog.candidates {
        if pool_texts.contains(candidate.text.as_str()) {
            notes.already_in_pool += 1;
        } else {
            fresh.push(candidate);
        }
    }

    let ranked = rank_candidates(fresh);

    // 第 1 段: ラベル付き候補で gap を埋める
    for candidate in ranked.iter().filter(|candidate| !candidate.is_generic()) {
        if ledger.is_total_exhausted() {
            notes.budget_exhausted = coverage.has_open_gap();
            break;
        }

        let credited: Vec<String> = candidate
            .labels
            .iter()
            .filter(|label| coverage.gap(label) > 0 && ledger.can_credit(label))
            .cloned()
            .collect();

        if credited.is_empty() {
            notes.skipped_no_credit += 1;
            continue;
        }

        // 被覆はタグ集合の全ラベルに反映される
        coverage.apply_labels(&candidate.labels);
        ledger.record_acceptance(&credited);
        accepted.push(AcceptedCandidate {
            rank: accepted.len() + 1,
            candidate: (*candidate).clone(),
            credited,
        });
    }

    // 第 2 段: ラベルなし候補は最後の穴埋めとしてのみ使う
    if budget.allow_generic_fill {
        for candidate in ranked.iter().filter(|candidate| candidate.is_generic()) {
            if ledger.is_total_exhausted() {
                break;
            }

            ledger.record_acceptance(&[]);
            notes.generic_fill_count += 1;
            accepted.push(AcceptedCandidate {
                rank: accepted.len() + 1,
                candidate: (*candidate).clone(),
                credited: Vec::new(),
            });
        }
    }

    debug!(
        %run_id,
        accepted = accepted.len(),
        already_in_pool = notes.already_in_pool,
        skipped_no_credit = notes.skipped_no_credit,
        generic_fill = notes.generic_fill_count,
        "greedy selection finished"
    );

    SelectionOutcome {
        run_id,
        accepted,
        coverage_before,
        coverage_after: coverage,
        notes,
        diagnostics: crate::pipeline::normalize::InputDiagnostics::default(),
    }
}

#[async_trait]
pub(crate) trait SelectStage: Send + Sync {
    async fn select(&self, run: &RunContext, bundle: NormalizedBundle)
        -> Result<SelectionOutcome>;
}

/// 被覆 gap を貪欲に埋める選定ステージ。
pub(crate) struct GreedyCoverageSelectStage {
    targets: BTreeMap<String, usize>,
    budget: SelectionBudget,
}

impl GreedyCoverageSelectStage {
    pub(crate) fn new(plan: &CurationPlan) -> Self {
        Self {
            targets: plan.targets.clone(),
            budget: SelectionBudget::from(plan),
        }
    }
}

#[async_trait]
impl SelectStage for GreedyCoverageSelectStage {
    async fn select(
        &self,
        run: &RunContext,
        bundle: NormalizedBundle,
    ) -> Result<SelectionOutcome> {
        let outcome = select_candidates(
            bundle.run_id,
            &bundle.catalog,
            &bundle.pool,
            &self.targets,
            self.budget,
        )
        .with_diagnostics(bundle.diagnostics);

        info!(
            run_id = %run.run_id,
            accepted = outcome.accepted.len(),
            budget_exhausted = outcome.notes.budget_exhausted,
            open_gaps = outcome.coverage_after.open_gaps().count(),
            "selection complete"
        );

        Ok(outcome)
    }
}
