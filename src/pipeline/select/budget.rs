use std::collections::BTreeMap;

use super::types::SelectionBudget;

/// 予算の消費状況。総数とラベル別の計上数を追跡する。
#[derive(Debug, Clone)]
pub(crate) struct BudgetLedger {
    budget: SelectionBudget,
    accepted_total: usize,
    credited: BTreeMap<String, usize>,
}

impl BudgetLedger {
    pub(crate) fn new(budget: SelectionBudget) -> Self {
        Self {
            budget,
            accepted_total: 0,
            credited: BTreeMap::new(),
        }
    }

    pub(crate) fn remaining_total(&self) -> usize {
        self.budget
            .max_total_additions
            .saturating_sub(self.accepted_total)
    }

    pub(crate) fn is_total_exhausted(&self) -> bool {
        self.remaining_total() == 0
    }

    /// このラベルの gap にまだ追加を計上できるか。
    pub(crate) fn can_credit(&self, label: &str) -> bool {
        self.budget.max_per_category.is_none_or(|cap| {
            self.credited.get(label).copied().unwrap_or(0) < cap
        })
    }

    /// 受理 1 件を記録する。総数は 1 増え、計上対象の各ラベルの
    /// カテゴリ消費も 1 ずつ増える。
    pub(crate) fn record_acceptance(&mut self, credited_labels: &[String]) {
        self.accepted_total += 1;
        for label in credited_labels {
            *self.credited.entry(label.clone()).or_insert(0) += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(total: usize, per_category: Option<usize>) -> SelectionBudget {
        SelectionBudget {
            max_total_additions: total,
            max_per_category: per_category,
            allow_generic_fill: false,
        }
    }

    #[test]
    fn total_budget_depletes_per_acceptance() {
        let mut ledger = BudgetLedger::new(budget(2, None));

        assert_eq!(ledger.remaining_total(), 2);
        ledger.record_acceptance(&["sunny".to_string()]);
        ledger.record_acceptance(&[]);

        assert_eq!(ledger.remaining_total(), 0);
        assert!(ledger.is_total_exhausted());
    }

    #[test]
    fn zero_budget_is_exhausted_from_the_start() {
        let ledger = BudgetLedger::new(budget(0, None));

        assert!(ledger.is_total_exhausted());
    }

    #[test]
    fn per_category_cap_blocks_further_credit() {
        let mut ledger = BudgetLedger::new(budget(10, Some(1)));

        assert!(ledger.can_credit("rainy"));
        ledger.record_acceptance(&["rainy".to_string()]);

        assert!(!ledger.can_credit("rainy"));
        assert!(ledger.can_credit("snow"));
    }

    #[test]
    fn missing_cap_means_unlimited_credit() {
        let mut ledger = BudgetLedger::new(budget(10, None));

        for _ in 0..5 {
            ledger.record_acceptance(&["wind".to_string()]);
        }

        assert!(ledger.can_credit("wind"));
    }

    #[test]
    fn multi_label_acceptance_consumes_one_total_slot() {
        let mut ledger = BudgetLedger::new(budget(3, Some(2)));

        ledger.record_acceptance(&["stormy".to_string(), "rainy".to_string()]);

        assert_eq!(ledger.remaining_total(), 2);
        assert!(ledger.can_credit("stormy"));
        assert!(ledger.can_credit("rainy"));
    }
}
