use std::cmp::Ordering;

use crate::catalog::Candidate;

/// 選定の優先順位。スコア降順、同値なら使用実績降順、さらに同値なら
/// カタログ上の位置昇順。`total_cmp` を使うのでスコアが浮動小数でも
/// 全順序になる。
#[must_use]
pub fn ranking_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.usage_count.cmp(&a.usage_count))
        .then_with(|| a.ordinal.cmp(&b.ordinal))
}

/// 候補を優先順位でならべる。順位は実行を通じて一度だけ計算され、
/// gap が閉じても再計算はしない。
#[must_use]
pub fn rank_candidates<'a, I>(candidates: I) -> Vec<&'a Candidate>
where
    I: IntoIterator<Item = &'a Candidate>,
{
    let mut ranked: Vec<&Candidate> = candidates.into_iter().collect();
    ranked.sort_by(|a, b| ranking_order(a, b));
    ranked
}
