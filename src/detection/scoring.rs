//! Ranking agreement score.
//!
//! Compares a participant's completed ranking with a reference (expert)
//! ranking using Spearman's rank correlation, mapped from `[-1, 1]` to
//! `[0, 1]` and rounded to three decimals. 1.0 means identical order.

/// Score `ranking` against `reference`.
///
/// `None` when the two lists are not permutations of the same two-or-more
/// items.
pub fn agreement_score(ranking: &[String], reference: &[String]) -> Option<f64> {
    let n = reference.len();
    if n < 2 || ranking.len() != n {
        return None;
    }

    let mut sum_sq: f64 = 0.0;
    for (expert_pos, item) in reference.iter().enumerate() {
        let pos = ranking.iter().position(|r| r == item)?;
        let d = pos as f64 - expert_pos as f64;
        sum_sq += d * d;
    }

    let n_f = n as f64;
    let rho = 1.0 - (6.0 * sum_sq) / (n_f * (n_f * n_f - 1.0));
    let score = (rho + 1.0) / 2.0;
    Some((score * 1000.0).round() / 1000.0)
}
