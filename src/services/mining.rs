use std::collections::{HashMap, HashSet};
use std::time::Instant;

use crate::{
    error::QueryError,
    models::{AssociationRule, FrequentItemset, MiningResult, MiningSummary, TransactionMatrix},
};

/// Below this many transactions the thresholds are relaxed
pub const SPARSE_TRANSACTION_LIMIT: usize = 5;
const RELAXED_SUPPORT_FLOOR: f64 = 0.05;
const RELAXED_CONFIDENCE_FLOOR: f64 = 0.1;
const TOP_PRODUCTS: usize = 5;

/// Thresholds actually applied to a mining run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub min_support: f64,
    pub min_confidence: f64,
    pub relaxed: bool,
}

impl Thresholds {
    /// Halves both thresholds (with floors) when there are fewer than
    /// [`SPARSE_TRANSACTION_LIMIT`] transactions.
    ///
    /// This is a usability trade-off so that small windows still produce rules;
    /// relaxed results carry no statistical guarantee.
    pub fn for_transactions(transactions: usize, min_support: f64, min_confidence: f64) -> Self {
        if transactions < SPARSE_TRANSACTION_LIMIT {
            Self {
                min_support: RELAXED_SUPPORT_FLOOR.max(min_support * 0.5),
                min_confidence: RELAXED_CONFIDENCE_FLOOR.max(min_confidence * 0.5),
                relaxed: true,
            }
        } else {
            Self {
                min_support,
                min_confidence,
                relaxed: false,
            }
        }
    }
}

/// Row-membership bitsets, one per matrix column
struct ItemColumns {
    bits: Vec<Vec<u64>>,
    words: usize,
    transactions: usize,
}

impl ItemColumns {
    fn from_matrix(matrix: &TransactionMatrix) -> Self {
        let words = matrix.len().div_ceil(64);
        let mut bits = vec![vec![0u64; words]; matrix.item_count()];
        for (row, cells) in matrix.rows.iter().enumerate() {
            for (column, present) in cells.iter().enumerate() {
                if *present {
                    bits[column][row / 64] |= 1u64 << (row % 64);
                }
            }
        }
        Self {
            bits,
            words,
            transactions: matrix.len(),
        }
    }

    /// Fraction of transactions containing every item in `itemset`
    fn support(&self, itemset: &[usize]) -> f64 {
        let count: u32 = (0..self.words)
            .map(|w| {
                itemset
                    .iter()
                    .fold(u64::MAX, |acc, &column| acc & self.bits[column][w])
                    .count_ones()
            })
            .sum();
        count as f64 / self.transactions as f64
    }
}

/// Level-wise Apriori search.
///
/// Candidates of size k+1 are joined from frequent k-itemsets sharing their first
/// k-1 items and dropped if any k-subset is infrequent. Itemsets are sorted column
/// indices; output is level by level, lexicographic within a level.
fn frequent_itemsets(columns: &ItemColumns, min_support: f64) -> Vec<(Vec<usize>, f64)> {
    let mut found = Vec::new();
    let mut level: Vec<(Vec<usize>, f64)> = (0..columns.bits.len())
        .map(|c| (vec![c], columns.support(&[c])))
        .filter(|(_, support)| *support >= min_support)
        .collect();

    while !level.is_empty() {
        let previous: HashSet<&[usize]> = level.iter().map(|(items, _)| items.as_slice()).collect();
        let mut next = Vec::new();

        for (i, (left, _)) in level.iter().enumerate() {
            let prefix = &left[..left.len() - 1];
            for (right, _) in &level[i + 1..] {
                if &right[..right.len() - 1] != prefix {
                    continue;
                }
                let mut candidate = left.clone();
                candidate.push(right[right.len() - 1]);

                let closed = (0..candidate.len()).all(|skip| {
                    let subset: Vec<usize> = candidate
                        .iter()
                        .enumerate()
                        .filter(|(idx, _)| *idx != skip)
                        .map(|(_, &c)| c)
                        .collect();
                    previous.contains(subset.as_slice())
                });
                if !closed {
                    continue;
                }

                let support = columns.support(&candidate);
                if support >= min_support {
                    next.push((candidate, support));
                }
            }
        }

        found.append(&mut level);
        level = next;
    }

    found
}

/// All `r`-element combinations of `items`, in lexicographic position order
fn combinations(items: &[usize], r: usize) -> Vec<Vec<usize>> {
    let n = items.len();
    if r == 0 || r > n {
        return Vec::new();
    }
    let mut result = Vec::new();
    let mut idx: Vec<usize> = (0..r).collect();
    loop {
        result.push(idx.iter().map(|&i| items[i]).collect());

        let Some(pos) = (0..r).rev().find(|&p| idx[p] != p + n - r) else {
            return result;
        };
        idx[pos] += 1;
        for p in pos + 1..r {
            idx[p] = idx[p - 1] + 1;
        }
    }
}

fn derive_rules(
    itemsets: &[(Vec<usize>, f64)],
    items: &[String],
    min_confidence: f64,
) -> Vec<AssociationRule> {
    let supports: HashMap<&[usize], f64> = itemsets
        .iter()
        .map(|(set, support)| (set.as_slice(), *support))
        .collect();
    let names = |set: &[usize]| -> Vec<String> { set.iter().map(|&c| items[c].clone()).collect() };

    let mut rules = Vec::new();
    for (itemset, support) in itemsets.iter().filter(|(set, _)| set.len() >= 2) {
        for size in (1..itemset.len()).rev() {
            for antecedent in combinations(itemset, size) {
                let consequent: Vec<usize> = itemset
                    .iter()
                    .copied()
                    .filter(|c| !antecedent.contains(c))
                    .collect();

                // Downward closure guarantees both halves were counted
                let (Some(&sa), Some(&sc)) = (
                    supports.get(antecedent.as_slice()),
                    supports.get(consequent.as_slice()),
                ) else {
                    continue;
                };

                let confidence = support / sa;
                if confidence < min_confidence {
                    continue;
                }

                rules.push(AssociationRule {
                    antecedents: names(&antecedent),
                    consequents: names(&consequent),
                    antecedent_support: sa,
                    consequent_support: sc,
                    support: *support,
                    confidence,
                    lift: confidence / sc,
                    leverage: support - sa * sc,
                    conviction: (confidence < 1.0).then(|| (1.0 - sc) / (1.0 - confidence)),
                });
            }
        }
    }

    sort_rules(&mut rules);
    rules
}

/// Stable sort by confidence desc, then lift desc
pub fn sort_rules(rules: &mut [AssociationRule]) {
    rules.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.lift.total_cmp(&a.lift))
    });
}

/// Up to five product names by transaction frequency, ties in column order
fn top_products(matrix: &TransactionMatrix) -> Vec<String> {
    let mut counts: Vec<(usize, usize)> = matrix.column_counts().into_iter().enumerate().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_PRODUCTS)
        .map(|(column, _)| matrix.items[column].clone())
        .collect()
}

/// Mines frequent itemsets and association rules from a transaction matrix
///
/// Failures are reported through [`MiningResult::error`] with empty collections,
/// so callers can always render the summary.
pub fn mine(matrix: &TransactionMatrix, min_support: f64, min_confidence: f64) -> MiningResult {
    let start = Instant::now();
    let thresholds = Thresholds::for_transactions(matrix.len(), min_support, min_confidence);

    if thresholds.relaxed {
        tracing::info!(
            transactions = matrix.len(),
            requested_support = min_support,
            requested_confidence = min_confidence,
            min_support = thresholds.min_support,
            min_confidence = thresholds.min_confidence,
            "Relaxed mining thresholds for sparse data"
        );
    }

    let mut summary = MiningSummary {
        total_transactions: matrix.len(),
        total_products: matrix.item_count(),
        frequent_itemsets_count: 0,
        rules_count: 0,
        min_support: thresholds.min_support,
        min_confidence: thresholds.min_confidence,
        thresholds_relaxed: thresholds.relaxed,
        top_products: top_products(matrix),
    };

    if matrix.is_empty() {
        tracing::warn!("No transaction data to mine");
        return MiningResult {
            summary,
            error: Some(QueryError::no_data("no transaction data")),
            ..Default::default()
        };
    }

    let columns = ItemColumns::from_matrix(matrix);
    let itemsets = frequent_itemsets(&columns, thresholds.min_support);

    if itemsets.is_empty() {
        tracing::info!(
            min_support = thresholds.min_support,
            "No itemset met the support threshold"
        );
        return MiningResult {
            summary,
            error: Some(QueryError::threshold_too_strict("no frequent itemsets")),
            ..Default::default()
        };
    }

    let rules = derive_rules(&itemsets, &matrix.items, thresholds.min_confidence);

    let frequent_itemsets: Vec<FrequentItemset> = itemsets
        .into_iter()
        .map(|(set, support)| FrequentItemset {
            items: set.iter().map(|&c| matrix.items[c].clone()).collect(),
            support,
        })
        .collect();

    summary.frequent_itemsets_count = frequent_itemsets.len();
    summary.rules_count = rules.len();

    tracing::info!(
        frequent_itemsets = summary.frequent_itemsets_count,
        rules = summary.rules_count,
        processing_time_ms = start.elapsed().as_millis(),
        "Association rule mining completed"
    );

    MiningResult {
        frequent_itemsets,
        rules,
        summary,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn matrix(transactions: &[&[&str]]) -> TransactionMatrix {
        let mut items: Vec<String> = Vec::new();
        for t in transactions {
            for item in *t {
                if !items.iter().any(|i| i == item) {
                    items.push(item.to_string());
                }
            }
        }
        let rows = transactions
            .iter()
            .map(|t| items.iter().map(|i| t.contains(&i.as_str())).collect())
            .collect();
        TransactionMatrix {
            transaction_ids: (1..=transactions.len()).map(|i| format!("group_{}", i)).collect(),
            items,
            rows,
        }
    }

    fn baskets() -> TransactionMatrix {
        matrix(&[
            &["bread", "milk"],
            &["bread", "diaper", "beer", "eggs"],
            &["milk", "diaper", "beer", "cola"],
            &["bread", "milk", "diaper", "beer"],
            &["bread", "milk", "diaper", "cola"],
        ])
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_thresholds_relax_below_five_transactions() {
        let t = Thresholds::for_transactions(4, 0.1, 0.3);
        assert!(t.relaxed);
        assert!(approx(t.min_support, 0.05));
        assert!(approx(t.min_confidence, 0.15));

        let t = Thresholds::for_transactions(2, 0.5, 0.9);
        assert!(approx(t.min_support, 0.25));
        assert!(approx(t.min_confidence, 0.45));

        let t = Thresholds::for_transactions(5, 0.1, 0.3);
        assert!(!t.relaxed);
        assert_eq!(t.min_support, 0.1);
        assert_eq!(t.min_confidence, 0.3);
    }

    #[test]
    fn test_combinations() {
        assert_eq!(
            combinations(&[1, 4, 7], 2),
            vec![vec![1, 4], vec![1, 7], vec![4, 7]]
        );
        assert_eq!(combinations(&[1, 4, 7], 3), vec![vec![1, 4, 7]]);
        assert!(combinations(&[1], 2).is_empty());
    }

    #[test]
    fn test_two_bucket_scenario() {
        let m = matrix(&[&["A", "B"], &["C"]]);
        let result = mine(&m, 0.1, 0.3);

        assert!(result.error.is_none());
        assert_eq!(result.summary.total_transactions, 2);
        assert!(approx(result.summary.min_support, 0.05));
        assert!(approx(result.summary.min_confidence, 0.15));

        let sets: Vec<Vec<String>> = result.frequent_itemsets.iter().map(|f| f.items.clone()).collect();
        assert!(sets.contains(&vec!["A".to_string()]));
        assert!(sets.contains(&vec!["B".to_string()]));
        assert!(sets.contains(&vec!["C".to_string()]));
        assert!(sets.contains(&vec!["A".to_string(), "B".to_string()]));

        let a_to_b = result
            .rules
            .iter()
            .find(|r| r.antecedents == vec!["A"] && r.consequents == vec!["B"])
            .unwrap();
        assert!(approx(a_to_b.confidence, 1.0));
        assert!(approx(a_to_b.support, 0.5));
        assert!(approx(a_to_b.lift, 2.0));
        assert_eq!(a_to_b.conviction, None);
    }

    #[test]
    fn test_apriori_on_classic_baskets() {
        let result = mine(&baskets(), 0.6, 0.7);

        assert!(!result.summary.thresholds_relaxed);
        // 4 single items and 4 pairs; {bread, milk, diaper} has support 0.4
        assert_eq!(result.frequent_itemsets.len(), 8);
        assert!(result.frequent_itemsets.iter().all(|f| f.items.len() <= 2));
        assert_eq!(result.rules.len(), 8);

        let first = &result.rules[0];
        assert_eq!(first.antecedents, vec!["beer"]);
        assert_eq!(first.consequents, vec!["diaper"]);
        assert!(approx(first.confidence, 1.0));
        assert!(approx(first.lift, 1.25));

        let second = &result.rules[1];
        assert_eq!(second.antecedents, vec!["diaper"]);
        assert_eq!(second.consequents, vec!["beer"]);
        assert!(approx(second.confidence, 0.75));
        assert!(approx(second.leverage, 0.6 - 0.8 * 0.6));
        assert!(approx(second.conviction.unwrap(), (1.0 - 0.6) / 0.25));
    }

    #[test]
    fn test_multi_item_antecedents_are_generated() {
        let result = mine(&baskets(), 0.4, 0.5);
        assert!(result
            .rules
            .iter()
            .any(|r| r.antecedents.len() == 2 && r.consequents.len() == 1));
        assert!(result
            .rules
            .iter()
            .any(|r| r.antecedents.len() == 1 && r.consequents.len() == 2));
    }

    #[test]
    fn test_thresholds_hold_for_every_output() {
        for (support, confidence) in [(0.2, 0.3), (0.4, 0.6), (0.6, 0.9)] {
            let result = mine(&baskets(), support, confidence);
            for itemset in &result.frequent_itemsets {
                assert!(itemset.support >= result.summary.min_support);
            }
            for rule in &result.rules {
                assert!(rule.confidence >= result.summary.min_confidence);
            }
        }
    }

    #[test]
    fn test_rules_are_ordered_by_confidence_then_lift() {
        let result = mine(&baskets(), 0.2, 0.1);
        assert!(result.rules.len() > 10);
        for pair in result.rules.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(
                a.confidence > b.confidence || (a.confidence == b.confidence && a.lift >= b.lift)
            );
        }
    }

    #[test]
    fn test_empty_matrix_reports_no_data() {
        let result = mine(&TransactionMatrix::default(), 0.1, 0.3);
        let error = result.error.unwrap();
        assert_eq!(error.kind, ErrorKind::NoData);
        assert_eq!(error.message, "no transaction data");
        assert!(result.rules.is_empty());
        assert_eq!(result.summary.total_transactions, 0);
        assert!(approx(result.summary.min_support, 0.05));
    }

    #[test]
    fn test_strict_support_reports_no_frequent_itemsets() {
        let m = matrix(&[&["a"], &["b"], &["c"], &["d"], &["e"], &["f"]]);
        let result = mine(&m, 0.5, 0.3);
        let error = result.error.unwrap();
        assert_eq!(error.kind, ErrorKind::ThresholdTooStrict);
        assert_eq!(error.message, "no frequent itemsets");
        assert!(result.frequent_itemsets.is_empty());
        assert_eq!(result.summary.total_transactions, 6);
        assert_eq!(result.summary.total_products, 6);
    }

    #[test]
    fn test_top_products_by_frequency() {
        let result = mine(&baskets(), 0.6, 0.7);
        assert_eq!(
            result.summary.top_products,
            vec!["bread", "milk", "diaper", "beer", "cola"]
        );
    }

    #[test]
    fn test_bitsets_span_multiple_words() {
        let pair: &[&str] = &["x", "y"];
        let single: &[&str] = &["x"];
        let transactions: Vec<&[&str]> = (0..130)
            .map(|i| if i % 2 == 0 { pair } else { single })
            .collect();
        let result = mine(&matrix(&transactions), 0.4, 0.5);
        let pair = result
            .frequent_itemsets
            .iter()
            .find(|f| f.items.len() == 2)
            .unwrap();
        assert!(approx(pair.support, 0.5));
    }
}
