use serde::Serialize;

use crate::error::QueryError;

/// An item set whose support met the mining threshold
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FrequentItemset {
    pub items: Vec<String>,
    /// Fraction of transactions containing every item
    pub support: f64,
}

/// Directional association `antecedents → consequents`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssociationRule {
    pub antecedents: Vec<String>,
    pub consequents: Vec<String>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support of the union of both sides
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// `None` when confidence is 1 (infinite conviction)
    pub conviction: Option<f64>,
}

impl AssociationRule {
    pub fn has_antecedent(&self, item: &str) -> bool {
        self.antecedents.iter().any(|a| a == item)
    }

    pub fn has_consequent(&self, item: &str) -> bool {
        self.consequents.iter().any(|c| c == item)
    }
}

/// Counts and thresholds reported with every mining run
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MiningSummary {
    pub total_transactions: usize,
    pub total_products: usize,
    pub frequent_itemsets_count: usize,
    pub rules_count: usize,
    /// Thresholds actually used, after any relaxation
    pub min_support: f64,
    pub min_confidence: f64,
    pub thresholds_relaxed: bool,
    /// Up to five products ordered by transaction frequency
    pub top_products: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MiningResult {
    pub frequent_itemsets: Vec<FrequentItemset>,
    /// Sorted by confidence desc, then lift desc
    pub rules: Vec<AssociationRule>,
    pub summary: MiningSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

/// Which recommender tier produced a suggestion
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleMatch {
    /// The queried product is in the rule's antecedents
    Direct,
    /// General co-occurrence used because no direct rule exists
    Fallback,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Recommendation {
    pub product: String,
    pub confidence: f64,
    pub lift: f64,
    pub support: f64,
    #[serde(rename = "rule")]
    pub rule_label: String,
    pub source: RuleMatch,
}
