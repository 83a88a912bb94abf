use serde::Serialize;

use crate::{
    error::{AppError, AppResult, QueryError},
    models::{MiningSummary, Recommendation, TransactionGroup},
};

/// Tuning knobs for a recommendation query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendParams {
    pub min_support: f64,
    pub min_confidence: f64,
    pub max_recommendations: usize,
    pub window_seconds: u32,
}

impl Default for RecommendParams {
    fn default() -> Self {
        Self {
            min_support: 0.1,
            min_confidence: 0.3,
            max_recommendations: 5,
            window_seconds: 5,
        }
    }
}

impl RecommendParams {
    pub fn validate(&self) -> AppResult<()> {
        if !(self.min_support > 0.0 && self.min_support <= 1.0) {
            return Err(AppError::InvalidInput(format!(
                "min_support must be in (0, 1], got {}",
                self.min_support
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(AppError::InvalidInput(format!(
                "min_confidence must be in [0, 1], got {}",
                self.min_confidence
            )));
        }
        validate_window(self.window_seconds)
    }
}

pub fn validate_window(window_seconds: u32) -> AppResult<()> {
    if window_seconds == 0 {
        return Err(AppError::InvalidInput(
            "window_seconds must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Response of a recommendation query
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendationResult {
    pub product_name: String,
    pub recommendations: Vec<Recommendation>,
    pub total_recommendations: usize,
    /// Confidence threshold as requested, before any relaxation
    pub min_confidence: f64,
    pub window_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub learning_groups: Vec<TransactionGroup>,
    pub summary: MiningSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}

/// One time group as shown by the group-info query
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupView {
    pub group_id: String,
    pub group_type: &'static str,
    pub product_count: usize,
    pub products: Vec<String>,
    /// Distinct, sorted
    pub categories: Vec<String>,
}

impl From<&TransactionGroup> for GroupView {
    fn from(group: &TransactionGroup) -> Self {
        let mut categories: Vec<String> = group.products.iter().map(|p| p.category.clone()).collect();
        categories.sort();
        categories.dedup();
        Self {
            group_id: group.group_id.clone(),
            group_type: "time",
            product_count: group.products.len(),
            products: group.product_names().map(str::to_string).collect(),
            categories,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct GroupTypes {
    pub session_groups: usize,
    pub time_groups: usize,
    pub total_groups: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct GroupTotals {
    pub total_transactions: usize,
    pub total_products: usize,
}

/// Response of the group-info query
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GroupSummary {
    pub total_groups: usize,
    pub window_seconds: u32,
    pub groups: Vec<GroupView>,
    pub group_types: GroupTypes,
    pub summary: GroupTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}
