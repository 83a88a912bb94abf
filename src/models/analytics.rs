use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::QueryError;

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

/// Click and price statistics for one product
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProductStats {
    pub product_name: String,
    pub clicks: usize,
    /// Distinct categories in first-seen order
    pub categories: Vec<String>,
    /// Over positive prices only; 0 when the product was never priced
    pub average_price: f64,
    pub price_range: PriceRange,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct PriceStatistics {
    pub average: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct AnalyticsResult {
    pub total_products: usize,
    pub total_clicks: usize,
    /// Sorted by clicks desc, ties in first-seen order
    pub top_products: Vec<ProductStats>,
    pub category_distribution: BTreeMap<String, usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_statistics: Option<PriceStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<QueryError>,
}
