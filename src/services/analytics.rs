use std::collections::{BTreeMap, HashMap};

use crate::models::{AnalyticsResult, ClickEvent, PriceRange, PriceStatistics, ProductStats};

const TOP_PRODUCTS: usize = 10;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Default)]
struct Accumulator {
    clicks: usize,
    categories: Vec<String>,
    prices: Vec<f64>,
}

/// Per-product click and price statistics straight from the event log.
///
/// Zero (or negative) prices count as clicks but are excluded from every price
/// figure. Window size plays no part here.
pub fn aggregate(events: &[ClickEvent]) -> AnalyticsResult {
    let mut order: Vec<&str> = Vec::new();
    let mut products: HashMap<&str, Accumulator> = HashMap::new();
    let mut category_distribution: BTreeMap<String, usize> = BTreeMap::new();
    let mut all_prices: Vec<f64> = Vec::new();

    for event in events {
        let name = event.product_name.as_str();
        let stats = products.entry(name).or_insert_with(|| {
            order.push(name);
            Accumulator::default()
        });

        stats.clicks += 1;
        if !stats.categories.contains(&event.category) {
            stats.categories.push(event.category.clone());
        }
        *category_distribution.entry(event.category.clone()).or_insert(0) += 1;

        if event.price > 0.0 {
            stats.prices.push(event.price);
            all_prices.push(event.price);
        }
    }

    let mut top_products: Vec<ProductStats> = order
        .iter()
        .filter_map(|name| products.remove(name).map(|acc| (*name, acc)))
        .map(|(name, acc)| {
            let (average, range) = price_summary(&acc.prices)
                .map(|s| (s.average, PriceRange { min: s.min, max: s.max }))
                .unwrap_or_default();
            ProductStats {
                product_name: name.to_string(),
                clicks: acc.clicks,
                categories: acc.categories,
                average_price: average,
                price_range: range,
            }
        })
        .collect();

    let total_products = top_products.len();
    top_products.sort_by(|a, b| b.clicks.cmp(&a.clicks));
    top_products.truncate(TOP_PRODUCTS);

    tracing::info!(
        products = total_products,
        clicks = events.len(),
        "Product analytics computed"
    );

    AnalyticsResult {
        total_products,
        total_clicks: events.len(),
        top_products,
        category_distribution,
        price_statistics: price_summary(&all_prices),
        message: None,
        error: None,
    }
}

fn price_summary(prices: &[f64]) -> Option<PriceStatistics> {
    if prices.is_empty() {
        return None;
    }
    let sum: f64 = prices.iter().sum();
    Some(PriceStatistics {
        average: round2(sum / prices.len() as f64),
        min: prices.iter().copied().fold(f64::INFINITY, f64::min),
        max: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        count: prices.len(),
    })
}
