use std::collections::HashMap;

use crate::models::{
    ClickEvent, EventTimestamp, GroupProduct, TransactionGroup, TransactionMatrix, TransactionSet,
};

/// Group id used for events without a usable timestamp
pub const UNKNOWN_GROUP: &str = "unknown";

/// Bucket key for a click: the timestamp with its second truncated to the window
pub fn group_id(timestamp: Option<&EventTimestamp>, window_seconds: u32) -> String {
    let window = window_seconds.max(1);
    match timestamp {
        Some(ts) => {
            let bucket = (ts.second / window) * window;
            format!(
                "{}-{:02}-{:02}_{:02}-{:02}-{:02}",
                ts.year, ts.month, ts.day, ts.hour, ts.minute, bucket
            )
        }
        None => UNKNOWN_GROUP.to_string(),
    }
}

/// Groups raw clicks into time-window transactions
///
/// Events are bucketed by [`group_id`], products are deduplicated per bucket
/// (first occurrence keeps its category and price), empty buckets are dropped,
/// and the surviving buckets become the rows of a boolean presence matrix whose
/// columns are every product seen, in first-seen order.
///
/// Fewer than two groups is not an error here; the miner reports it.
pub fn build(events: &[ClickEvent], window_seconds: u32) -> TransactionSet {
    let window = window_seconds.max(1);
    let mut groups: Vec<TransactionGroup> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for event in events {
        let id = group_id(event.timestamp.as_ref(), window);
        let index = *group_index.entry(id.clone()).or_insert_with(|| {
            groups.push(TransactionGroup {
                group_id: id,
                products: Vec::new(),
                total_events: 0,
                unique_products: 0,
                time_window: window,
            });
            groups.len() - 1
        });

        let group = &mut groups[index];
        group.total_events += 1;
        if !group.contains(&event.product_name) {
            group.products.push(GroupProduct {
                product_name: event.product_name.clone(),
                category: event.category.clone(),
                price: event.price,
            });
            group.unique_products = group.products.len();
        }
    }

    groups.retain(|g| !g.products.is_empty());

    if groups.len() < 2 {
        tracing::warn!(groups = groups.len(), "Not enough groups for meaningful mining");
    }

    let matrix = to_matrix(&groups);

    tracing::info!(
        window_seconds = window,
        groups = groups.len(),
        transactions = matrix.len(),
        products = matrix.item_count(),
        "Transaction data prepared"
    );

    TransactionSet { matrix, groups }
}

fn to_matrix(groups: &[TransactionGroup]) -> TransactionMatrix {
    let mut items: Vec<String> = Vec::new();
    let mut columns: HashMap<&str, usize> = HashMap::new();

    for group in groups {
        for name in group.product_names() {
            if !columns.contains_key(name) {
                columns.insert(name, items.len());
                items.push(name.to_string());
            }
        }
    }

    let rows = groups
        .iter()
        .map(|group| {
            let mut row = vec![false; items.len()];
            for name in group.product_names() {
                if let Some(&column) = columns.get(name) {
                    row[column] = true;
                }
            }
            row
        })
        .collect();

    let transaction_ids = (1..=groups.len()).map(|i| format!("group_{}", i)).collect();

    TransactionMatrix {
        transaction_ids,
        items,
        rows,
    }
}
