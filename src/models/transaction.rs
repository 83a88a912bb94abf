use serde::Serialize;

/// A product as first seen inside a transaction group
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupProduct {
    pub product_name: String,
    pub category: String,
    pub price: f64,
}

/// Distinct products clicked within one time bucket
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransactionGroup {
    pub group_id: String,
    /// Deduplicated by product name, first occurrence wins
    pub products: Vec<GroupProduct>,
    /// Number of raw events in the bucket, duplicates included
    pub total_events: usize,
    pub unique_products: usize,
    pub time_window: u32,
}

impl TransactionGroup {
    pub fn product_names(&self) -> impl Iterator<Item = &str> {
        self.products.iter().map(|p| p.product_name.as_str())
    }

    pub fn contains(&self, product_name: &str) -> bool {
        self.products.iter().any(|p| p.product_name == product_name)
    }
}

/// Boolean item-presence matrix: one row per transaction, one column per product
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TransactionMatrix {
    /// Synthetic `group_N` ids, one per row
    pub transaction_ids: Vec<String>,
    /// Product names in first-seen order
    pub items: Vec<String>,
    pub rows: Vec<Vec<bool>>,
}

impl TransactionMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .copied()
            .unwrap_or(false)
    }

    /// Number of transactions containing each column's product
    pub fn column_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.items.len()];
        for row in &self.rows {
            for (count, present) in counts.iter_mut().zip(row) {
                if *present {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Product names present in a row
    pub fn transaction_items(&self, row: usize) -> Vec<&str> {
        self.rows
            .get(row)
            .map(|cells| {
                cells
                    .iter()
                    .zip(&self.items)
                    .filter(|(present, _)| **present)
                    .map(|(_, item)| item.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Output of the transaction builder: the matrix plus per-group metadata
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct TransactionSet {
    pub matrix: TransactionMatrix,
    pub groups: Vec<TransactionGroup>,
}
