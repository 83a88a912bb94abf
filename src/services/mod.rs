pub mod analytics;
pub mod mining;
pub mod queries;
pub mod recommender;
pub mod transactions;

pub use queries::{group_info, product_analytics, recommend_products};
