use chrono::{DateTime, Utc};
use serde::Serialize;

/// One parsed product entry, shaped for the roulette front end. `price` and
/// `price_numeric` carry the same value; the legacy consumer reads both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub rank: u32,
    pub name: String,
    pub price: u32,
    pub price_numeric: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_price: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    pub rating: f64,
    pub reviews: u64,
    pub category: String,
    pub category_name: String,
}

#[derive(Debug, Serialize)]
pub struct Meta {
    pub title: String,
    pub category: String,
    pub total_products: usize,
    pub parsed_at: DateTime<Utc>,
    pub parser_version: String,
}

/// The one durable artifact: meta envelope plus the ranked product array.
/// The timestamp lives only in `meta`, so the array itself is stable across
/// repeated parses of the same text.
#[derive(Debug, Serialize)]
pub struct RankingDocument {
    pub meta: Meta,
    pub products: Vec<Listing>,
}

impl RankingDocument {
    pub fn new(title: &str, category: &str, products: Vec<Listing>) -> Self {
        RankingDocument {
            meta: Meta {
                title: title.to_string(),
                category: category.to_string(),
                total_products: products.len(),
                parsed_at: Utc::now(),
                parser_version: env!("CARGO_PKG_VERSION").to_string(),
            },
            products,
        }
    }
}
