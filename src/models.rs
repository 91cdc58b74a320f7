// src/models.rs
use serde::{Deserialize, Serialize};

/// Placeholder for a raw field that could not be read from the page.
pub const UNKNOWN: &str = "Unknown";

/// Column order shared by the raw file, the cleaned file and the store.
pub const HEADER: [&str; 4] = ["Name", "Price", "Rating", "Reviews"];

/// One listing as captured from the search-results page. Every field is
/// free text; unreadable fields hold [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Rating")]
    pub rating: String,
    #[serde(rename = "Reviews")]
    pub reviews: String,
}

impl RawRecord {
    pub fn new(
        name: impl Into<String>,
        price: impl Into<String>,
        rating: impl Into<String>,
        reviews: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            price: price.into(),
            rating: rating.into(),
            reviews: reviews.into(),
        }
    }

    pub fn fields(&self) -> [&str; 4] {
        [&self.name, &self.price, &self.rating, &self.reviews]
    }
}

/// A normalized listing. `None` is the missing marker; numbers are always finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Price")]
    pub price: Option<f64>,
    #[serde(rename = "Rating")]
    pub rating: Option<f64>,
    #[serde(rename = "Reviews")]
    pub reviews: Option<i64>,
}

/// Hashable identity of a clean row, used for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CleanKey(String, Option<u64>, Option<u64>, Option<i64>);

impl CleanRecord {
    pub fn key(&self) -> CleanKey {
        // -0.0 and 0.0 compare equal, so they must share a key
        let bits = |v: f64| if v == 0.0 { 0u64 } else { v.to_bits() };
        CleanKey(
            self.name.clone(),
            self.price.map(bits),
            self.rating.map(bits),
            self.reviews,
        )
    }
}

pub type RawTable = Vec<RawRecord>;
pub type CleanTable = Vec<CleanRecord>;
