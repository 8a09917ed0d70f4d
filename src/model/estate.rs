use serde::{Deserialize, Serialize};

/// A vineyard parcel. Seizable collateral: forced sales remove the record
/// from the game state entirely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vineyard {
    pub id: u64,
    pub name: String,
    pub hectares: f64,
    /// Current market value of the whole parcel.
    pub value: f64,
}

/// A bottled lot in the cellar. Partial sales reduce `bottles`; a batch at
/// zero bottles is removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WineBatch {
    pub id: u64,
    pub label: String,
    pub vintage_year: u32,
    pub bottles: u32,
    pub price_per_bottle: f64,
}

impl WineBatch {
    pub fn value(&self) -> f64 {
        self.bottles as f64 * self.price_per_bottle
    }
}
