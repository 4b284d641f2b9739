use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// --- JWT & Auth Types ---

// Claims expected in a session token
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub exp: usize, // Expiration time
}

// --- Display Models ---

/// A [`crate::reconcile::CurveState`] rounded for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSnapshot {
    pub current_supply: Decimal,
    pub delta: Decimal,
    pub new_supply: Decimal,
    pub current_price: Decimal,
    pub new_price: Decimal,
    pub total_funds: Decimal,
    pub trade_funds: Decimal,
    pub is_burn: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub supply: f64,
    pub price: f64,
}

/// Which way the impact area is shaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Mint,
    Burn,
    Hold,
}

// Everything a chart needs to redraw one state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartFrame {
    pub curve: Vec<ChartPoint>,
    pub impact_area: Vec<ChartPoint>,
    pub current_marker: ChartPoint,
    pub new_marker: ChartPoint,
    pub direction: Direction,
}
