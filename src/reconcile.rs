//! Mint/burn reconciliation.
//!
//! A [`CurveState`] holds the four displayed quantities (supply, delta, new
//! supply, funds) and is only ever produced whole, by [`CurveState::new`] or
//! [`CurveModel::reconcile`]. Its fields are private so no caller can update
//! one without the others.

use super::bonding_curve::CurveModel;
use super::errors::CurveError;

/// The one input a user changed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveInput {
    Supply(f64),
    Delta(f64),
    Price(f64),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveState {
    current_supply: f64,
    delta: f64,
    new_supply: f64,
    total_funds: f64,
    trade_funds: f64,
    is_burn: bool,
}

impl CurveState {
    /// Derives a consistent state from a supply and a signed delta.
    ///
    /// `current_supply` is clamped to `>= 0`; `new_supply` is
    /// `max(current_supply + delta, 0)`. Funds are computed against the clamped
    /// supplies, so a burn larger than the supply refunds exactly `total_funds(current_supply)`.
    pub fn new(model: &CurveModel, current_supply: f64, delta: f64) -> Result<Self, CurveError> {
        require_finite("supply", current_supply)?;
        require_finite("delta", delta)?;

        let current_supply = current_supply.max(0.0);
        let new_supply = (current_supply + delta).max(0.0);
        let total_funds = model.total_funds(new_supply);
        // Same as trade_funds(current_supply, new_supply - current_supply), without re-adding the delta
        let trade_funds = total_funds - model.total_funds(current_supply);

        if !total_funds.is_finite() || !trade_funds.is_finite() {
            return Err(CurveError::InvalidInput(format!(
                "supply {} with delta {} is outside the representable range",
                current_supply, delta
            )));
        }

        Ok(Self {
            current_supply,
            delta,
            new_supply,
            total_funds,
            trade_funds,
            is_burn: delta < 0.0,
        })
    }

    pub fn current_supply(&self) -> f64 {
        self.current_supply
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn new_supply(&self) -> f64 {
        self.new_supply
    }

    /// Funds locked in the curve at `new_supply`.
    pub fn total_funds(&self) -> f64 {
        self.total_funds
    }

    /// Signed cost (mint) or refund (burn) of moving from `current_supply` to `new_supply`.
    pub fn trade_funds(&self) -> f64 {
        self.trade_funds
    }

    pub fn is_burn(&self) -> bool {
        self.is_burn
    }
}

impl CurveModel {
    /// Applies one changed input to `state` and returns the recomputed state.
    ///
    /// On error the caller keeps `state`; nothing is partially applied.
    pub fn reconcile(&self, state: &CurveState, input: CurveInput) -> Result<CurveState, CurveError> {
        match input {
            CurveInput::Supply(supply) => CurveState::new(self, supply, state.delta),
            CurveInput::Delta(delta) => CurveState::new(self, state.current_supply, delta),
            CurveInput::Price(price) => {
                let supply = self.supply_for_price(price)?.round();
                CurveState::new(self, supply, state.delta)
            }
        }
    }
}

fn require_finite(name: &str, value: f64) -> Result<(), CurveError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CurveError::InvalidInput(format!("{} must be a finite number, got {}", name, value)))
    }
}
