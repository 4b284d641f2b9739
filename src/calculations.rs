use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use super::bonding_curve::CurveModel;
use super::constants::{MAX_DISPLAY_AMOUNT, SUPPLY_DECIMALS, USDC_DECIMALS};
use super::errors::CurveError;
use super::models::CurveSnapshot;
use super::reconcile::CurveState;

// --- Display Helpers ---

/// Converts a float to a `Decimal` rounded to `decimals` places.
///
/// Fails for NaN, infinities and magnitudes `Decimal` cannot hold.
pub fn to_display_decimal(value: f64, decimals: u32) -> Result<Decimal, CurveError> {
    Decimal::from_f64(value)
        .map(|d| d.round_dp(decimals).normalize())
        .ok_or_else(|| CurveError::InvalidInput(format!("{} cannot be displayed", value)))
}

/// Largest whole-token supply whose price and pool size stay within [`MAX_DISPLAY_AMOUNT`].
pub fn max_display_supply(model: &CurveModel) -> Result<f64, CurveError> {
    let by_price = model.supply_for_price(MAX_DISPLAY_AMOUNT)?;
    let by_funds = model.supply_for_total_funds(MAX_DISPLAY_AMOUNT)?;
    Ok(by_price.min(by_funds).floor())
}

/// Display form of `state`.
///
/// States beyond [`max_display_supply`] are rejected with a message naming the
/// limit, so the caller can keep the previous state.
pub fn build_snapshot(model: &CurveModel, state: &CurveState) -> Result<CurveSnapshot, CurveError> {
    let limit = max_display_supply(model)?;
    for (name, supply) in [("supply", state.current_supply()), ("new supply", state.new_supply())] {
        if supply > limit {
            return Err(CurveError::InvalidInput(format!(
                "{} exceeds the largest displayable supply of {} tokens",
                name, limit
            )));
        }
    }
    if state.delta().abs() > MAX_DISPLAY_AMOUNT {
        return Err(CurveError::InvalidInput(format!(
            "delta exceeds the largest displayable amount of {:e} tokens",
            MAX_DISPLAY_AMOUNT
        )));
    }

    Ok(CurveSnapshot {
        current_supply: to_display_decimal(state.current_supply(), SUPPLY_DECIMALS)?,
        delta: to_display_decimal(state.delta(), SUPPLY_DECIMALS)?,
        new_supply: to_display_decimal(state.new_supply(), SUPPLY_DECIMALS)?,
        current_price: to_display_decimal(model.price(state.current_supply()), USDC_DECIMALS)?,
        new_price: to_display_decimal(model.price(state.new_supply()), USDC_DECIMALS)?,
        total_funds: to_display_decimal(state.total_funds(), USDC_DECIMALS)?,
        trade_funds: to_display_decimal(state.trade_funds(), USDC_DECIMALS)?,
        is_burn: state.is_burn(),
    })
}
