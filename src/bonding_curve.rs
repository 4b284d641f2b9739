//! Exponential bonding curve calculations.

use super::constants::{DEFAULT_GROWTH_RATE, DEFAULT_INITIAL_PRICE};
use super::errors::CurveError;

/// Constants defining the curve `price(supply) = initial_price * e^(growth_rate * supply)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveParameters {
    pub initial_price: f64,
    pub growth_rate: f64,
}

impl Default for CurveParameters {
    fn default() -> Self {
        Self {
            initial_price: DEFAULT_INITIAL_PRICE,
            growth_rate: DEFAULT_GROWTH_RATE,
        }
    }
}

/// A validated exponential curve.
///
/// Every method is a pure function of its arguments and the fixed parameters,
/// so a model can be copied freely between tasks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveModel {
    params: CurveParameters,
}

impl Default for CurveModel {
    fn default() -> Self {
        Self {
            params: CurveParameters::default(),
        }
    }
}

impl CurveModel {
    /// Builds a model, rejecting parameters that are not strictly positive and finite.
    pub fn new(params: CurveParameters) -> Result<Self, CurveError> {
        if !(params.initial_price.is_finite() && params.initial_price > 0.0) {
            return Err(CurveError::InvalidParameters(format!(
                "initial price must be positive, got {}",
                params.initial_price
            )));
        }
        if !(params.growth_rate.is_finite() && params.growth_rate > 0.0) {
            return Err(CurveError::InvalidParameters(format!(
                "growth rate must be positive, got {}",
                params.growth_rate
            )));
        }
        Ok(Self { params })
    }

    /// Unit price at `supply`.
    ///
    /// Callers clamp supply to `>= 0` before asking; the formula itself accepts any real.
    pub fn price(&self, supply: f64) -> f64 {
        self.params.initial_price * (self.params.growth_rate * supply).exp()
    }

    /// Inverse of [`CurveModel::price`]. The result is not rounded.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when `price` is not a positive finite number.
    pub fn supply_for_price(&self, price: f64) -> Result<f64, CurveError> {
        if !(price.is_finite() && price > 0.0) {
            return Err(CurveError::InvalidInput(format!(
                "price must be positive, got {}",
                price
            )));
        }
        Ok((price / self.params.initial_price).ln() / self.params.growth_rate)
    }

    /// Area under the curve from zero supply to `supply`, i.e. the USDC needed to
    /// mint an empty pool up to `supply` tokens.
    ///
    /// Integral(p0 * e^(k*x) dx) from 0 to s = (p0 / k) * (e^(k*s) - 1)
    pub fn total_funds(&self, supply: f64) -> f64 {
        // exp_m1 keeps precision for small k*s
        (self.params.initial_price / self.params.growth_rate)
            * (self.params.growth_rate * supply).exp_m1()
    }

    /// Inverse of [`CurveModel::total_funds`]: the supply whose pool holds `funds`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when `funds` is not finite or not above `-initial_price / growth_rate`,
    /// the limit of the pool size as supply goes to minus infinity.
    pub fn supply_for_total_funds(&self, funds: f64) -> Result<f64, CurveError> {
        let scaled = funds * self.params.growth_rate / self.params.initial_price;
        if !(scaled.is_finite() && scaled > -1.0) {
            return Err(CurveError::InvalidInput(format!(
                "no supply holds funds of {}",
                funds
            )));
        }
        Ok(scaled.ln_1p() / self.params.growth_rate)
    }

    /// Signed cash flow for moving from `from_supply` to `from_supply + delta`.
    ///
    /// Positive is the cost of a mint, negative the refund of a burn.
    pub fn trade_funds(&self, from_supply: f64, delta: f64) -> f64 {
        self.total_funds(from_supply + delta) - self.total_funds(from_supply)
    }
}
