//! Chart data for a curve state.
//!
//! Nothing here draws. A [`ChartFrame`] is the data a plotting front end needs
//! for one redraw: the sampled curve, the shaded impact area between the
//! current and new supply, and the two markers.

use super::bonding_curve::CurveModel;
use super::constants::{
    DEFAULT_CHART_MAX_SUPPLY, DEFAULT_CHART_MIN_SUPPLY, DEFAULT_CHART_SAMPLE_MAX, DEFAULT_CHART_SAMPLE_STEP,
};
use super::errors::CurveError;
use super::models::{ChartFrame, ChartPoint, Direction};
use super::reconcile::CurveState;

/// Visible supply range and sampling of the plotted curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotWindow {
    pub min_supply: f64,
    pub max_supply: f64,
    /// Last sampled supply (samples run `0..=sample_max`).
    pub sample_max: u32,
    pub sample_step: u32,
}

impl Default for PlotWindow {
    fn default() -> Self {
        Self {
            min_supply: DEFAULT_CHART_MIN_SUPPLY,
            max_supply: DEFAULT_CHART_MAX_SUPPLY,
            sample_max: DEFAULT_CHART_SAMPLE_MAX,
            sample_step: DEFAULT_CHART_SAMPLE_STEP,
        }
    }
}

impl PlotWindow {
    /// Maps a horizontal pointer offset on a plot `width_px` wide to the
    /// nearest whole-token supply.
    pub fn supply_at_offset(&self, offset_x: f64, width_px: f64) -> Result<f64, CurveError> {
        if !(width_px.is_finite() && width_px > 0.0) {
            return Err(CurveError::InvalidInput(format!("plot width must be positive, got {}", width_px)));
        }
        if !offset_x.is_finite() {
            return Err(CurveError::InvalidInput(format!("pointer offset must be finite, got {}", offset_x)));
        }
        let fraction = offset_x / width_px;
        let supply = self.min_supply + fraction * (self.max_supply - self.min_supply);
        Ok(supply.round())
    }

    fn sample_supplies(&self) -> impl Iterator<Item = f64> {
        let step = self.sample_step.max(1) as usize;
        (0..=self.sample_max).step_by(step).map(f64::from)
    }
}

pub fn render_frame(model: &CurveModel, state: &CurveState, window: &PlotWindow) -> ChartFrame {
    let current = state.current_supply();
    let new = state.new_supply();
    let (low, high) = if current <= new { (current, new) } else { (new, current) };

    let point = |supply: f64| ChartPoint {
        supply,
        price: model.price(supply),
    };

    let curve: Vec<ChartPoint> = window.sample_supplies().map(point).collect();

    // Endpoints are added explicitly so fractional supplies still close the area
    let mut impact_area = Vec::new();
    if high > low {
        impact_area.push(point(low));
        impact_area.extend(curve.iter().copied().filter(|p| p.supply > low && p.supply < high));
        impact_area.push(point(high));
    }

    let direction = if new > current {
        Direction::Mint
    } else if new < current {
        Direction::Burn
    } else {
        Direction::Hold
    };

    ChartFrame {
        curve,
        impact_area,
        current_marker: point(current),
        new_marker: point(new),
        direction,
    }
}
