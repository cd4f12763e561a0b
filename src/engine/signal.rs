//! Display-only trend hint computed from recent prices.
//!
//! The output is never consulted by order intake.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalDirection {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMethod {
    /// Sign of the least-squares slope of price against tick index.
    #[default]
    Slope,
    /// Latest price against the simple mean of the window.
    MovingAverage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signal {
    pub direction: SignalDirection,
    pub method: SignalMethod,
    /// Slope, or latest-minus-mean, depending on `method`. None while warming up.
    pub statistic: Option<Decimal>,
    pub samples: usize,
    pub insufficient_data: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalHeuristic {
    window: usize,
    method: SignalMethod,
}

impl SignalHeuristic {
    pub const DEFAULT_WINDOW: usize = 10;

    /// Windows shorter than two prices carry no trend and are widened to two.
    pub fn new(window: usize, method: SignalMethod) -> Self {
        Self {
            window: window.max(2),
            method,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn method(&self) -> SignalMethod {
        self.method
    }

    /// Evaluate the last `window` prices of `prices` (oldest first).
    pub fn evaluate(&self, prices: &[Decimal]) -> Signal {
        if prices.len() < self.window {
            return Signal {
                direction: SignalDirection::Hold,
                method: self.method,
                statistic: None,
                samples: prices.len(),
                insufficient_data: true,
            };
        }

        let recent = &prices[prices.len() - self.window..];
        let statistic = match self.method {
            SignalMethod::Slope => ols_slope(recent),
            SignalMethod::MovingAverage => latest_minus_mean(recent),
        };

        let direction = if statistic.is_positive() {
            SignalDirection::Buy
        } else if statistic.is_negative() {
            SignalDirection::Sell
        } else {
            SignalDirection::Hold
        };

        Signal {
            direction,
            method: self.method,
            statistic: Some(statistic),
            samples: recent.len(),
            insufficient_data: false,
        }
    }
}

impl Default for SignalHeuristic {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW, SignalMethod::Slope)
    }
}

/// Ordinary least-squares slope of `prices` against indices `0..n`.
///
/// Uses `Σ(x - x̄)·y / Σ(x - x̄)²`; since `Σ(x - x̄) = 0` the price mean drops
/// out and a constant series yields exactly zero.
pub fn ols_slope(prices: &[Decimal]) -> Decimal {
    let n = prices.len();
    if n < 2 {
        return Decimal::zero();
    }

    let x_mean = Decimal::from((n - 1) as i64) / Decimal::from(2);
    let mut sxy = Decimal::zero();
    let mut sxx = Decimal::zero();
    for (i, price) in prices.iter().enumerate() {
        let dx = Decimal::from(i as i64) - x_mean;
        sxy += dx * *price;
        sxx += dx * dx;
    }

    sxy / sxx
}

fn latest_minus_mean(prices: &[Decimal]) -> Decimal {
    let Some(latest) = prices.last() else {
        return Decimal::zero();
    };
    let mean = prices.iter().copied().sum::<Decimal>() / Decimal::from(prices.len() as i64);
    *latest - mean
}
