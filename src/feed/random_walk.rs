//! Synthetic price source: a bounded random walk per symbol.

use super::{FeedError, PriceFeed};
use crate::domain::{Decimal, PriceTick, Symbol, TimeMs};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug)]
struct WalkState {
    rng: StdRng,
    last: HashMap<Symbol, Decimal>,
}

/// Each fetch moves the previous price by a uniform step in
/// `[-step, +step]`, rounded to cents and floored at one cent.
#[derive(Debug)]
pub struct RandomWalkFeed {
    start: Decimal,
    step_cents: i64,
    state: Mutex<WalkState>,
}

impl RandomWalkFeed {
    pub const DEFAULT_START: i64 = 68_000;
    pub const DEFAULT_STEP: i64 = 50;

    pub fn new(start: Decimal, step: Decimal) -> Self {
        Self::with_rng(start, step, StdRng::from_entropy())
    }

    /// Deterministic walk for tests and replays.
    pub fn with_seed(start: Decimal, step: Decimal, seed: u64) -> Self {
        Self::with_rng(start, step, StdRng::seed_from_u64(seed))
    }

    fn with_rng(start: Decimal, step: Decimal, rng: StdRng) -> Self {
        let step_cents = (step.abs().inner() * rust_decimal::Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .unwrap_or(0);
        Self {
            start: start.round_dp(2).max(Self::floor()),
            step_cents,
            state: Mutex::new(WalkState {
                rng,
                last: HashMap::new(),
            }),
        }
    }

    fn floor() -> Decimal {
        Decimal::from_scaled(1, 2)
    }

    fn next_price(&self, symbol: &Symbol) -> Result<Decimal, FeedError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| FeedError::Other("random walk state poisoned".to_string()))?;

        let last = state.last.get(symbol).copied().unwrap_or(self.start);
        let delta = if self.step_cents > 0 {
            state.rng.gen_range(-self.step_cents..=self.step_cents)
        } else {
            0
        };
        let next = (last + Decimal::from_scaled(delta, 2)).max(Self::floor());
        state.last.insert(symbol.clone(), next);
        Ok(next)
    }
}

impl Default for RandomWalkFeed {
    fn default() -> Self {
        Self::new(
            Decimal::from(Self::DEFAULT_START),
            Decimal::from(Self::DEFAULT_STEP),
        )
    }
}

#[async_trait]
impl PriceFeed for RandomWalkFeed {
    async fn fetch_price(&self, symbol: &Symbol) -> Result<Option<PriceTick>, FeedError> {
        let price = self.next_price(symbol)?;
        Ok(Some(PriceTick::new(symbol.clone(), TimeMs::now(), price)))
    }
}
