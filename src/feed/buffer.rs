use crate::domain::{Decimal, PriceTick};
use std::collections::VecDeque;

/// Bounded, chronological price history for one instrument.
#[derive(Debug, Clone)]
pub struct PriceBuffer {
    ticks: VecDeque<PriceTick>,
    capacity: usize,
    stale: bool,
    last_error: Option<String>,
}

impl PriceBuffer {
    pub const DEFAULT_CAPACITY: usize = 500;

    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            ticks: VecDeque::with_capacity(capacity),
            capacity,
            stale: false,
            last_error: None,
        }
    }

    /// Append a tick, evicting the oldest when full. Returns false for
    /// non-positive prices, which are dropped.
    pub fn push(&mut self, tick: PriceTick) -> bool {
        if !tick.price.is_positive() {
            return false;
        }
        if self.ticks.len() == self.capacity {
            self.ticks.pop_front();
        }
        self.ticks.push_back(tick);
        self.stale = false;
        self.last_error = None;
        true
    }

    /// Flag the history as stale until the next accepted tick.
    pub fn mark_stale(&mut self, reason: impl Into<String>) {
        self.stale = true;
        self.last_error = Some(reason.into());
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn latest(&self) -> Option<&PriceTick> {
        self.ticks.back()
    }

    pub fn latest_price(&self) -> Option<Decimal> {
        self.latest().map(|t| t.price)
    }

    /// The last `n` ticks, oldest first.
    pub fn last_n(&self, n: usize) -> Vec<PriceTick> {
        let start = self.ticks.len().saturating_sub(n);
        self.ticks.iter().skip(start).cloned().collect()
    }

    /// The last `n` prices, oldest first.
    pub fn last_n_prices(&self, n: usize) -> Vec<Decimal> {
        let start = self.ticks.len().saturating_sub(n);
        self.ticks.iter().skip(start).map(|t| t.price).collect()
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PriceBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Symbol, TimeMs};

    fn tick(ms: i64, px: i64) -> PriceTick {
        PriceTick::new(
            Symbol::new("BTC-USD".to_string()),
            TimeMs::new(ms),
            Decimal::from(px),
        )
    }

    #[test]
    fn test_evicts_oldest_at_capacity() {
        let mut buffer = PriceBuffer::new(3);
        for i in 0..5 {
            assert!(buffer.push(tick(i, 100 + i)));
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(
            buffer.last_n_prices(10),
            vec![Decimal::from(102), Decimal::from(103), Decimal::from(104)]
        );
        assert_eq!(buffer.latest_price(), Some(Decimal::from(104)));
    }

    #[test]
    fn test_rejects_non_positive_prices() {
        let mut buffer = PriceBuffer::new(3);
        assert!(!buffer.push(tick(1, 0)));
        assert!(!buffer.push(tick(2, -5)));
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_stale_flag_cleared_by_next_tick() {
        let mut buffer = PriceBuffer::new(3);
        buffer.push(tick(1, 100));
        buffer.mark_stale("Timed out");
        assert!(buffer.is_stale());
        assert_eq!(buffer.last_error(), Some("Timed out"));
        // Last known price survives a stale cycle.
        assert_eq!(buffer.latest_price(), Some(Decimal::from(100)));

        buffer.push(tick(2, 101));
        assert!(!buffer.is_stale());
        assert_eq!(buffer.last_error(), None);
    }

    #[test]
    fn test_last_n_ticks() {
        let mut buffer = PriceBuffer::default();
        buffer.push(tick(1, 100));
        buffer.push(tick(2, 101));
        let ticks = buffer.last_n(1);
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].time_ms, TimeMs::new(2));
        assert_eq!(buffer.capacity(), PriceBuffer::DEFAULT_CAPACITY);
    }
}
