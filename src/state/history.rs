use std::collections::VecDeque;

use chrono::{Local, TimeZone};
use rust_decimal::Decimal;

/// How many oracle points the live chart keeps.
pub const MAX_POINTS: usize = 60;

/// One oracle observation.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    /// Observation time, Unix milliseconds
    pub at_ms: i64,
    pub price: Decimal,
}

impl PricePoint {
    /// "HH:MM" label in local time, as the chart axis shows it.
    pub fn time_label(&self) -> String {
        match Local.timestamp_millis_opt(self.at_ms).single() {
            Some(t) => t.format("%H:%M").to_string(),
            None => String::from("--:--"),
        }
    }
}

/// Rolling window of oracle prices for the live chart.
/// Display only; nothing in the market logic reads it.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    points: VecDeque<PricePoint>,
}

impl PriceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point, dropping the oldest beyond `MAX_POINTS`.
    pub fn push(&mut self, at_ms: i64, price: Decimal) {
        self.points.push_back(PricePoint { at_ms, price });
        while self.points.len() > MAX_POINTS {
            self.points.pop_front();
        }
    }

    pub fn latest(&self) -> Option<Decimal> {
        self.points.back().map(|p| p.price)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &PricePoint> {
        self.points.iter()
    }

    /// Percent change from the oldest kept point to the latest.
    /// Zero with fewer than two points.
    pub fn change_pct(&self) -> Decimal {
        if self.points.len() < 2 {
            return Decimal::ZERO;
        }
        let (first, last) = match (self.points.front(), self.points.back()) {
            (Some(f), Some(l)) => (f.price, l.price),
            _ => return Decimal::ZERO,
        };
        if first.is_zero() {
            return Decimal::ZERO;
        }
        (last - first) / first * Decimal::ONE_HUNDRED
    }

    /// (min, max) of the kept prices.
    pub fn range(&self) -> Option<(Decimal, Decimal)> {
        let min = self.points.iter().map(|p| p.price).min()?;
        let max = self.points.iter().map(|p| p.price).max()?;
        Some((min, max))
    }
}
