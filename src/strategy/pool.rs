use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Share of the pool on each side, in percent with one decimal place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSplit {
    pub up_pct: Decimal,
    pub down_pct: Decimal,
}

/// Split the pool for the progress bar.
///
/// An empty pool shows 50.0 / 50.0. Otherwise each side is rounded on its
/// own (half away from zero), so the two can add up to 99.9 or 100.1.
pub fn calc_split(total_up: Decimal, total_down: Decimal) -> PoolSplit {
    let total = total_up + total_down;
    if total <= Decimal::ZERO {
        return PoolSplit {
            up_pct: dec!(50.0),
            down_pct: dec!(50.0),
        };
    }
    PoolSplit {
        up_pct: side_pct(total_up, total),
        down_pct: side_pct(total_down, total),
    }
}

fn side_pct(stake: Decimal, total: Decimal) -> Decimal {
    (stake / total * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
}
