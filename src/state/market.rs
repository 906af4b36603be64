use alloy_primitives::Address;
use rust_decimal::Decimal;

use crate::events::WinningSide;

/// Everything the market contract reports about the current round.
/// Replaced as a whole on every refresh, never patched.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct MarketSnapshot {
    pub owner: Address,
    pub opened: bool,
    pub resolved: bool,
    /// Price when the round opened (8 fraction digits on chain)
    pub start_price: Decimal,
    /// Price at resolution. Only meaningful when `resolved`.
    pub end_price: Decimal,
    /// Unix timestamp in seconds
    pub betting_deadline: u64,
    /// Native currency, 18 fraction digits on chain
    pub total_up_stake: Decimal,
    pub total_down_stake: Decimal,
    pub contract_balance: Decimal,
    /// Only meaningful when `resolved`.
    pub winning_side: WinningSide,
}

/// Coarse lifecycle phase, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketPhase {
    NotStarted,
    Live,
    Resolved,
}

impl MarketPhase {
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotStarted => "Not Started",
            Self::Live => "Live",
            Self::Resolved => "Resolved",
        }
    }
}

impl MarketSnapshot {
    /// True between open and resolution, deadline or not.
    pub fn is_live(&self) -> bool {
        self.opened && !self.resolved
    }

    pub fn phase(&self) -> MarketPhase {
        if self.resolved {
            MarketPhase::Resolved
        } else if self.opened {
            MarketPhase::Live
        } else {
            MarketPhase::NotStarted
        }
    }

    /// Total staked on both sides.
    pub fn total_pool(&self) -> Decimal {
        self.total_up_stake + self.total_down_stake
    }

    /// Seconds left until the betting deadline. Returns 0 once passed.
    pub fn time_remaining_secs(&self, now_secs: u64) -> u64 {
        self.betting_deadline.saturating_sub(now_secs)
    }

    /// Result banner text. None until the round is resolved.
    pub fn result_label(&self) -> Option<&'static str> {
        if !self.resolved {
            return None;
        }
        Some(match self.winning_side {
            WinningSide::Up => "UP WINS",
            WinningSide::Down => "DOWN WINS",
            WinningSide::None => "TIE — REFUNDS",
        })
    }

    /// Percent move from start to end price. Zero until resolved, or when
    /// either price is not positive.
    pub fn price_change_pct(&self) -> Decimal {
        if !self.resolved || self.start_price <= Decimal::ZERO || self.end_price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.end_price - self.start_price) / self.start_price * Decimal::ONE_HUNDRED
    }

    /// Price shown next to the start price: the end price once resolved,
    /// otherwise the start price again.
    pub fn display_price(&self) -> Decimal {
        if self.resolved {
            self.end_price
        } else {
            self.start_price
        }
    }
}
