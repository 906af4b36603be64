mod market;
mod position;
mod history;
pub mod units;

pub use market::{MarketPhase, MarketSnapshot};
pub use position::{RoundResult, UserPosition};
pub use history::{PriceHistory, PricePoint};

/// What the view model publishes: one consistent pair of reads plus when it
/// was taken.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct MarketView {
    pub snapshot: MarketSnapshot,
    pub position: UserPosition,
    /// Unix seconds at which the batch completed
    pub fetched_at: u64,
}

impl MarketView {
    /// Check that `self` can follow `previous` within one round: stake only
    /// grows while the round is live, `claimed` never goes back to false.
    /// A different deadline means a new round and anything goes.
    pub fn follows(&self, previous: &MarketView) -> bool {
        let (old, new) = (&previous.snapshot, &self.snapshot);
        if old.betting_deadline != new.betting_deadline {
            return true;
        }
        if old.is_live() && new.is_live() && new.total_pool() < old.total_pool() {
            return false;
        }
        if old.resolved && !new.resolved {
            return false;
        }
        !(previous.position.claimed && !self.position.claimed)
    }
}
