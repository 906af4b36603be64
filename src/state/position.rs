use rust_decimal::Decimal;

use super::MarketSnapshot;
use crate::events::{Side, WinningSide};

/// How a resolved round went for the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RoundResult {
    /// Staked on the winning side
    Won,
    /// Tie; every stake is refunded
    Refund,
    Lost,
}

impl RoundResult {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Won => "You predicted correctly!",
            Self::Refund => "It's a tie! Claim your full refund",
            Self::Lost => "Better luck next time",
        }
    }
}

/// The connected account's stake in the current round.
/// Refreshed together with the market snapshot.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct UserPosition {
    /// Native currency staked on UP
    pub up_stake: Decimal,
    /// Native currency staked on DOWN
    pub down_stake: Decimal,
    /// Payout or refund already taken
    pub claimed: bool,
}

impl UserPosition {
    /// Stake on one side.
    pub fn stake(&self, side: Side) -> Decimal {
        match side {
            Side::Up => self.up_stake,
            Side::Down => self.down_stake,
        }
    }

    /// Check if the account has bet at all this round.
    pub fn has_position(&self) -> bool {
        self.up_stake > Decimal::ZERO || self.down_stake > Decimal::ZERO
    }

    /// Total staked across both sides.
    pub fn total_stake(&self) -> Decimal {
        self.up_stake + self.down_stake
    }

    /// Result against a resolved outcome. None without any stake.
    pub fn result_against(&self, outcome: WinningSide) -> Option<RoundResult> {
        if !self.has_position() {
            return None;
        }
        Some(match outcome.side() {
            Some(side) if self.stake(side) > Decimal::ZERO => RoundResult::Won,
            Some(_) => RoundResult::Lost,
            None => RoundResult::Refund,
        })
    }

    /// Result of the round in `snapshot`, once it is resolved.
    pub fn round_result(&self, snapshot: &MarketSnapshot) -> Option<RoundResult> {
        if !snapshot.resolved {
            return None;
        }
        self.result_against(snapshot.winning_side)
    }

    /// Whether this position entitles a claim against the given outcome:
    /// a win pays out, a tie refunds any stake.
    ///
    /// Does not look at `claimed` or at whether the market is resolved;
    /// see `strategy::evaluate` for the full rule.
    pub fn is_entitled(&self, outcome: WinningSide) -> bool {
        matches!(
            self.result_against(outcome),
            Some(RoundResult::Won | RoundResult::Refund)
        )
    }
}
