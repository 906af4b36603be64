mod actions;
mod pool;
mod sizing;

pub use actions::{Action, ActionKind, DEFAULT_ROUND_SECS};
pub use pool::{calc_split, PoolSplit};
pub use sizing::{parse_bet, validate_bet, MIN_BET, PRESET_AMOUNTS};

use crate::state::{MarketSnapshot, UserPosition};
use alloy_primitives::Address;

/// Inputs to the eligibility rules that do not come from the chain.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    /// Wall clock, Unix seconds
    pub now_secs: u64,
    /// A mutating action is pending
    pub tx_in_flight: bool,
    /// Connected account, if any
    pub account: Option<Address>,
}

/// Which controls are enabled right now.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct Permissions {
    pub can_bet: bool,
    pub can_open: bool,
    pub can_resolve: bool,
    pub can_claim: bool,
    pub is_owner: bool,
}

impl Permissions {
    /// Whether the given action may be submitted. Owner actions also
    /// require `is_owner`.
    pub fn allows(&self, action: &Action) -> bool {
        match action {
            Action::Bet { .. } => self.can_bet,
            Action::Claim => self.can_claim,
            Action::OpenMarket { .. } => self.is_owner && self.can_open,
            Action::ResolveMarket => self.is_owner && self.can_resolve,
        }
    }
}

/// Derive permissions from one snapshot.
///
/// Pure: recompute it on every snapshot and every clock tick.
pub fn evaluate(snapshot: &MarketSnapshot, position: &UserPosition, ctx: &Context) -> Permissions {
    let live = snapshot.opened && !snapshot.resolved;
    let before_deadline = ctx.now_secs < snapshot.betting_deadline;
    let idle = !ctx.tx_in_flight;

    Permissions {
        can_bet: live && before_deadline && idle,
        can_open: !live && idle,
        can_resolve: live && !before_deadline && idle,
        can_claim: can_claim(snapshot, position),
        is_owner: ctx.account.is_some_and(|a| a == snapshot.owner),
    }
}

/// Claim rule. `WinningSide::None` refunds only when the round is actually
/// resolved; before that it means nothing.
fn can_claim(snapshot: &MarketSnapshot, position: &UserPosition) -> bool {
    snapshot.resolved && !position.claimed && position.is_entitled(snapshot.winning_side)
}
