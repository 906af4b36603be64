use crate::events::Side;
use rust_decimal::Decimal;

/// Default round length when opening a market (seconds).
pub const DEFAULT_ROUND_SECS: u64 = 300;

/// Mutating actions the user can request.
/// The view model turns these into contract transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Stake native currency on one side.
    Bet {
        side: Side,
        /// Amount in ether (18 fraction digits on chain)
        amount: Decimal,
    },

    /// Take the payout (or the refund after a tie).
    Claim,

    /// Start a new round. Owner only.
    OpenMarket {
        /// Betting window length in seconds
        duration_secs: u64,
    },

    /// Settle the round against the oracle. Owner only.
    ResolveMarket,
}

/// Action without its payload, for errors and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Bet,
    Claim,
    OpenMarket,
    ResolveMarket,
}

impl Action {
    /// Create a Bet action.
    pub fn bet(side: Side, amount: Decimal) -> Self {
        Self::Bet { side, amount }
    }

    /// Create an OpenMarket action. Zero falls back to the default duration.
    pub fn open_market(duration_secs: u64) -> Self {
        let duration_secs = if duration_secs == 0 {
            DEFAULT_ROUND_SECS
        } else {
            duration_secs
        };
        Self::OpenMarket { duration_secs }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Bet { .. } => ActionKind::Bet,
            Self::Claim => ActionKind::Claim,
            Self::OpenMarket { .. } => ActionKind::OpenMarket,
            Self::ResolveMarket => ActionKind::ResolveMarket,
        }
    }

    /// Only the market owner may submit this.
    pub fn is_owner_only(&self) -> bool {
        matches!(self, Self::OpenMarket { .. } | Self::ResolveMarket)
    }

    /// Status shown while the transaction is pending.
    pub fn pending_message(&self) -> String {
        match self {
            Self::Bet { side, .. } => format!("Placing {} bet...", side.label()),
            Self::Claim => "Claiming rewards...".to_string(),
            Self::OpenMarket { .. } => "Opening market...".to_string(),
            Self::ResolveMarket => "Resolving market...".to_string(),
        }
    }

    /// Status shown once the receipt is in.
    pub fn success_message(&self) -> String {
        match self {
            Self::Bet { side, .. } => format!("{} bet placed successfully!", side.label()),
            Self::Claim => "Rewards claimed successfully!".to_string(),
            Self::OpenMarket { .. } => "Market opened successfully!".to_string(),
            Self::ResolveMarket => "Market resolved successfully!".to_string(),
        }
    }

    /// Status shown when the action fails for any reason.
    pub fn failure_message(&self) -> String {
        match self {
            Self::Bet { .. } => "Failed to place bet",
            Self::Claim => "Failed to claim rewards",
            Self::OpenMarket { .. } => "Failed to open market",
            Self::ResolveMarket => "Failed to resolve market",
        }
        .to_string()
    }
}
